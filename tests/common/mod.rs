//! Common test utilities for npcli integration tests

#![allow(dead_code)]

pub use npcli::{
    bind, run, BindOptions, Chain, ElementFormat, Error, Evaluator, InputFormat, InputSpec,
    Invocation, Location, NdArray, OutputMode, Scope, Value,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// A 1-D float array value
pub fn arr(v: &[f64]) -> Value {
    Value::Array(NdArray::from_vec(v.to_vec()))
}

/// An invocation of the given chain with default settings
pub fn invocation(exprs: &[&str]) -> Invocation {
    let chain = Chain::new(exprs.iter().map(|s| s.to_string()).collect()).unwrap();
    Invocation::new(chain)
}

/// Run an invocation with `input` on stdin and return what it wrote
pub fn run_with(inv: &Invocation, input: &str) -> Result<String, Error> {
    let mut out = Vec::new();
    run(inv, &mut input.as_bytes(), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

/// Newline-separated integers from `from` to `to` inclusive
pub fn seq(from: i64, to: i64) -> String {
    (from..=to).map(|n| format!("{}\n", n)).collect()
}

/// A temporary directory holding input files
pub struct Inputs {
    dir: TempDir,
}

impl Inputs {
    pub fn new() -> Self {
        Inputs { dir: tempfile::tempdir().unwrap() }
    }

    /// Write a file and return its path
    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    pub fn spec(&self, name: &str, contents: &str) -> InputSpec {
        InputSpec::unnamed(Location::Path(self.file(name, contents)))
    }

    pub fn named(&self, name: &str, contents: &str) -> InputSpec {
        let path = self.file(&format!("{}.txt", name), contents);
        InputSpec::named(name, Location::Path(path))
    }
}
