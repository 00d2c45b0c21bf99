//! One invocation, end to end: read sources, bind, evaluate, format, write

use crate::ast::Value;
use crate::binder::{bind, resolve_modules, BindOptions};
use crate::chain::{Chain, RenderPlan};
use crate::error::{ConfigError, Error};
use crate::eval::Evaluator;
use crate::format::{format_result, OutputMode};
use crate::source::{read_source, InputFormat, InputSpec, Location};
use std::io::{Read, Write};

/// A validated invocation, ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub chain: Chain,
    /// Declared sources, in declaration order
    pub sources: Vec<InputSpec>,
    pub format: InputFormat,
    pub options: BindOptions,
    pub output: OutputMode,
    /// Print the generated program instead of running it
    pub code: bool,
}

impl Invocation {
    /// An invocation of `chain` with every other setting at its default
    pub fn new(chain: Chain) -> Self {
        Invocation {
            chain,
            sources: Vec::new(),
            format: InputFormat::default(),
            options: BindOptions::default(),
            output: OutputMode::default(),
            code: false,
        }
    }

    /// Sources to read. With none declared, stdin is implied when the
    /// first expression reads `d`.
    pub fn effective_sources(&self) -> Vec<InputSpec> {
        if self.sources.is_empty() && self.chain.reads_data() {
            log::debug!("no sources declared; reading stdin");
            vec![InputSpec::unnamed(Location::Stdin)]
        } else {
            self.sources.clone()
        }
    }
}

/// Run an invocation. Output is written only after it is fully formatted.
pub fn run(
    inv: &Invocation,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<(), Error> {
    resolve_modules(&inv.options.modules)?;
    let sources = inv.effective_sources();
    let stdin_count = sources.iter().filter(|s| s.location == Location::Stdin).count();
    if stdin_count > 1 {
        return Err(ConfigError::RepeatedStdin.into());
    }

    if inv.code {
        let plan = RenderPlan { sources: &sources, format: inv.format, options: &inv.options };
        stdout.write_all(inv.chain.render(&plan).as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    let mut loaded: Vec<(InputSpec, Value)> = Vec::with_capacity(sources.len());
    for spec in sources {
        let value = read_source(&spec, inv.format, stdin)?;
        loaded.push((spec, value));
    }

    let mut scope = bind(loaded, &inv.options)?;
    let mut engine = Evaluator::new();
    let result = inv.chain.evaluate(&mut scope, &mut engine)?;

    log::debug!("output mode: {:?}", inv.output);
    let bytes = format_result(&result, &inv.output)?;
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ElementFormat;

    fn invocation(exprs: &[&str]) -> Invocation {
        Invocation::new(Chain::new(exprs.iter().map(|s| s.to_string()).collect()).unwrap())
    }

    fn run_with(inv: &Invocation, input: &str) -> Result<String, Error> {
        let mut out = Vec::new();
        run(inv, &mut input.as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn implicit_stdin() {
        assert_eq!(run_with(&invocation(&["d * 2"]), "1\n2\n3\n").unwrap(), "2\n4\n6\n");
    }

    #[test]
    fn stdin_untouched_without_d() {
        let inv = invocation(&["np.arange(3)"]);
        assert!(inv.effective_sources().is_empty());
        assert_eq!(run_with(&inv, "not numbers").unwrap(), "0\n1\n2\n");
    }

    #[test]
    fn code_mode_reads_nothing() {
        let mut inv = invocation(&["d + 1"]);
        inv.code = true;
        let out = run_with(&inv, "garbage").unwrap();
        assert!(out.contains("d = d1 = data1 = data = read(\"<stdin>\", \"auto\")"));
        assert!(out.ends_with("d = d + 1\nd\n"));
    }

    #[test]
    fn unknown_module_fails_before_reading() {
        let mut inv = invocation(&["d"]);
        inv.options.modules = vec!["pandas".into()];
        let err = run_with(&inv, "x y z").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownModule(_))));
    }

    #[test]
    fn stdin_given_twice() {
        let mut inv = invocation(&["len(d2)"]);
        let stdin = InputSpec::unnamed(Location::Stdin);
        inv.sources = vec![stdin.clone(), stdin];
        let err = run_with(&inv, "1\n2\n3\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::RepeatedStdin)));

        let named = InputSpec::parse_named("x=-").unwrap();
        inv.sources = vec![named, InputSpec::unnamed(Location::Stdin)];
        assert_eq!(run_with(&inv, "1\n").unwrap_err().stage(), "config");
    }

    #[test]
    fn errors_leave_output_empty() {
        let mut out = Vec::new();
        let err = run(&invocation(&["d.upper()"]), &mut "1\n".as_bytes(), &mut out).unwrap_err();
        assert_eq!(err.stage(), "evaluation");
        assert!(out.is_empty());

        let mut inv = invocation(&["d"]);
        inv.format = InputFormat::Lines;
        let err = run(&inv, &mut "a\nb\n".as_bytes(), &mut out).unwrap_err();
        assert_eq!(err.stage(), "format");
        assert!(out.is_empty());
    }

    #[test]
    fn lines_with_str_elements() {
        let mut inv = invocation(&["d"]);
        inv.format = InputFormat::Lines;
        inv.output = OutputMode::Array { element: ElementFormat::Str };
        assert_eq!(run_with(&inv, "a b\r\nc\n").unwrap(), "a b\nc\n");
    }
}
