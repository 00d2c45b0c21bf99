//! End-to-end tests of the npcli binary

#[path = "common/mod.rs"]
mod common;
use assert_cmd::Command;
use common::{seq, Inputs};
use predicates::prelude::*;

fn npcli() -> Command {
    let mut cmd = Command::cargo_bin("npcli").unwrap();
    cmd.env_remove("NPCLI_LOG");
    cmd
}

#[test]
fn test_double() {
    npcli().arg("d * 2").write_stdin("1\n2\n3\n").assert().success().stdout("2\n4\n6\n");
}

#[test]
fn test_chain_flags() {
    let nested = npcli().arg("(((d*2)+4)*3)-12").write_stdin(seq(1, 5)).output().unwrap();
    npcli()
        .args(["d", "-e", "d*2", "-e", "d+4", "-e", "d*3", "-e", "d-12"])
        .write_stdin(seq(1, 5))
        .assert()
        .success()
        .stdout(String::from_utf8(nested.stdout).unwrap());
}

#[test]
fn test_named_sources() {
    let inputs = Inputs::new();
    let one = inputs.file("one.txt", &seq(1, 100));
    let two = inputs.file("two.txt", &seq(201, 300));
    let out = npcli()
        .arg("one + two")
        .arg("--name")
        .arg(format!("one={}", one.display()))
        .arg("-n")
        .arg(format!("two={}", two.display()))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 100);
    assert_eq!(text.lines().next(), Some("202"));
}

#[test]
fn test_no_result() {
    npcli().args(["d * 2", "-q"]).write_stdin("1\n").assert().success().stdout("");
}

#[test]
fn test_repr_and_raw() {
    npcli()
        .args(["--repr", "d[:2]"])
        .write_stdin("1\n2.5\n3\n")
        .assert()
        .success()
        .stdout("array([1, 2.5])\n");
    npcli()
        .args(["-I", "str", "-r", "d.strip()"])
        .write_stdin("  hi  \n")
        .assert()
        .success()
        .stdout("hi");
}

#[test]
fn test_array_format() {
    npcli()
        .args(["d / 3", "-F", ".2"])
        .write_stdin("1\n2\n")
        .assert()
        .success()
        .stdout("0.33\n0.67\n");
}

#[test]
fn test_conflicting_output_modes() {
    // A missing file would fail later; the config error must come first
    npcli()
        .args(["d", "/nonexistent/npcli-input", "--raw", "--repr"])
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("npcli: config error: at most one output mode"));
}

#[test]
fn test_stdin_twice_is_config_error() {
    npcli()
        .args(["d1 + d2", "-", "-"])
        .write_stdin("1\n2\n")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("npcli: config error: stdin ('-')"));
}

#[test]
fn test_malformed_csv() {
    npcli()
        .args(["-I", "csv", "d"])
        .write_stdin("1,2\n3\n")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("npcli: source error: <stdin>"));
}

#[test]
fn test_evaluation_error_names_step() {
    npcli()
        .args(["d + 1", "-e", "nope"])
        .write_stdin("1\n")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("npcli: evaluation error: expression 2 `nope`"));
}

#[test]
fn test_lines_round_trip() {
    let text = "first line\nsecond\n\nfourth\n";
    npcli()
        .args(["-I", "lines", "-F", "str", "d"])
        .write_stdin(text)
        .assert()
        .success()
        .stdout(text);
}

#[test]
fn test_code_mode_does_not_read() {
    npcli()
        .args(["--code", "d * 2", "/nonexistent/npcli-input"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "d = d1 = data1 = data = read(\"/nonexistent/npcli-input\", \"auto\")",
        ));
}

#[test]
fn test_debug_logs_to_stderr() {
    npcli()
        .args(["--debug", "d.sum()"])
        .write_stdin("1\n2\n")
        .assert()
        .success()
        .stdout("3\n")
        .stderr(predicate::str::contains("step 1"));
}

#[test]
fn test_help_and_version() {
    npcli().arg("--help").assert().success().stdout(predicate::str::contains("USAGE:"));
    npcli().arg("-V").assert().success().stdout(predicate::str::starts_with("npcli "));
}

#[test]
fn test_missing_expression() {
    npcli().assert().failure().stderr(predicate::str::contains("missing expression"));
}
