//! Integration tests for the expression language as seen through a pipeline

#[path = "common/mod.rs"]
mod common;
use common::*;

fn eval_on(expr: &str, input: &str) -> String {
    run_with(&invocation(&[expr]), input).unwrap()
}

#[test]
fn test_reductions() {
    let input = "4\n1\n3\n2\n";
    assert_eq!(eval_on("np.sum(d)", input), "10\n");
    assert_eq!(eval_on("d.mean()", input), "2.5\n");
    assert_eq!(eval_on("np.median(d)", input), "2.5\n");
    assert_eq!(eval_on("d.max() - d.min()", input), "3\n");
    assert_eq!(eval_on("d.argmax()", input), "0\n");
    assert_eq!(eval_on("np.prod(d)", input), "24\n");
}

#[test]
fn test_masks_and_slices() {
    let input = &seq(1, 10);
    assert_eq!(eval_on("d[d % 2 == 0]", input), "2\n4\n6\n8\n10\n");
    assert_eq!(eval_on("d[::-3]", input), "10\n7\n4\n1\n");
    assert_eq!(eval_on("d[(d > 3) & (d < 6)]", input), "4\n5\n");
    assert_eq!(eval_on("d[-1]", input), "10\n");
}

#[test]
fn test_cumulative_and_diff() {
    assert_eq!(eval_on("np.cumsum(d)", "1\n2\n3\n"), "1\n3\n6\n");
    assert_eq!(eval_on("np.diff(d)", "1\n4\n9\n"), "3\n5\n");
}

#[test]
fn test_broadcasting_two_dimensional() {
    // Subtract each column's mean
    assert_eq!(eval_on("d - d.mean(0)", "1 10\n3 30\n"), "-1\n-10\n1\n10\n");
    assert_eq!(eval_on("d.T", "1 2\n3 4\n"), "1\n3\n2\n4\n");
    assert_eq!(eval_on("d.shape", "1 2 3\n4 5 6\n"), "2\n3\n");
}

#[test]
fn test_reshape_and_sort() {
    assert_eq!(eval_on("np.sort(d)", "3\n1\n2\n"), "1\n2\n3\n");
    assert_eq!(eval_on("d.reshape(2, -1).sum(1)", &seq(1, 6)), "6\n15\n");
}

#[test]
fn test_comparison_output_is_bool() {
    assert_eq!(eval_on("d > 1", "1\n2\n"), "False\nTrue\n");
    assert_eq!(eval_on("np.count_nonzero(d > 1)", "1\n2\n3\n"), "2\n");
}

#[test]
fn test_string_processing() {
    let mut inv = invocation(&["float(d) * 2"]);
    inv.format = InputFormat::Lines;
    assert_eq!(run_with(&inv, "1.5\n2\n").unwrap(), "3\n4\n");

    let mut inv = invocation(&["', '.join(d)"]);
    inv.format = InputFormat::Lines;
    inv.output = OutputMode::Raw;
    assert_eq!(run_with(&inv, "a\nb\nc\n").unwrap(), "a, b, c");
}

#[test]
fn test_json_output() {
    let mut inv = invocation(&["json(d * 2)"]);
    inv.output = OutputMode::Raw;
    assert_eq!(run_with(&inv, "1\n2.5\n").unwrap(), "[2,5]");
}

#[test]
fn test_math_domain_error() {
    let err = run_with(&invocation(&["math.sqrt(d[0])"]), "-1\n");
    // math is not bound without -m or the kitchen sink
    assert!(err.is_err());

    let mut inv = invocation(&["math.sqrt(d[0])"]);
    inv.options.modules = vec!["math".into()];
    let err = run_with(&inv, "-1\n").unwrap_err();
    assert_eq!(err.stage(), "evaluation");
}

#[test]
fn test_seeded_random_is_reproducible() {
    let mut inv = invocation(&["random.seed(7); random.randint(0, 100, 5)"]);
    inv.options.modules = vec!["random".into()];
    let first = run_with(&inv, "").unwrap();
    let second = run_with(&inv, "").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 5);
}
