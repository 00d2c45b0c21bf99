//! Integration tests for reading and binding sources

#[path = "common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_positional_sources_are_numbered() {
    let inputs = Inputs::new();
    let mut inv = invocation(&["np.concatenate([d1, d2, d])"]);
    inv.sources = vec![inputs.spec("a.txt", "5\n6\n7\n"), inputs.spec("b.txt", "1\n2\n")];
    assert_eq!(run_with(&inv, "").unwrap(), "5\n6\n7\n1\n2\n5\n6\n7\n");
}

#[test]
fn test_data_aliases() {
    let inputs = Inputs::new();
    let mut inv = invocation(&["data1 + data2 + data"]);
    inv.sources = vec![inputs.spec("a.txt", "1\n"), inputs.spec("b.txt", "10\n")];
    assert_eq!(run_with(&inv, "").unwrap(), "12\n");
}

#[test]
fn test_named_sources_sum() {
    let inputs = Inputs::new();
    let mut inv = invocation(&["one + two"]);
    inv.sources = vec![inputs.named("one", &seq(1, 100)), inputs.named("two", &seq(201, 300))];
    let out = run_with(&inv, "").unwrap();
    let sums: Vec<i64> = out.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(sums.len(), 100);
    assert_eq!(sums[0], 202);
    assert_eq!(sums[99], 400);
    assert!(sums.windows(2).all(|w| w[1] - w[0] == 2));
}

#[test]
fn test_named_sources_do_not_shift_numbering() {
    let inputs = Inputs::new();
    let mut inv = invocation(&["d2 - w"]);
    inv.sources = vec![
        inputs.spec("a.txt", "1\n"),
        inputs.named("w", "3\n"),
        inputs.spec("b.txt", "10\n"),
    ];
    assert_eq!(run_with(&inv, "").unwrap(), "7\n");
}

#[test]
fn test_explicit_stdin_source() {
    let inputs = Inputs::new();
    let mut inv = invocation(&["d1 * d2"]);
    inv.sources = vec![InputSpec::unnamed(Location::Stdin), inputs.spec("b.txt", "2\n3\n")];
    assert_eq!(run_with(&inv, "4\n5\n").unwrap(), "8\n15\n");
}

#[test]
fn test_two_column_input() {
    let out = run_with(&invocation(&["d[:, 0] * d[:, 1]"]), "1 2\n3 4\n\n5 6\n").unwrap();
    assert_eq!(out, "2\n12\n30\n");
}

#[test]
fn test_lines_property() {
    let text = "alpha\r\nbeta gamma\n\ndelta";
    let mut inv = invocation(&["len(d)"]);
    inv.format = InputFormat::Lines;
    assert_eq!(run_with(&inv, text).unwrap(), "4\n");

    let mut inv = invocation(&["d"]);
    inv.format = InputFormat::Lines;
    inv.output = OutputMode::Array { element: ElementFormat::Str };
    assert_eq!(run_with(&inv, text).unwrap(), "alpha\nbeta gamma\n\ndelta\n");
}

#[test]
fn test_str_input_raw_output() {
    let mut inv = invocation(&["d.upper()"]);
    inv.format = InputFormat::Str;
    inv.output = OutputMode::Raw;
    assert_eq!(run_with(&inv, "hi there\n").unwrap(), "HI THERE\n");
}

#[test]
fn test_csv_input() {
    let mut inv = invocation(&["d.sum(0)"]);
    inv.format = InputFormat::Csv;
    assert_eq!(run_with(&inv, "1,2\n3,4\n").unwrap(), "4\n6\n");
}

#[test]
fn test_malformed_csv() {
    let mut inv = invocation(&["d"]);
    inv.format = InputFormat::Csv;
    let mut out = Vec::new();
    let err = run(&inv, &mut "1,2\n3\n".as_bytes(), &mut out).unwrap_err();
    assert!(matches!(err, Error::Source(_)));
    assert!(out.is_empty());
}

#[test]
fn test_pandas_table() {
    let mut inv = invocation(&["d['price'][d['qty'] > 1].sum()"]);
    inv.format = InputFormat::Pandas;
    let csv = "name,price,qty\napple,1.5,2\npear,2,1\nplum,0.5,4\n";
    assert_eq!(run_with(&inv, csv).unwrap(), "2\n");
}

#[test]
fn test_not_a_number() {
    let err = run_with(&invocation(&["d"]), "1\ntwo\n").unwrap_err();
    assert_eq!(err.stage(), "source");
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_missing_file() {
    let mut inv = invocation(&["d"]);
    inv.sources = vec![InputSpec::unnamed(Location::Path("/nonexistent/npcli-input".into()))];
    let err = run_with(&inv, "").unwrap_err();
    assert_eq!(err.stage(), "source");
    assert!(err.to_string().starts_with("/nonexistent/npcli-input"));
}

#[test]
fn test_bind_directly() {
    let inputs = Inputs::new();
    let sources = vec![
        (inputs.spec("a.txt", ""), arr(&[5.0, 6.0, 7.0])),
        (inputs.spec("b.txt", ""), arr(&[1.0, 2.0])),
    ];
    let scope = bind(sources, &BindOptions::default()).unwrap();
    assert_eq!(scope.get("d1"), Some(&arr(&[5.0, 6.0, 7.0])));
    assert_eq!(scope.get("d2"), Some(&arr(&[1.0, 2.0])));
    assert_eq!(scope.get("d"), Some(&arr(&[5.0, 6.0, 7.0])));
}

#[test]
fn test_kitchen_sink_and_modules() {
    let mut inv = invocation(&["sqrt(d) + math.floor(pi)"]);
    inv.options.kitchen_sink = true;
    assert_eq!(run_with(&inv, "4\n9\n").unwrap(), "5\n6\n");

    let mut inv = invocation(&["math.sqrt(d[0])"]);
    inv.options.modules = vec!["math".into()];
    assert_eq!(run_with(&inv, "16\n").unwrap(), "4\n");
}
