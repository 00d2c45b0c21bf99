//! Debug rendering of values, as printed by `--repr`
//!
//! Arrays print numpy-style (`array([1, 2.5])`), text is quoted, and tables
//! are drawn as a box grid with a row count.

use crate::ast::{format_number, NdArray, Table, Value};
use ndarray::ArrayViewD;
use serde_json::Value as JsonValue;

/// Widest a table cell may get before it is truncated
const MAX_COL_WIDTH: usize = 40;

/// Render a value for `--repr`
pub fn repr(val: &Value) -> String {
    match val {
        Value::None => "None".to_string(),
        Value::Bool(b) => bool_text(*b).to_string(),
        Value::Number(n) => format_number(*n),
        Value::Str(s) => quote(s),
        Value::Array(a) => format!("array({})", nested(a, a.values.view())),
        Value::StrArray(items) => {
            let parts: Vec<String> = items.iter().map(|s| quote(s)).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Table(t) => format_table(t),
        Value::Module(m) => format!("<module {}>", m),
        Value::Function(f) => format!("<function {}>", f),
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn quote(s: &str) -> String {
    JsonValue::String(s.to_string()).to_string()
}

fn element(a: &NdArray, x: f64) -> String {
    if a.is_bool() {
        bool_text(x != 0.0).to_string()
    } else {
        format_number(x)
    }
}

fn nested(a: &NdArray, view: ArrayViewD<'_, f64>) -> String {
    match view.ndim() {
        0 => view.iter().next().map(|&x| element(a, x)).unwrap_or_default(),
        1 => {
            let parts: Vec<String> = view.iter().map(|&x| element(a, x)).collect();
            format!("[{}]", parts.join(", "))
        }
        _ => {
            let parts: Vec<String> = view.outer_iter().map(|row| nested(a, row)).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// Text of one table cell
fn cell(column: &Value, row: usize) -> String {
    match column {
        Value::Array(a) => a.get(row).map(|x| element(a, x)).unwrap_or_default(),
        Value::StrArray(items) => items.get(row).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Format a table with box-drawing characters
fn format_table(table: &Table) -> String {
    if table.columns.is_empty() {
        return "(empty table)".to_string();
    }

    let nrows = table.nrows();
    let rows: Vec<Vec<String>> = (0..nrows)
        .map(|r| table.columns.iter().map(|(_, col)| cell(col, r)).collect())
        .collect();

    // Calculate column widths
    let mut widths: Vec<usize> =
        table.columns.iter().map(|(name, _)| name.chars().count()).collect();
    for row in &rows {
        for (w, text) in widths.iter_mut().zip(row) {
            *w = (*w).max(text.chars().count());
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COL_WIDTH);
    }

    let rule = |left: char, mid: char, right: char| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
    };
    let line = |cells: Vec<String>| {
        let mut out = String::from("│");
        for (text, w) in cells.iter().zip(&widths) {
            out.push_str(&format!(" {:width$} │", truncate_str(text, *w), width = *w));
        }
        out.push('\n');
        out
    };

    let mut out = rule('┌', '┬', '┐');
    out.push_str(&line(table.names()));
    out.push_str(&rule('├', '┼', '┤'));
    for row in rows {
        out.push_str(&line(row));
    }
    out.push_str(&rule('└', '┴', '┘'));
    out.push_str(&format!("({} rows)", nrows));
    out
}

/// Truncate a string to max width, adding ellipsis if needed
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        ".".to_string()
    } else {
        let kept: String = s.chars().take(max_width - 1).collect();
        format!("{}…", kept)
    }
}
