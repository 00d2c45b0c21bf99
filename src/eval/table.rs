//! Attributes and methods of `pandas`-style tables

use super::array::values_of;
use super::helpers::{arity, to_usize};
use super::index::{select, Selector};
use super::EvalError;
use crate::ast::{NdArray, Table, Value};

pub(crate) fn attribute(t: &Table, name: &str) -> Result<Value, EvalError> {
    match name {
        "columns" => Ok(Value::StrArray(t.names())),
        "shape" => {
            let dims = vec![t.nrows() as f64, t.columns.len() as f64];
            Ok(Value::Array(NdArray::from_vec(dims)))
        }
        "size" => Ok(Value::Number((t.nrows() * t.columns.len()) as f64)),
        "ndim" => Ok(Value::Number(2.0)),
        "values" => values_of(t),
        column => t.column(column).cloned().ok_or_else(|| EvalError::NoAttribute {
            target: "table".into(),
            name: column.to_string(),
        }),
    }
}

fn rows(t: Table, start: Option<i64>, stop: Option<i64>) -> Result<Value, EvalError> {
    select(Value::Table(t), &[Selector::Slice { start, stop, step: None }])
}

pub(crate) fn method(t: Table, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let qualified = format!("table.{}", name);
    match name {
        "head" | "tail" => {
            arity(&qualified, args, 0, 1)?;
            let n = match args.first() {
                Some(v) => to_usize(v, &qualified)? as i64,
                None => 5,
            };
            if name == "head" {
                rows(t, None, Some(n))
            } else {
                let len = t.nrows() as i64;
                rows(t, Some((len - n).max(0)), None)
            }
        }
        "to_numpy" => {
            arity(&qualified, args, 0, 0)?;
            values_of(&t)
        }
        _ => Err(EvalError::NoAttribute { target: "table".into(), name: name.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            ("x".into(), Value::Array(NdArray::from_vec(vec![1.0, 2.0, 3.0]))),
            ("y".into(), Value::Array(NdArray::from_vec(vec![10.0, 20.0, 30.0]))),
        ])
    }

    #[test]
    fn columns_and_column_attribute() {
        let t = table();
        let columns = Value::StrArray(vec!["x".into(), "y".into()]);
        assert_eq!(attribute(&t, "columns").unwrap(), columns);
        let y = Value::Array(NdArray::from_vec(vec![10.0, 20.0, 30.0]));
        assert_eq!(attribute(&t, "y").unwrap(), y);
        assert!(attribute(&t, "z").is_err());
    }

    #[test]
    fn values_is_row_major() {
        let Value::Array(v) = attribute(&table(), "values").unwrap() else {
            panic!("expected array")
        };
        assert_eq!(v.shape(), &[3, 2]);
        assert_eq!(v.to_vec(), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn head_and_tail() {
        let Value::Table(h) = method(table(), "head", &[Value::Number(2.0)]).unwrap() else {
            panic!("expected table")
        };
        assert_eq!(h.nrows(), 2);
        let Value::Table(tl) = method(table(), "tail", &[Value::Number(1.0)]).unwrap() else {
            panic!("expected table")
        };
        assert_eq!(tl.column("x"), Some(&Value::Array(NdArray::from_vec(vec![3.0]))));
    }
}
