//! Subscripts: integer, slice, mask, fancy and column-name indexing

use super::helpers::{rows, to_i64, type_error};
use super::{EvalError, Evaluator};
use crate::ast::{IndexExpr, NdArray, Table, Value};
use crate::scope::Scope;
use ndarray::{Array1, Axis};

/// One evaluated component of a subscript
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selector {
    Int(i64),
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// Boolean mask with its own shape
    Mask { shape: Vec<usize>, bits: Vec<bool> },
    /// Integer index array
    Take(Vec<i64>),
    /// Table column name
    Key(String),
    /// Several table column names
    Keys(Vec<String>),
}

impl Evaluator {
    pub(crate) fn eval_selector(
        &mut self,
        part: &IndexExpr,
        scope: &Scope,
    ) -> Result<Selector, EvalError> {
        match part {
            IndexExpr::Slice { start, stop, step } => {
                let mut bound = |e: &Option<crate::ast::Expr>| -> Result<Option<i64>, EvalError> {
                    match e {
                        Some(expr) => {
                            let v = self.eval_expr(expr, scope)?;
                            match v {
                                Value::None => Ok(None),
                                other => to_i64(&other, "slice").map(Some),
                            }
                        }
                        None => Ok(None),
                    }
                };
                Ok(Selector::Slice { start: bound(start)?, stop: bound(stop)?, step: bound(step)? })
            }
            IndexExpr::Single(expr) => {
                let v = self.eval_expr(expr, scope)?;
                to_selector(v)
            }
        }
    }
}

fn to_selector(v: Value) -> Result<Selector, EvalError> {
    match v {
        Value::Number(_) => Ok(Selector::Int(to_i64(&v, "index")?)),
        Value::Str(s) => Ok(Selector::Key(s)),
        Value::StrArray(keys) => Ok(Selector::Keys(keys)),
        Value::Array(a) if a.is_bool() => Ok(Selector::Mask {
            shape: a.shape().to_vec(),
            bits: a.iter().map(|x| x != 0.0).collect(),
        }),
        Value::Array(a) => a
            .iter()
            .map(|x| to_i64(&Value::Number(x), "index"))
            .collect::<Result<Vec<_>, _>>()
            .map(Selector::Take),
        Value::List(items) if items.is_empty() => Ok(Selector::Take(vec![])),
        other => Err(type_error("integer, slice, mask or column name as index", &other)),
    }
}

/// Resolve a single (possibly negative) index against an axis length
fn resolve_index(index: i64, len: usize) -> Result<usize, EvalError> {
    let n = len as i64;
    let i = if index < 0 { index + n } else { index };
    if i < 0 || i >= n {
        return Err(EvalError::IndexOutOfBounds { index, len });
    }
    Ok(i as usize)
}

/// Positions selected by a Python-style slice
pub(crate) fn slice_positions(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, EvalError> {
    let n = len as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::ValueError("slice step cannot be zero".into()));
    }

    let norm = |x: i64| if x < 0 { x + n } else { x };
    let mut out = Vec::new();
    if step > 0 {
        let start = start.map(norm).unwrap_or(0).clamp(0, n);
        let stop = stop.map(norm).unwrap_or(n).clamp(0, n);
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i += step;
        }
    } else {
        let start = start.map(norm).unwrap_or(n - 1).clamp(-1, n - 1);
        let stop = stop.map(norm).unwrap_or(-1).clamp(-1, n - 1);
        let mut i = start;
        while i > stop {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

/// Positions picked along one axis, and whether that axis survives
fn axis_positions(sel: &Selector, len: usize) -> Result<(Vec<usize>, bool), EvalError> {
    match sel {
        Selector::Int(i) => Ok((vec![resolve_index(*i, len)?], false)),
        Selector::Slice { start, stop, step } => {
            Ok((slice_positions(len, *start, *stop, *step)?, true))
        }
        Selector::Mask { bits, .. } => {
            if bits.len() != len {
                return Err(EvalError::ValueError(format!(
                    "boolean index of length {} does not match axis of length {}",
                    bits.len(),
                    len
                )));
            }
            Ok((bits.iter().enumerate().filter(|(_, &b)| b).map(|(i, _)| i).collect(), true))
        }
        Selector::Take(indices) => {
            let positions = indices
                .iter()
                .map(|&i| resolve_index(i, len))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((positions, true))
        }
        Selector::Key(_) | Selector::Keys(_) => Err(EvalError::TypeError {
            expected: "integer, slice or mask".into(),
            got: "str".into(),
        }),
    }
}

fn select_array(a: NdArray, selectors: &[Selector]) -> Result<Value, EvalError> {
    let dtype = a.dtype;

    // A mask with the array's full shape selects elements into a flat array
    if let [Selector::Mask { shape, bits }] = selectors {
        if shape.as_slice() == a.shape() && a.ndim() > 1 {
            let data = a.iter().zip(bits).filter(|(_, &b)| b).map(|(x, _)| x).collect();
            return Ok(Value::Array(NdArray::new(Array1::from_vec(data).into_dyn(), dtype)));
        }
    }

    if a.ndim() == 0 || selectors.len() > a.ndim() {
        return Err(EvalError::ValueError(format!(
            "too many indices: array is {}-dimensional, but {} were indexed",
            a.ndim(),
            selectors.len()
        )));
    }

    let mut values = a.values;
    let mut dropped = Vec::new();
    for (axis, sel) in selectors.iter().enumerate() {
        let (positions, keep) = axis_positions(sel, values.len_of(Axis(axis)))?;
        values = values.select(Axis(axis), &positions);
        if !keep {
            dropped.push(axis);
        }
    }
    // Integer indices remove their axis, highest first so the rest stay put
    for &axis in dropped.iter().rev() {
        values = values.index_axis_move(Axis(axis), 0);
    }

    let out = NdArray::new(values, dtype);
    if out.ndim() == 0 {
        return Ok(out.first().map(|x| out.scalar(x)).unwrap_or(Value::None));
    }
    Ok(Value::Array(out))
}

/// Index a one-dimensional sequence of values (string arrays, lists)
fn select_sequence<T: Clone>(
    items: &[T],
    selectors: &[Selector],
    one: impl Fn(T) -> Value,
    many: impl Fn(Vec<T>) -> Value,
) -> Result<Value, EvalError> {
    let sel = match selectors {
        [sel] => sel,
        _ => {
            return Err(EvalError::ValueError(format!(
                "too many indices: sequence is 1-dimensional, but {} were indexed",
                selectors.len()
            )))
        }
    };
    let (positions, keep) = axis_positions(sel, items.len())?;
    if !keep {
        return Ok(one(items[positions[0]].clone()));
    }
    Ok(many(positions.into_iter().map(|i| items[i].clone()).collect()))
}

fn select_table(table: Table, selectors: &[Selector]) -> Result<Value, EvalError> {
    match selectors {
        [Selector::Key(name)] => table.column(name).cloned().ok_or_else(|| EvalError::NoAttribute {
            target: "table".into(),
            name: name.clone(),
        }),
        [Selector::Keys(names)] => {
            let mut columns = Vec::with_capacity(names.len());
            for name in names {
                let col = table.column(name).ok_or_else(|| EvalError::NoAttribute {
                    target: "table".into(),
                    name: name.clone(),
                })?;
                columns.push((name.clone(), col.clone()));
            }
            Ok(Value::Table(Table::new(columns)))
        }
        [row_sel] => {
            let (positions, keep) = axis_positions(row_sel, table.nrows())?;
            let sel = Selector::Take(positions.iter().map(|&p| p as i64).collect());
            let columns = table
                .columns
                .into_iter()
                .map(|(name, col)| Ok((name, select(col, std::slice::from_ref(&sel))?)))
                .collect::<Result<Vec<_>, EvalError>>()?;
            if !keep {
                // A single row becomes a list of its cells
                return Ok(Value::List(
                    columns
                        .into_iter()
                        .map(|(_, col)| match col {
                            Value::Array(a) => {
                                a.first().map(|x| a.scalar(x)).unwrap_or(Value::None)
                            }
                            Value::StrArray(mut s) => Value::Str(s.remove(0)),
                            other => other,
                        })
                        .collect(),
                ));
            }
            Ok(Value::Table(Table::new(columns)))
        }
        _ => Err(EvalError::ValueError("tables take a single index".into())),
    }
}

/// Apply a subscript to a value
pub(crate) fn select(target: Value, selectors: &[Selector]) -> Result<Value, EvalError> {
    match target {
        Value::Array(a) => select_array(a, selectors),
        Value::StrArray(items) => select_sequence(&items, selectors, Value::Str, Value::StrArray),
        Value::List(items) => select_sequence(&items, selectors, |v| v, Value::List),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            select_sequence(
                &chars,
                selectors,
                |c| Value::Str(c.to_string()),
                |cs| Value::Str(cs.into_iter().collect()),
            )
        }
        Value::Table(t) => select_table(t, selectors),
        other => Err(type_error("indexable value", &other)),
    }
}

/// Split a value into items for iteration-style functions
pub(crate) fn items(v: &Value) -> Result<Vec<Value>, EvalError> {
    match v {
        Value::Array(a) => Ok(rows(a)),
        Value::StrArray(items) => Ok(items.iter().cloned().map(Value::Str).collect()),
        Value::List(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(type_error("sequence", other)),
    }
}
