//! Array construction and reshaping: list literals, `np.array`, `arange`,
//! `reshape`, `concatenate`, `where`, `sort`, `dot` and the sequence builtins

use super::helpers::{
    arity, buffer, checked_size, display_text, rows, to_array, to_f64, to_i64, to_usize, too_big,
    type_error,
};
use super::index::items;
use super::ops::{binary, wrap, zip_map3};
use super::EvalError;
use crate::ast::{BinOp, DType, NdArray, Table, Value};
use ndarray::{
    Array1, ArrayD, ArrayView1, ArrayView2, ArrayViewD, Axis, Ix1, Ix2, IxDyn, ShapeError, Slice,
};
use std::cmp::Ordering;

/// Build the value of a list literal.
///
/// Numbers become a 1-D array (bool if every item is a bool), strings a
/// string array, equally shaped arrays stack into one more dimension.
/// Anything else stays a heterogeneous list.
pub(crate) fn from_values(values: Vec<Value>) -> Value {
    if values.is_empty() {
        return Value::Array(NdArray::from_vec(vec![]));
    }

    if values.iter().all(|v| matches!(v, Value::Bool(_))) {
        let bools = values.iter().map(|v| matches!(v, Value::Bool(true))).collect();
        return Value::Array(NdArray::from_bools(bools));
    }

    if values.iter().all(|v| matches!(v, Value::Number(_) | Value::Bool(_))) {
        let data = values
            .iter()
            .map(|v| match v {
                Value::Number(n) => *n,
                Value::Bool(b) => f64::from(u8::from(*b)),
                _ => f64::NAN,
            })
            .collect();
        return Value::Array(NdArray::from_vec(data));
    }

    if values.iter().all(|v| matches!(v, Value::Str(_))) {
        let strings = values
            .into_iter()
            .filter_map(|v| match v {
                Value::Str(s) => Some(s),
                _ => None,
            })
            .collect();
        return Value::StrArray(strings);
    }

    if let Some(stacked) = stack(&values) {
        return Value::Array(stacked);
    }
    Value::List(values)
}

/// Stack equally shaped arrays along a new first axis
fn stack(values: &[Value]) -> Option<NdArray> {
    let arrays: Vec<&NdArray> = values
        .iter()
        .map(|v| match v {
            Value::Array(a) => Some(a),
            _ => None,
        })
        .collect::<Option<_>>()?;
    let views: Vec<ArrayViewD<'_, f64>> = arrays.iter().map(|a| a.values.view()).collect();
    let stacked = ndarray::stack(Axis(0), &views).ok()?;
    let dtype = if arrays.iter().all(|a| a.is_bool()) { DType::Bool } else { DType::Float };
    Some(NdArray::new(stacked, dtype))
}

/// `np.array(x)`
pub(crate) fn array(args: &[Value]) -> Result<Value, EvalError> {
    arity("array", args, 1, 2)?;
    let v = match &args[0] {
        Value::List(items) => match from_values(items.clone()) {
            Value::List(_) => {
                return Err(type_error("numeric or text sequence for array", &args[0]))
            }
            other => other,
        },
        Value::Table(t) => values_of(t)?,
        Value::Array(_) | Value::StrArray(_) | Value::Number(_) | Value::Bool(_) => args[0].clone(),
        Value::Str(s) => Value::StrArray(vec![s.clone()]),
        other => return Err(type_error("sequence for array", other)),
    };
    match args.get(1) {
        Some(dtype) => super::string::astype(v, dtype),
        None => Ok(v),
    }
}

/// Numeric columns of a table as a 2-D array, one row per record
pub(crate) fn values_of(t: &Table) -> Result<Value, EvalError> {
    let mut columns = Vec::with_capacity(t.columns.len());
    for (name, col) in &t.columns {
        let Value::Array(a) = col else {
            return Err(EvalError::TypeError {
                expected: "numeric column".into(),
                got: format!("text column '{}'", name),
            });
        };
        columns.push(a.values.view());
    }
    if columns.is_empty() {
        return Ok(Value::Array(NdArray::new(ArrayD::zeros(IxDyn(&[t.nrows(), 0])), DType::Float)));
    }
    let values = ndarray::stack(Axis(1), &columns)?;
    Ok(Value::Array(NdArray::new(values, DType::Float)))
}

/// `np.arange([start,] stop[, step])`
pub(crate) fn arange(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    arity(name, args, 1, 3)?;
    let nums = args.iter().map(|v| to_f64(v, name)).collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match nums.as_slice() {
        [stop] => (0.0, *stop, 1.0),
        [start, stop] => (*start, *stop, 1.0),
        [start, stop, step, ..] => (*start, *stop, *step),
        [] => return Err(EvalError::Arity { name: name.into(), expected: "1 to 3".into(), got: 0 }),
    };
    if step == 0.0 {
        return Err(EvalError::ValueError(format!("{}() step must not be zero", name)));
    }
    let count = ((stop - start) / step).ceil().max(0.0);
    if !count.is_finite() {
        return Err(EvalError::ValueError(format!("{}() cannot produce {} elements", name, count)));
    }
    if count > usize::MAX as f64 {
        return Err(too_big());
    }
    let count = checked_size(&[count as usize])?;
    let mut data = buffer(count)?;
    data.extend((0..count).map(|i| start + i as f64 * step));
    Ok(Value::Array(NdArray::from_vec(data)))
}

/// Builtin `range`, integers only
pub(crate) fn range(args: &[Value]) -> Result<Value, EvalError> {
    for v in args {
        to_i64(v, "range")?;
    }
    arange("range", args)
}

/// `np.linspace(start, stop, num=50)`, endpoint included
pub(crate) fn linspace(args: &[Value]) -> Result<Value, EvalError> {
    arity("linspace", args, 2, 3)?;
    let start = to_f64(&args[0], "linspace")?;
    let stop = to_f64(&args[1], "linspace")?;
    let num = match args.get(2) {
        Some(v) => to_usize(v, "linspace")?,
        None => 50,
    };
    let mut data = buffer(checked_size(&[num])?)?;
    match num {
        0 => {}
        1 => data.push(start),
        n => {
            let step = (stop - start) / (n - 1) as f64;
            data.extend((0..n).map(|i| if i == n - 1 { stop } else { start + i as f64 * step }));
        }
    }
    Ok(Value::Array(NdArray::from_vec(data)))
}

/// A shape argument: an integer or a sequence of integers
fn shape_arg(v: &Value, op: &str) -> Result<Vec<i64>, EvalError> {
    match v {
        Value::Number(_) => Ok(vec![to_i64(v, op)?]),
        Value::Array(a) => a.iter().map(|x| to_i64(&Value::Number(x), op)).collect(),
        Value::List(items) => items.iter().map(|x| to_i64(x, op)).collect(),
        other => Err(type_error("shape", other)),
    }
}

/// `np.zeros(shape)` / `np.ones(shape)`
pub(crate) fn filled(name: &str, args: &[Value], fill: f64) -> Result<Value, EvalError> {
    arity(name, args, 1, 1)?;
    let shape = shape_arg(&args[0], name)?
        .into_iter()
        .map(|n| {
            usize::try_from(n).map_err(|_| {
                EvalError::ValueError(format!("{}: negative dimension {}", name, n))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let size = checked_size(&shape)?;
    let mut data = buffer(size)?;
    data.resize(size, fill);
    Ok(Value::Array(NdArray::from_shape_vec(&shape, data, DType::Float)?))
}

/// `reshape(a, shape)`; one dimension may be `-1`
pub(crate) fn reshape(a: &Value, shape: &[Value]) -> Result<Value, EvalError> {
    let a = to_array(a, "reshape")?;
    let dims = match shape {
        [single] => shape_arg(single, "reshape")?,
        many => many.iter().map(|v| to_i64(v, "reshape")).collect::<Result<Vec<_>, _>>()?,
    };

    let size = a.size();
    let bad = || {
        EvalError::ValueError(format!(
            "cannot reshape array of size {} into shape {:?}",
            size, dims
        ))
    };
    if dims.iter().filter(|&&d| d == -1).count() > 1 || dims.iter().any(|&d| d < -1) {
        return Err(bad());
    }

    let known = dims
        .iter()
        .filter(|&&d| d != -1)
        .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
        .ok_or_else(bad)?;
    let resolved: Vec<usize> = dims
        .iter()
        .map(|&d| match d {
            -1 if known == 0 || size % known != 0 => Err(bad()),
            -1 => Ok(size / known),
            d => Ok(d as usize),
        })
        .collect::<Result<_, _>>()?;

    let values = a.values.to_shape(IxDyn(&resolved)).map_err(|_| bad())?.into_owned();
    Ok(wrap(values, a.dtype))
}

/// Reverse the axes
pub(crate) fn transpose(v: &Value) -> Result<Value, EvalError> {
    let a = to_array(v, "transpose")?;
    Ok(Value::Array(NdArray::new(a.values.reversed_axes(), a.dtype)))
}

pub(crate) fn flatten(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::StrArray(_) => Ok(v.clone()),
        other => {
            let a = to_array(other, "flatten")?;
            Ok(Value::Array(NdArray::new(Array1::from_iter(a.iter()).into_dyn(), a.dtype)))
        }
    }
}

/// Reverse every axis
pub(crate) fn flip(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::StrArray(items) => Ok(Value::StrArray(items.iter().rev().cloned().collect())),
        other => {
            let mut a = to_array(other, "flip")?;
            for axis in 0..a.ndim() {
                a.values.invert_axis(Axis(axis));
            }
            Ok(Value::Array(a))
        }
    }
}

/// `np.sort`: sorts along the last axis
pub(crate) fn sort(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::StrArray(items) => {
            let mut sorted = items.clone();
            sorted.sort();
            Ok(Value::StrArray(sorted))
        }
        other => {
            let mut a = to_array(other, "sort")?;
            if a.ndim() == 0 {
                return Ok(Value::Array(a));
            }
            for mut lane in a.values.lanes_mut(Axis(a.ndim() - 1)) {
                let mut sorted = lane.to_vec();
                sorted.sort_by(f64::total_cmp);
                lane.assign(&ArrayView1::from(&sorted));
            }
            Ok(Value::Array(a))
        }
    }
}

/// `np.unique`: sorted distinct values, flattened
pub(crate) fn unique(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::StrArray(items) => {
            let mut distinct = items.clone();
            distinct.sort();
            distinct.dedup();
            Ok(Value::StrArray(distinct))
        }
        other => {
            let a = to_array(other, "unique")?;
            let mut data = a.to_vec();
            data.sort_by(f64::total_cmp);
            data.dedup_by(|x, y| x == y || (x.is_nan() && y.is_nan()));
            Ok(Value::Array(NdArray::new(Array1::from_vec(data).into_dyn(), a.dtype)))
        }
    }
}

/// `np.diff`: first difference along the last axis
pub(crate) fn diff(v: &Value) -> Result<Value, EvalError> {
    let a = to_array(v, "diff")?;
    let last = Axis(a.ndim().saturating_sub(1));
    if a.ndim() == 0 || a.values.len_of(last) == 0 {
        return Ok(Value::Array(a));
    }
    let ahead = a.values.slice_axis(last, Slice::from(1..));
    let behind = a.values.slice_axis(last, Slice::from(..-1));
    Ok(Value::Array(NdArray::new(&ahead - &behind, DType::Float)))
}

fn vector(a: &NdArray) -> Result<ArrayView1<'_, f64>, ShapeError> {
    a.values.view().into_dimensionality::<Ix1>()
}

fn matrix(a: &NdArray) -> Result<ArrayView2<'_, f64>, ShapeError> {
    a.values.view().into_dimensionality::<Ix2>()
}

/// `np.dot`: inner product, matrix-vector and matrix-matrix products
pub(crate) fn dot(args: &[Value]) -> Result<Value, EvalError> {
    arity("dot", args, 2, 2)?;
    if matches!(args[0], Value::Number(_)) || matches!(args[1], Value::Number(_)) {
        return binary(BinOp::Mul, args[0].clone(), args[1].clone());
    }
    let a = to_array(&args[0], "dot")?;
    let b = to_array(&args[1], "dot")?;
    let mismatch = || EvalError::Shape { left: a.shape().to_vec(), right: b.shape().to_vec() };

    // Inner dimensions must agree before ndarray multiplies
    let inner_a = match a.shape() {
        [k] | [_, k] => *k,
        _ => return Err(mismatch()),
    };
    let inner_b = match b.shape() {
        [k] | [k, _] => *k,
        _ => return Err(mismatch()),
    };
    if inner_a != inner_b {
        return Err(mismatch());
    }

    let values = match (a.ndim(), b.ndim()) {
        (1, 1) => return Ok(Value::Number(vector(&a)?.dot(&vector(&b)?))),
        (1, _) => vector(&a)?.dot(&matrix(&b)?).into_dyn(),
        (_, 1) => matrix(&a)?.dot(&vector(&b)?).into_dyn(),
        _ => matrix(&a)?.dot(&matrix(&b)?).into_dyn(),
    };
    Ok(wrap(values, DType::Float))
}

/// `np.concatenate(seq, axis=0)`
pub(crate) fn concatenate(args: &[Value]) -> Result<Value, EvalError> {
    arity("concatenate", args, 1, 2)?;
    let parts = items(&args[0])?;
    if parts.iter().all(|p| matches!(p, Value::StrArray(_))) && !parts.is_empty() {
        let joined = parts
            .into_iter()
            .flat_map(|p| match p {
                Value::StrArray(items) => items,
                _ => vec![],
            })
            .collect();
        return Ok(Value::StrArray(joined));
    }

    let arrays = parts.iter().map(|p| to_array(p, "concatenate")).collect::<Result<Vec<_>, _>>()?;
    let first = arrays
        .first()
        .ok_or_else(|| EvalError::ValueError("need at least one array to concatenate".into()))?;
    let axis = match args.get(1) {
        Some(v) => super::helpers::normalize_axis(to_i64(v, "concatenate")?, first.ndim())?,
        None => 0,
    };

    let views: Vec<ArrayViewD<'_, f64>> = arrays.iter().map(|a| a.values.view()).collect();
    let values = ndarray::concatenate(Axis(axis), &views).map_err(|_| {
        let odd = arrays.iter().find(|a| a.shape() != first.shape()).unwrap_or(first);
        EvalError::Shape { left: first.shape().to_vec(), right: odd.shape().to_vec() }
    })?;
    let dtype = if arrays.iter().all(|a| a.is_bool()) { DType::Bool } else { DType::Float };
    Ok(Value::Array(NdArray::new(values, dtype)))
}

/// `np.where(cond)` gives the indices of true elements per axis;
/// `np.where(cond, x, y)` picks elementwise
pub(crate) fn where_(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [cond] => {
            let c = to_array(cond, "where")?;
            let mut per_axis = vec![Vec::new(); c.ndim()];
            for (index, _) in c.values.indexed_iter().filter(|(_, &x)| x != 0.0) {
                for (axis, positions) in per_axis.iter_mut().enumerate() {
                    positions.push(index[axis] as f64);
                }
            }
            Ok(Value::List(
                per_axis.into_iter().map(|v| Value::Array(NdArray::from_vec(v))).collect(),
            ))
        }
        [cond, x, y] => {
            let operand = |v: &Value| {
                super::helpers::as_operand(v).ok_or_else(|| type_error("numeric value", v))
            };
            let (c, x, y) = (operand(cond)?, operand(x)?, operand(y)?);
            let dtype = if x.is_bool() && y.is_bool() { DType::Bool } else { DType::Float };
            let values = zip_map3(&c, &x, &y, |c, x, y| if c != 0.0 { x } else { y })?;
            Ok(wrap(values, dtype))
        }
        _ => Err(EvalError::Arity {
            name: "where".into(),
            expected: "1 or 3".into(),
            got: args.len(),
        }),
    }
}

/// `tolist()`: nested lists of scalars
pub(crate) fn tolist(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::Array(a) if a.ndim() == 0 => {
            Ok(a.first().map(|x| a.scalar(x)).unwrap_or(Value::None))
        }
        Value::Array(a) => Ok(Value::List(
            rows(a)
                .into_iter()
                .map(|row| match &row {
                    Value::Array(_) => tolist(&row),
                    _ => Ok(row),
                })
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Value::StrArray(items) => Ok(Value::List(items.iter().cloned().map(Value::Str).collect())),
        Value::List(_) => Ok(v.clone()),
        other => Err(type_error("array", other)),
    }
}

/// Builtin `list(x)`
pub(crate) fn list(v: &Value) -> Result<Value, EvalError> {
    items(v).map(Value::List)
}

/// Builtin `sorted(x)`: a list in ascending order
pub(crate) fn sorted(v: &Value) -> Result<Value, EvalError> {
    let mut values = items(v)?;
    let mut failure = None;
    values.sort_by(|a, b| match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => match (to_f64(a, "sorted"), to_f64(b, "sorted")) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            (Err(e), _) | (_, Err(e)) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        },
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(Value::List(values)),
    }
}

/// Builtin `len(x)`
pub(crate) fn len(args: &[Value]) -> Result<Value, EvalError> {
    arity("len", args, 1, 1)?;
    match &args[0] {
        Value::Array(a) if a.ndim() == 0 => Err(EvalError::TypeError {
            expected: "sized value for len()".into(),
            got: "0-d array".into(),
        }),
        Value::Array(_) | Value::StrArray(_) | Value::List(_) | Value::Table(_) | Value::Str(_) => {
            Ok(Value::Number(args[0].len() as f64))
        }
        other => Err(type_error("sized value for len()", other)),
    }
}

/// Text of each element, for `astype(str)`
pub(crate) fn to_text_array(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::StrArray(_) => Ok(v.clone()),
        Value::Array(a) => {
            Ok(Value::StrArray(a.iter().map(|x| display_text(&a.scalar(x))).collect()))
        }
        other => Ok(Value::StrArray(vec![display_text(other)])),
    }
}
