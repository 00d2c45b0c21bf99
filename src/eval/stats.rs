//! Reductions and running totals: sum, mean, std, median, percentile, cumsum

use super::helpers::{arity, normalize_axis, to_array, to_f64, to_i64, type_error};
use super::index::items;
use super::ops::wrap;
use super::EvalError;
use crate::ast::{DType, NdArray, Value};
use ndarray::{ArrayD, Axis};
use std::cmp::Ordering;

/// Lane reducer: `None` means the reduction has no identity for empty input
type Reducer = fn(&[f64]) -> Option<f64>;

pub(crate) const REDUCTIONS: &[&str] = &[
    "sum",
    "prod",
    "mean",
    "min",
    "max",
    "std",
    "var",
    "median",
    "argmin",
    "argmax",
    "count_nonzero",
    "all",
    "any",
];

fn reducer(name: &str) -> Option<Reducer> {
    let f: Reducer = match name {
        "sum" => sum,
        "prod" => prod,
        "mean" => |xs| Some(mean(xs)),
        "min" => |xs| extreme(xs, Ordering::Less),
        "max" => |xs| extreme(xs, Ordering::Greater),
        "var" => |xs| Some(variance(xs)),
        "std" => |xs| Some(variance(xs).sqrt()),
        "median" => |xs| Some(quantile(xs, 0.5)),
        "argmin" => |xs| arg_extreme(xs, Ordering::Less),
        "argmax" => |xs| arg_extreme(xs, Ordering::Greater),
        "count_nonzero" => |xs| Some(xs.iter().filter(|&&x| x != 0.0).count() as f64),
        "all" => |xs| Some(bool_f64(xs.iter().all(|&x| x != 0.0))),
        "any" => |xs| Some(bool_f64(xs.iter().any(|&x| x != 0.0))),
        _ => return None,
    };
    Some(f)
}

fn sum(xs: &[f64]) -> Option<f64> {
    Some(xs.iter().sum())
}

fn prod(xs: &[f64]) -> Option<f64> {
    Some(xs.iter().product())
}

fn bool_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance (ddof = 0)
fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    mean(&xs.iter().map(|x| (x - m) * (x - m)).collect::<Vec<_>>())
}

/// NaN propagates
fn extreme(xs: &[f64], want: Ordering) -> Option<f64> {
    let idx = arg_extreme(xs, want)?;
    Some(xs[idx as usize])
}

/// First position of the extreme value, or of the first NaN
fn arg_extreme(xs: &[f64], want: Ordering) -> Option<f64> {
    let mut best: Option<usize> = None;
    for (i, &x) in xs.iter().enumerate() {
        if x.is_nan() {
            return Some(i as f64);
        }
        match best {
            Some(b) if x.partial_cmp(&xs[b]) != Some(want) => {}
            _ => best = Some(i),
        }
    }
    best.map(|b| b as f64)
}

/// Linear-interpolated quantile, `q` in `0.0..=1.0`
fn quantile(xs: &[f64], q: f64) -> f64 {
    if xs.is_empty() || xs.iter().any(|x| x.is_nan()) {
        return f64::NAN;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Apply `f` to every lane along `axis`, dropping that axis from the shape
pub(crate) fn reduce_axis(
    a: &NdArray,
    axis: usize,
    mut f: impl FnMut(&[f64]) -> Result<f64, EvalError>,
) -> Result<ArrayD<f64>, EvalError> {
    let mut failure = None;
    let out = a.values.map_axis(Axis(axis), |lane| {
        f(&lane.to_vec()).unwrap_or_else(|e| {
            failure.get_or_insert(e);
            f64::NAN
        })
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

/// Optional `axis` argument; `None` reduces over the flattened array
fn axis_arg(args: &[Value], pos: usize, ndim: usize) -> Result<Option<usize>, EvalError> {
    match args.get(pos) {
        None | Some(Value::None) => Ok(None),
        Some(v) => normalize_axis(to_i64(v, "axis")?, ndim).map(Some),
    }
}

/// `np.sum(a, axis)` and friends, also used for the array methods
pub(crate) fn reduce(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    arity(name, args, 1, 2)?;
    let f = reducer(name).ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    let a = to_array(&args[0], name)?;
    let dtype = if matches!(name, "all" | "any") { DType::Bool } else { DType::Float };
    let apply = |xs: &[f64]| {
        f(xs).ok_or_else(|| {
            EvalError::ValueError(format!(
                "zero-size array to reduction operation {} which has no identity",
                name
            ))
        })
    };

    match axis_arg(args, 1, a.ndim())? {
        None => {
            let x = apply(&a.to_vec())?;
            Ok(NdArray::zero_dim(x, dtype).scalar(x))
        }
        Some(axis) => Ok(wrap(reduce_axis(&a, axis, apply)?, dtype)),
    }
}

/// `np.percentile(a, q, axis)`; `q` may be a scalar or an array of percentiles
pub(crate) fn percentile(args: &[Value]) -> Result<Value, EvalError> {
    arity("percentile", args, 2, 3)?;
    let a = to_array(&args[0], "percentile")?;
    let qs = to_array(&args[1], "percentile")?;
    if let Some(bad) = qs.iter().find(|q| !(0.0..=100.0).contains(q)) {
        return Err(EvalError::ValueError(format!(
            "percentiles must be in the range [0, 100], got {}",
            bad
        )));
    }

    let axis = axis_arg(args, 2, a.ndim())?;
    let first_q = qs.first().unwrap_or(f64::NAN) / 100.0;
    let scalar_q = matches!(args[1], Value::Number(_));
    match (axis, scalar_q) {
        (None, true) => Ok(Value::Number(quantile(&a.to_vec(), first_q))),
        (None, false) => {
            let xs = a.to_vec();
            let values = qs.values.mapv(|q| quantile(&xs, q / 100.0));
            Ok(Value::Array(NdArray::new(values, DType::Float)))
        }
        (Some(axis), true) => {
            let values = reduce_axis(&a, axis, |xs| Ok(quantile(xs, first_q)))?;
            Ok(wrap(values, DType::Float))
        }
        (Some(_), false) => Err(EvalError::ValueError(
            "percentile with both an axis and several percentiles is not supported".into(),
        )),
    }
}

/// `np.cumsum` / `np.cumprod`: flattened without an axis, lane-wise with one
pub(crate) fn cumulative(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    arity(name, args, 1, 2)?;
    let a = to_array(&args[0], name)?;
    let product = match name {
        "cumsum" => false,
        "cumprod" => true,
        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    };
    let step = |prev: &f64, cur: &mut f64| {
        if product {
            *cur *= *prev
        } else {
            *cur += *prev
        }
    };

    let (mut values, axis) = match axis_arg(args, 1, a.ndim())? {
        None => (NdArray::from_vec(a.to_vec()).values, 0),
        Some(axis) => (a.values, axis),
    };
    if values.ndim() > 0 {
        values.accumulate_axis_inplace(Axis(axis), step);
    }
    Ok(Value::Array(NdArray::new(values, DType::Float)))
}

/// Builtin `sum(iterable, start=0)`: adds the items of the first axis
pub(crate) fn builtin_sum(args: &[Value]) -> Result<Value, EvalError> {
    arity("sum", args, 1, 2)?;
    let mut total = match args.get(1) {
        Some(start) => start.clone(),
        None => Value::Number(0.0),
    };
    for item in items(&args[0])? {
        total = super::ops::binary(crate::ast::BinOp::Add, total, item)?;
    }
    Ok(total)
}

/// Builtin `min` / `max`: either one iterable or several arguments
pub(crate) fn builtin_extreme(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Arity {
            name: name.to_string(),
            expected: "at least 1".into(),
            got: 0,
        });
    }
    let values = if args.len() == 1 { items(&args[0])? } else { args.to_vec() };
    let want = if name == "min" { Ordering::Less } else { Ordering::Greater };

    let mut best: Option<Value> = None;
    for item in values {
        let better = match &best {
            None => true,
            Some(current) => compare(&item, current)? == want,
        };
        if better {
            best = Some(item);
        }
    }
    best.ok_or_else(|| EvalError::ValueError(format!("{}() arg is an empty sequence", name)))
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Str(_), other) | (other, Value::Str(_)) => {
            Err(type_error("values of one kind to compare", other))
        }
        _ => {
            let x = to_f64(a, "comparison")?;
            let y = to_f64(b, "comparison")?;
            Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
        }
    }
}
