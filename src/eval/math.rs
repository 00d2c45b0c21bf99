//! Elementwise math (`np.sqrt`, `np.round`, `np.clip`) and the scalar `math` module

use super::helpers::{arity, as_operand, to_array, to_f64, to_i64};
use super::ops::{wrap, zip_map, zip_map3};
use super::EvalError;
use crate::ast::{DType, NdArray, Value};

/// Elementwise functions of one argument that always produce floats
pub(crate) fn unary_fn(name: &str) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match name {
        "abs" | "absolute" | "fabs" => f64::abs,
        "sqrt" => f64::sqrt,
        "exp" => f64::exp,
        "log" => f64::ln,
        "log10" => f64::log10,
        "log2" => f64::log2,
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "floor" => f64::floor,
        "ceil" => f64::ceil,
        "trunc" => f64::trunc,
        "sign" => sign,
        _ => return None,
    };
    Some(f)
}

fn sign(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn operand(v: &Value, name: &str) -> Result<NdArray, EvalError> {
    match as_operand(v) {
        Some(a) => Ok(a),
        None => to_array(v, name),
    }
}

/// Apply a scalar function to every element; scalars stay scalars
pub(crate) fn map_unary(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    arity(name, args, 1, 1)?;
    let a = operand(&args[0], name)?;
    Ok(wrap(a.values.mapv(f), DType::Float))
}

/// `np.isnan`, `np.isinf`, `np.isfinite`
pub(crate) fn classify(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    arity(name, args, 1, 1)?;
    let test: fn(f64) -> bool = match name {
        "isnan" => f64::is_nan,
        "isinf" => f64::is_infinite,
        "isfinite" => f64::is_finite,
        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    };
    let a = operand(&args[0], name)?;
    Ok(wrap(a.values.mapv(|x| if test(x) { 1.0 } else { 0.0 }), DType::Bool))
}

/// Round half to even at `decimals` places
pub(crate) fn round(args: &[Value]) -> Result<Value, EvalError> {
    arity("round", args, 1, 2)?;
    let decimals = match args.get(1) {
        None | Some(Value::None) => 0,
        Some(v) => to_i64(v, "round")?,
    };
    let scale = 10f64.powi(decimals as i32);
    let a = operand(&args[0], "round")?;
    let values = a.values.mapv(|x| {
        if decimals == 0 {
            x.round_ties_even()
        } else {
            (x * scale).round_ties_even() / scale
        }
    });
    Ok(wrap(values, a.dtype))
}

/// `np.clip(a, lo, hi)`; either bound may be `None`
pub(crate) fn clip(args: &[Value]) -> Result<Value, EvalError> {
    arity("clip", args, 3, 3)?;
    let a = operand(&args[0], "clip")?;
    let bound = |v: &Value, open: f64| match v {
        Value::None => Ok(NdArray::zero_dim(open, DType::Float)),
        other => operand(other, "clip"),
    };
    let lo = bound(&args[1], f64::NEG_INFINITY)?;
    let hi = bound(&args[2], f64::INFINITY)?;
    let values = zip_map3(&a, &lo, &hi, |x, lo, hi| x.max(lo).min(hi))?;
    Ok(wrap(values, DType::Float))
}

/// Elementwise functions of two broadcast arguments
pub(crate) fn binary_fn(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    arity(name, args, 2, 2)?;
    let f: fn(f64, f64) -> f64 = match name {
        "power" => f64::powf,
        "maximum" => |a, b| if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) },
        "minimum" => |a, b| if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) },
        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    };
    let a = operand(&args[0], name)?;
    let b = operand(&args[1], name)?;
    Ok(wrap(zip_map(&a, &b, f)?, DType::Float))
}

/// The scalar `math` module: arguments must be single numbers
pub(crate) fn math_call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let qualified = format!("math.{}", name);
    if name == "pow" {
        arity(&qualified, args, 2, 2)?;
        let x = to_f64(&args[0], &qualified)?;
        let y = to_f64(&args[1], &qualified)?;
        return Ok(Value::Number(x.powf(y)));
    }
    if matches!(name, "isnan" | "isinf" | "isfinite") {
        arity(&qualified, args, 1, 1)?;
        let x = to_f64(&args[0], &qualified)?;
        let b = match name {
            "isnan" => x.is_nan(),
            "isinf" => x.is_infinite(),
            _ => x.is_finite(),
        };
        return Ok(Value::Bool(b));
    }

    let f = match name {
        "sqrt" | "exp" | "log" | "log10" | "log2" | "sin" | "cos" | "tan" | "floor" | "ceil"
        | "fabs" | "trunc" => unary_fn(name),
        _ => None,
    }
    .ok_or_else(|| EvalError::UnknownFunction(qualified.clone()))?;

    arity(&qualified, args, 1, 1)?;
    let x = to_f64(&args[0], &qualified)?;
    let domain_error = match name {
        "sqrt" => x < 0.0,
        "log" | "log10" | "log2" => x <= 0.0,
        _ => false,
    };
    if domain_error {
        return Err(EvalError::ValueError(format!("math domain error: {}({})", qualified, x)));
    }
    Ok(Value::Number(f(x)))
}
