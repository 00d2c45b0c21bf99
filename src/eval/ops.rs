//! Operators: numpy-style broadcasting arithmetic, comparisons and string ops

use super::helpers::{as_operand, is_numeric, to_usize, truthy, type_error};
use super::EvalError;
use crate::ast::{BinOp, DType, NdArray, UnaryOp, Value};
use ndarray::{ArrayD, ArrayViewD, IxDyn, Zip};

/// Shape that every operand is stretched to. Axes of length 1 give way to
/// the other operands; `broadcast` rejects anything else that disagrees.
fn target_shape(arrays: &[&NdArray]) -> Vec<usize> {
    let ndim = arrays.iter().map(|a| a.ndim()).max().unwrap_or(0);
    let mut shape = vec![1; ndim];
    for a in arrays {
        let pad = ndim - a.ndim();
        for (slot, &dim) in shape[pad..].iter_mut().zip(a.shape()) {
            if *slot == 1 {
                *slot = dim;
            }
        }
    }
    shape
}

/// Views of `arrays`, all broadcast to one common shape
pub(crate) fn broadcast_all<'a>(
    arrays: &[&'a NdArray],
) -> Result<Vec<ArrayViewD<'a, f64>>, EvalError> {
    let shape = target_shape(arrays);
    arrays
        .iter()
        .map(|a| {
            a.values.broadcast(IxDyn(&shape)).ok_or_else(|| EvalError::Shape {
                left: arrays.first().map(|f| f.shape().to_vec()).unwrap_or_default(),
                right: a.shape().to_vec(),
            })
        })
        .collect()
}

/// Apply `f` elementwise over two broadcast operands
pub(crate) fn zip_map(
    l: &NdArray,
    r: &NdArray,
    f: impl Fn(f64, f64) -> f64,
) -> Result<ArrayD<f64>, EvalError> {
    match broadcast_all(&[l, r])?.as_slice() {
        [a, b] => Ok(Zip::from(a).and(b).map_collect(|&x, &y| f(x, y))),
        _ => Err(EvalError::Shape { left: l.shape().to_vec(), right: r.shape().to_vec() }),
    }
}

/// Apply `f` elementwise over three broadcast operands
pub(crate) fn zip_map3(
    a: &NdArray,
    b: &NdArray,
    c: &NdArray,
    f: impl Fn(f64, f64, f64) -> f64,
) -> Result<ArrayD<f64>, EvalError> {
    match broadcast_all(&[a, b, c])?.as_slice() {
        [x, y, z] => Ok(Zip::from(x).and(y).and(z).map_collect(|&p, &q, &r| f(p, q, r))),
        _ => Err(EvalError::Shape { left: a.shape().to_vec(), right: b.shape().to_vec() }),
    }
}

/// Wrap a computed array: 0-d results collapse back to scalars
pub(crate) fn wrap(values: ArrayD<f64>, dtype: DType) -> Value {
    if values.ndim() == 0 {
        let x = values.iter().next().copied().unwrap_or(f64::NAN);
        return match dtype {
            DType::Float => Value::Number(x),
            DType::Bool => Value::Bool(x != 0.0),
        };
    }
    Value::Array(NdArray::new(values, dtype))
}

fn bool_to_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Python-style modulo: the result takes the sign of the divisor
fn py_mod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return f64::NAN;
    }
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
}

fn integer_bits(x: f64, op: BinOp) -> Result<i64, EvalError> {
    if x.fract() != 0.0 || !x.is_finite() {
        return Err(EvalError::TypeError {
            expected: format!("integer or bool operands for {}", op.symbol()),
            got: crate::ast::format_number(x),
        });
    }
    Ok(x as i64)
}

fn numeric_binary(op: BinOp, l: NdArray, r: NdArray) -> Result<Value, EvalError> {
    let both_bool = l.is_bool() && r.is_bool();

    if matches!(op, BinOp::BitAnd | BinOp::BitOr) && !both_bool {
        // Bitwise on integers: validate up front so errors are not lost inside the closure
        for x in l.iter().chain(r.iter()) {
            integer_bits(x, op)?;
        }
    }

    let values = zip_map(&l, &r, |a, b| match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::FloorDiv => (a / b).floor(),
        BinOp::Mod => py_mod(a, b),
        BinOp::Pow => a.powf(b),
        BinOp::Eq => bool_to_f64(a == b),
        BinOp::Ne => bool_to_f64(a != b),
        BinOp::Lt => bool_to_f64(a < b),
        BinOp::Le => bool_to_f64(a <= b),
        BinOp::Gt => bool_to_f64(a > b),
        BinOp::Ge => bool_to_f64(a >= b),
        BinOp::BitAnd => ((a as i64) & (b as i64)) as f64,
        BinOp::BitOr => ((a as i64) | (b as i64)) as f64,
    })?;

    let bitwise = matches!(op, BinOp::BitAnd | BinOp::BitOr);
    let dtype =
        if op.is_comparison() || (both_bool && bitwise) { DType::Bool } else { DType::Float };
    Ok(wrap(values, dtype))
}

fn compare_str(op: BinOp, a: &str, b: &str) -> Option<bool> {
    Some(match op {
        BinOp::Eq => a == b,
        BinOp::Ne => a != b,
        BinOp::Lt => a < b,
        BinOp::Le => a <= b,
        BinOp::Gt => a > b,
        BinOp::Ge => a >= b,
        _ => return None,
    })
}

/// Zip two text operands, broadcasting a single string against an array
fn zip_text<T>(
    l: &Value,
    r: &Value,
    mut f: impl FnMut(&str, &str) -> T,
) -> Result<Option<Vec<T>>, EvalError> {
    match (l, r) {
        (Value::StrArray(a), Value::Str(b)) => Ok(Some(a.iter().map(|x| f(x, b)).collect())),
        (Value::Str(a), Value::StrArray(b)) => Ok(Some(b.iter().map(|y| f(a, y)).collect())),
        (Value::StrArray(a), Value::StrArray(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::Shape { left: vec![a.len()], right: vec![b.len()] });
            }
            Ok(Some(a.iter().zip(b).map(|(x, y)| f(x, y)).collect()))
        }
        _ => Ok(None),
    }
}

fn unsupported(op: BinOp, l: &Value, r: &Value) -> EvalError {
    EvalError::TypeError {
        expected: format!("compatible operands for {}", op.symbol()),
        got: format!("{} and {}", l.type_name(), r.type_name()),
    }
}

/// `s * n`, failing instead of aborting when the result cannot be allocated
fn repeat(s: &str, n: usize) -> Result<String, EvalError> {
    let too_long = || EvalError::ValueError("string is too long".into());
    let total = s.len().checked_mul(n).ok_or_else(too_long)?;
    let mut out = String::new();
    out.try_reserve_exact(total).map_err(|_| too_long())?;
    for _ in 0..n {
        out.push_str(s);
    }
    Ok(out)
}

fn text_binary(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    match (&l, &r, op) {
        (Value::Str(a), Value::Str(b), BinOp::Add) => return Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Str(a), Value::Str(b), _) => {
            return compare_str(op, a, b).map(Value::Bool).ok_or_else(|| unsupported(op, &l, &r));
        }
        (Value::Str(s), n, BinOp::Mul) | (n, Value::Str(s), BinOp::Mul) if is_numeric(n) => {
            return repeat(s, to_usize(n, "*")?).map(Value::Str);
        }
        _ => {}
    }

    if op == BinOp::Add {
        if let Some(joined) = zip_text(&l, &r, |a, b| format!("{}{}", a, b))? {
            return Ok(Value::StrArray(joined));
        }
    }
    if op.is_comparison() {
        if let Some(bits) = zip_text(&l, &r, |a, b| compare_str(op, a, b).unwrap_or(false))? {
            return Ok(Value::Array(NdArray::from_bools(bits)));
        }
    }
    Err(unsupported(op, &l, &r))
}

/// Evaluate `l op r`
pub(crate) fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (as_operand(&l), as_operand(&r)) {
        return numeric_binary(op, a, b);
    }

    match (&l, &r) {
        (Value::Str(_) | Value::StrArray(_), _) | (_, Value::Str(_) | Value::StrArray(_)) => {
            // Mixed text/number equality is simply false, as in Python
            if matches!(op, BinOp::Eq | BinOp::Ne)
                && matches!(
                    (&l, &r),
                    (Value::Str(_), Value::Number(_)) | (Value::Number(_), Value::Str(_))
                )
            {
                return Ok(Value::Bool(op == BinOp::Ne));
            }
            text_binary(op, l, r)
        }
        (Value::List(a), Value::List(b)) if op == BinOp::Add => {
            Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::None, Value::None) if matches!(op, BinOp::Eq | BinOp::Ne) => {
            Ok(Value::Bool(op == BinOp::Eq))
        }
        _ if matches!(op, BinOp::Eq | BinOp::Ne) => Ok(Value::Bool((l == r) == (op == BinOp::Eq))),
        _ => Err(unsupported(op, &l, &r)),
    }
}

/// Evaluate `-x`, `+x`, `~x`, `not x`
pub(crate) fn unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!truthy(&v)?));
    }
    let a = as_operand(&v).ok_or_else(|| type_error("numeric operand", &v))?;
    match op {
        UnaryOp::Not => Ok(Value::Bool(!truthy(&v)?)),
        UnaryOp::Neg => Ok(wrap(a.values.mapv(|x| -x), DType::Float)),
        UnaryOp::Pos => Ok(wrap(a.values, DType::Float)),
        UnaryOp::Invert if a.is_bool() => {
            Ok(wrap(a.values.mapv(|x| bool_to_f64(x == 0.0)), DType::Bool))
        }
        UnaryOp::Invert => {
            for x in a.iter() {
                integer_bits(x, BinOp::BitAnd)?;
            }
            Ok(wrap(a.values.mapv(|x| !(x as i64) as f64), DType::Float))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arr(v: &[f64]) -> Value {
        Value::Array(NdArray::from_vec(v.to_vec()))
    }

    fn matrix(shape: &[usize], data: Vec<f64>) -> NdArray {
        NdArray::from_shape_vec(shape, data, DType::Float).unwrap()
    }

    #[test]
    fn broadcast_shape_rules() {
        let shape_of = |arrays: &[&NdArray]| broadcast_all(arrays).map(|v| v[0].shape().to_vec());
        let col = matrix(&[2, 1], vec![1.0, 2.0]);
        let row = matrix(&[1, 4], vec![0.0; 4]);
        let vec3 = NdArray::from_vec(vec![0.0; 3]);
        let scalar = NdArray::zero_dim(1.0, DType::Float);
        assert_eq!(shape_of(&[&vec3, &scalar]).unwrap(), vec![3]);
        assert_eq!(shape_of(&[&col, &row]).unwrap(), vec![2, 4]);
        assert_eq!(shape_of(&[&matrix(&[2, 3], vec![0.0; 6]), &vec3]).unwrap(), vec![2, 3]);
        assert!(shape_of(&[&vec3, &NdArray::from_vec(vec![0.0; 2])]).is_err());
        assert!(shape_of(&[&NdArray::from_vec(vec![]), &vec3]).is_err());
    }

    #[test]
    fn scalar_times_array() {
        let doubled = binary(BinOp::Mul, arr(&[1.0, 2.0, 3.0]), Value::Number(2.0)).unwrap();
        assert_eq!(doubled, arr(&[2.0, 4.0, 6.0]));
    }

    #[test]
    fn row_broadcast() {
        let m = Value::Array(matrix(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]));
        let out = binary(BinOp::Add, m, arr(&[10.0, 20.0])).unwrap();
        assert_eq!(out, Value::Array(matrix(&[2, 2], vec![11.0, 22.0, 13.0, 24.0])));
    }

    #[test]
    fn mismatched_lengths_error() {
        let err = binary(BinOp::Add, arr(&[1.0, 2.0, 3.0]), arr(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, EvalError::Shape { .. }));
    }

    #[test]
    fn comparison_yields_bool_array() {
        let out = binary(BinOp::Gt, arr(&[1.0, 5.0]), Value::Number(2.0)).unwrap();
        assert_eq!(out, Value::Array(NdArray::from_bools(vec![false, true])));
    }

    #[test]
    fn python_modulo_sign() {
        let n = Value::Number;
        assert_eq!(binary(BinOp::Mod, n(-7.0), n(3.0)).unwrap(), n(2.0));
        assert_eq!(binary(BinOp::FloorDiv, n(7.0), n(2.0)).unwrap(), n(3.0));
    }

    #[test]
    fn bool_masks_combine() {
        let a = Value::Array(NdArray::from_bools(vec![true, true, false]));
        let b = Value::Array(NdArray::from_bools(vec![true, false, false]));
        assert_eq!(
            binary(BinOp::BitAnd, a, b).unwrap(),
            Value::Array(NdArray::from_bools(vec![true, false, false]))
        );
    }

    #[test]
    fn bitwise_rejects_fractions() {
        assert!(binary(BinOp::BitOr, Value::Number(1.5), Value::Number(2.0)).is_err());
    }

    #[test]
    fn string_concat_and_compare() {
        let lines = Value::StrArray(vec!["a".into(), "".into()]);
        assert_eq!(
            binary(BinOp::Add, lines.clone(), Value::Str("!".into())).unwrap(),
            Value::StrArray(vec!["a!".into(), "!".into()])
        );
        assert_eq!(
            binary(BinOp::Ne, lines, Value::Str("".into())).unwrap(),
            Value::Array(NdArray::from_bools(vec![true, false]))
        );
        assert_eq!(
            binary(BinOp::Mul, Value::Str("ab".into()), Value::Number(2.0)).unwrap(),
            Value::Str("abab".into())
        );
        assert!(binary(BinOp::Mul, Value::Str("ab".into()), Value::Number(1e19)).is_err());
    }

    #[test]
    fn unary_ops() {
        assert_eq!(unary(UnaryOp::Neg, arr(&[1.0, -2.0])).unwrap(), arr(&[-1.0, 2.0]));
        assert_eq!(
            unary(UnaryOp::Invert, Value::Array(NdArray::from_bools(vec![true, false]))).unwrap(),
            Value::Array(NdArray::from_bools(vec![false, true]))
        );
        assert_eq!(unary(UnaryOp::Not, Value::Number(0.0)).unwrap(), Value::Bool(true));
    }
}
