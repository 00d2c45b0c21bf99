use super::EvalError;
use crate::ast::{DType, NdArray, Value};

/// Check an argument count against `min..=max`
pub(crate) fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvalError::Arity { name: name.to_string(), expected, got: args.len() });
    }
    Ok(())
}

pub(crate) fn type_error(expected: &str, got: &Value) -> EvalError {
    EvalError::TypeError { expected: expected.to_string(), got: got.type_name().to_string() }
}

/// Is this value a number, bool or numeric array?
pub(crate) fn is_numeric(v: &Value) -> bool {
    matches!(v, Value::Number(_) | Value::Bool(_) | Value::Array(_))
}

/// View a numeric value as an array; scalars become 0-d arrays (shape `[]`)
pub(crate) fn as_operand(v: &Value) -> Option<NdArray> {
    match v {
        Value::Number(n) => Some(NdArray::zero_dim(*n, DType::Float)),
        Value::Bool(b) => Some(NdArray::zero_dim(if *b { 1.0 } else { 0.0 }, DType::Bool)),
        Value::Array(a) => Some(a.clone()),
        _ => None,
    }
}

/// Coerce to an array of at least one dimension.
///
/// Lists of numbers are accepted so `np.sum([1, 2])` works even when the
/// list literal could not become an array on its own.
pub(crate) fn to_array(v: &Value, op: &str) -> Result<NdArray, EvalError> {
    match v {
        Value::Array(a) => Ok(a.clone()),
        Value::Number(n) => Ok(NdArray::from_vec(vec![*n])),
        Value::Bool(b) => Ok(NdArray::from_bools(vec![*b])),
        Value::List(items) => {
            let mut data = Vec::with_capacity(items.len());
            for item in items {
                data.push(to_f64(item, op)?);
            }
            Ok(NdArray::from_vec(data))
        }
        other => Err(EvalError::TypeError {
            expected: format!("numeric array for {}", op),
            got: other.type_name().to_string(),
        }),
    }
}

/// Coerce to a single number
pub(crate) fn to_f64(v: &Value, op: &str) -> Result<f64, EvalError> {
    match v {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Array(a) if a.size() == 1 => Ok(a.first().unwrap_or(f64::NAN)),
        other => Err(EvalError::TypeError {
            expected: format!("number for {}", op),
            got: other.type_name().to_string(),
        }),
    }
}

/// 2^63: the first float past `i64::MAX`
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Coerce to an integer; non-integral numbers are rejected
pub(crate) fn to_i64(v: &Value, op: &str) -> Result<i64, EvalError> {
    let n = to_f64(v, op)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(EvalError::TypeError {
            expected: format!("integer for {}", op),
            got: crate::ast::format_number(n),
        });
    }
    if !(-I64_LIMIT..I64_LIMIT).contains(&n) {
        return Err(EvalError::ValueError(format!(
            "{}: {} does not fit in a 64-bit integer",
            op,
            crate::ast::format_number(n)
        )));
    }
    Ok(n as i64)
}

/// Coerce to a non-negative count
pub(crate) fn to_usize(v: &Value, op: &str) -> Result<usize, EvalError> {
    let n = to_i64(v, op)?;
    usize::try_from(n).map_err(|_| EvalError::ValueError(format!("{}: negative size {}", op, n)))
}

pub(crate) fn to_str<'a>(v: &'a Value, op: &str) -> Result<&'a str, EvalError> {
    match v {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::TypeError {
            expected: format!("str for {}", op),
            got: other.type_name().to_string(),
        }),
    }
}

/// Truthiness, numpy style: an array is only true or false when it holds
/// exactly one element
pub(crate) fn truthy(v: &Value) -> Result<bool, EvalError> {
    match v {
        Value::None => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Str(s) => Ok(!s.is_empty()),
        Value::Array(a) => match a.size() {
            0 => Ok(false),
            1 => Ok(a.first().is_some_and(|x| x != 0.0)),
            _ => Err(EvalError::ValueError(
                "the truth value of an array with more than one element is ambiguous; \
                 use any() or all()"
                    .into(),
            )),
        },
        Value::StrArray(items) => Ok(!items.is_empty()),
        Value::List(items) => Ok(!items.is_empty()),
        Value::Table(t) => Ok(t.nrows() > 0),
        Value::Module(_) | Value::Function(_) => Ok(true),
    }
}

/// Text of one element for string conversion
pub(crate) fn display_text(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        Value::Number(n) => crate::ast::format_number(*n),
        Value::Bool(b) => if *b { "True".into() } else { "False".into() },
        Value::None => "None".into(),
        other => crate::display::repr(other),
    }
}

/// Split an array into its elements along the first axis
pub(crate) fn rows(a: &NdArray) -> Vec<Value> {
    match a.ndim() {
        0 => a.first().map(|x| a.scalar(x)).into_iter().collect(),
        1 => a.iter().map(|x| a.scalar(x)).collect(),
        _ => a
            .values
            .outer_iter()
            .map(|row| Value::Array(NdArray::new(row.to_owned(), a.dtype)))
            .collect(),
    }
}

/// Largest element count an array may have
const MAX_SIZE: usize = isize::MAX as usize / std::mem::size_of::<f64>();

pub(crate) fn too_big() -> EvalError {
    EvalError::ValueError("array is too big".into())
}

/// Element count of `shape`, rejecting shapes that cannot be allocated
pub(crate) fn checked_size(shape: &[usize]) -> Result<usize, EvalError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .filter(|&size| size <= MAX_SIZE)
        .ok_or_else(too_big)
}

/// An empty buffer with room for `size` elements
pub(crate) fn buffer<T>(size: usize) -> Result<Vec<T>, EvalError> {
    let mut data = Vec::new();
    data.try_reserve_exact(size).map_err(|_| too_big())?;
    Ok(data)
}

/// Normalize a possibly negative axis for an array of `ndim` dimensions
pub(crate) fn normalize_axis(axis: i64, ndim: usize) -> Result<usize, EvalError> {
    let n = ndim as i64;
    let resolved = if axis < 0 { axis + n } else { axis };
    if resolved < 0 || resolved >= n {
        return Err(EvalError::ValueError(format!(
            "axis {} is out of bounds for array of dimension {}",
            axis, ndim
        )));
    }
    Ok(resolved as usize)
}
