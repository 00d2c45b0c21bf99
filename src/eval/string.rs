//! Text: string methods, `str`/`float`/`int` conversions, `astype` and `json`

use super::array::to_text_array;
use super::helpers::{arity, display_text, to_array, to_str, truthy, type_error};
use super::index::items;
use super::EvalError;
use crate::ast::{value_to_json, DType, NdArray, Value};

/// Methods on `Value::Str`
pub(crate) fn method(s: &str, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let qualified = format!("str.{}", name);
    match name {
        "upper" => {
            arity(&qualified, args, 0, 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            arity(&qualified, args, 0, 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "strip" | "lstrip" | "rstrip" => {
            arity(&qualified, args, 0, 1)?;
            let chars: Option<Vec<char>> = match args.first() {
                None | Some(Value::None) => None,
                Some(v) => Some(to_str(v, &qualified)?.chars().collect()),
            };
            let pred = |c: char| match &chars {
                Some(set) => set.contains(&c),
                None => c.is_whitespace(),
            };
            let out = match name {
                "strip" => s.trim_matches(pred),
                "lstrip" => s.trim_start_matches(pred),
                _ => s.trim_end_matches(pred),
            };
            Ok(Value::Str(out.to_string()))
        }
        "split" => {
            arity(&qualified, args, 0, 1)?;
            let parts: Vec<String> = match args.first() {
                None | Some(Value::None) => s.split_whitespace().map(String::from).collect(),
                Some(v) => {
                    let sep = to_str(v, &qualified)?;
                    if sep.is_empty() {
                        return Err(EvalError::ValueError("empty separator".into()));
                    }
                    s.split(sep).map(String::from).collect()
                }
            };
            Ok(Value::StrArray(parts))
        }
        "splitlines" => {
            arity(&qualified, args, 0, 0)?;
            Ok(Value::StrArray(s.lines().map(String::from).collect()))
        }
        "replace" => {
            arity(&qualified, args, 2, 2)?;
            let old = to_str(&args[0], &qualified)?;
            let new = to_str(&args[1], &qualified)?;
            Ok(Value::Str(s.replace(old, new)))
        }
        "startswith" | "endswith" => {
            arity(&qualified, args, 1, 1)?;
            let affix = to_str(&args[0], &qualified)?;
            let hit = if name == "startswith" { s.starts_with(affix) } else { s.ends_with(affix) };
            Ok(Value::Bool(hit))
        }
        "join" => {
            arity(&qualified, args, 1, 1)?;
            let parts = items(&args[0])?
                .iter()
                .map(|v| match v {
                    Value::Str(p) => Ok(p.clone()),
                    other => Err(type_error("str items to join", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(parts.join(s)))
        }
        "count" => {
            arity(&qualified, args, 1, 1)?;
            let needle = to_str(&args[0], &qualified)?;
            let n = if needle.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(needle).count()
            };
            Ok(Value::Number(n as f64))
        }
        _ => Err(EvalError::NoAttribute { target: "str".into(), name: name.to_string() }),
    }
}

/// Builtin `str(x)`
pub(crate) fn to_string(args: &[Value]) -> Result<Value, EvalError> {
    arity("str", args, 0, 1)?;
    Ok(Value::Str(args.first().map(display_text).unwrap_or_default()))
}

fn parse_float(s: &str) -> Result<f64, EvalError> {
    let t = s.trim();
    match t.to_ascii_lowercase().as_str() {
        "nan" => Ok(f64::NAN),
        "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
        "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
        _ => t
            .parse::<f64>()
            .map_err(|_| {
                EvalError::ValueError(format!("could not convert string to float: '{}'", s))
            }),
    }
}

/// Builtin `float(x)`: parses text, elementwise for string arrays
pub(crate) fn to_float(args: &[Value]) -> Result<Value, EvalError> {
    arity("float", args, 0, 1)?;
    match args.first() {
        None => Ok(Value::Number(0.0)),
        Some(Value::Str(s)) => parse_float(s).map(Value::Number),
        Some(Value::StrArray(items)) => {
            let data = items.iter().map(|s| parse_float(s)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(NdArray::from_vec(data)))
        }
        Some(Value::Number(n)) => Ok(Value::Number(*n)),
        Some(Value::Bool(b)) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Some(other) => {
            let a = to_array(other, "float")?;
            Ok(Value::Array(a.with_dtype(DType::Float)))
        }
    }
}

fn truncate(x: f64) -> Result<f64, EvalError> {
    if !x.is_finite() {
        return Err(EvalError::ValueError(format!("cannot convert float {} to integer", x)));
    }
    Ok(x.trunc())
}

fn parse_int(s: &str) -> Result<f64, EvalError> {
    s.trim()
        .parse::<i64>()
        .map(|n| n as f64)
        .map_err(|_| EvalError::ValueError(format!("invalid literal for int(): '{}'", s)))
}

/// Builtin `int(x)`: truncates toward zero; text must be an integer literal
pub(crate) fn to_int(args: &[Value]) -> Result<Value, EvalError> {
    arity("int", args, 0, 1)?;
    match args.first() {
        None => Ok(Value::Number(0.0)),
        Some(Value::Str(s)) => parse_int(s).map(Value::Number),
        Some(Value::StrArray(items)) => {
            let data = items.iter().map(|s| parse_int(s)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(NdArray::from_vec(data)))
        }
        Some(Value::Bool(b)) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Some(Value::Number(n)) => truncate(*n).map(Value::Number),
        Some(other) => {
            let a = to_array(other, "int")?;
            for x in a.iter() {
                truncate(x)?;
            }
            Ok(Value::Array(NdArray::new(a.values.mapv(f64::trunc), DType::Float)))
        }
    }
}

/// `x.astype(t)` where `t` is `int`, `float`, `bool` or `str`, by name or builtin
pub(crate) fn astype(v: Value, target: &Value) -> Result<Value, EvalError> {
    let kind = match target {
        Value::Str(s) => s.as_str(),
        Value::Function(f) => f.as_str(),
        other => return Err(type_error("type name for astype", other)),
    };
    match kind {
        "float" | "float64" | "np.float64" => to_float(&[v]),
        "int" | "int64" | "np.int64" => to_int(&[v]),
        "str" => to_text_array(&v),
        "bool" => match v {
            Value::StrArray(items) => Ok(Value::Array(NdArray::from_bools(
                items.iter().map(|s| !s.is_empty()).collect(),
            ))),
            other => match super::helpers::as_operand(&other) {
                Some(a) => {
                    let a = a.with_dtype(DType::Bool);
                    Ok(super::ops::wrap(a.values, DType::Bool))
                }
                None => Ok(Value::Bool(truthy(&other)?)),
            },
        },
        other => Err(EvalError::ValueError(format!("data type '{}' not understood", other))),
    }
}

/// Builtin `json(x)`: compact JSON text
pub(crate) fn json(args: &[Value]) -> Result<Value, EvalError> {
    arity("json", args, 1, 1)?;
    Ok(Value::Str(value_to_json(&args[0]).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn split_and_join() {
        assert_eq!(
            method("a,b,,c", "split", &[s(",")]).unwrap(),
            Value::StrArray(vec!["a".into(), "b".into(), "".into(), "c".into()])
        );
        assert_eq!(
            method("  a  b ", "split", &[]).unwrap(),
            Value::StrArray(vec!["a".into(), "b".into()])
        );
        let parts = Value::StrArray(vec!["x".into(), "y".into()]);
        assert_eq!(method("-", "join", &[parts]).unwrap(), s("x-y"));
    }

    #[test]
    fn strip_with_chars() {
        assert_eq!(method("  hi\n", "strip", &[]).unwrap(), s("hi"));
        assert_eq!(method("xxhixx", "lstrip", &[s("x")]).unwrap(), s("hixx"));
    }

    #[test]
    fn unknown_method() {
        assert!(matches!(method("a", "frobnicate", &[]), Err(EvalError::NoAttribute { .. })));
    }

    #[test]
    fn float_parses_lines() {
        let lines = Value::StrArray(vec!["1.5".into(), " 2 ".into()]);
        assert_eq!(to_float(&[lines]).unwrap(), Value::Array(NdArray::from_vec(vec![1.5, 2.0])));
        assert!(matches!(to_float(&[s("abc")]), Err(EvalError::ValueError(_))));
    }

    #[test]
    fn int_truncates() {
        assert_eq!(to_int(&[Value::Number(-2.7)]).unwrap(), Value::Number(-2.0));
        assert_eq!(to_int(&[s("42")]).unwrap(), Value::Number(42.0));
        assert!(to_int(&[s("4.2")]).is_err());
        assert!(to_int(&[Value::Number(f64::NAN)]).is_err());
    }

    #[test]
    fn astype_by_builtin() {
        let d = Value::Array(NdArray::from_vec(vec![1.9, 0.0]));
        assert_eq!(
            astype(d.clone(), &Value::Function("int".into())).unwrap(),
            Value::Array(NdArray::from_vec(vec![1.0, 0.0]))
        );
        assert_eq!(
            astype(d.clone(), &s("bool")).unwrap(),
            Value::Array(NdArray::from_bools(vec![true, false]))
        );
        assert_eq!(astype(d, &s("str")).unwrap(), Value::StrArray(vec!["1.9".into(), "0".into()]));
    }

    #[test]
    fn json_text() {
        let d = Value::List(vec![Value::Number(1.0), s("a"), Value::None]);
        assert_eq!(json(&[d]).unwrap(), s(r#"[1,"a",null]"#));
    }
}
