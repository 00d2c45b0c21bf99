//! Library namespaces and call dispatch
//!
//! `np`, `math` and `random` are the only modules. Each has a fixed list of
//! function names; `np.sum` evaluates to `Value::Function("np.sum")`, and
//! calling that routes back through `call_function`.

use super::helpers::{arity, type_error};
use super::{array, math, stats, string, table, EvalError, Evaluator};
use crate::ast::{NdArray, Value};

/// Functions visible without a module prefix
pub const BUILTINS: &[&str] = &[
    "len", "str", "float", "int", "abs", "round", "sum", "min", "max", "sorted", "list", "range",
    "json",
];

const NP_FUNCTIONS: &[&str] = &[
    "array", "asarray", "arange", "linspace", "zeros", "ones", "sum", "prod", "mean", "median",
    "std", "var", "min", "max", "argmin", "argmax", "count_nonzero", "all", "any", "cumsum",
    "cumprod", "percentile", "abs", "absolute", "sqrt", "exp", "log", "log10", "log2", "sin",
    "cos", "tan", "floor", "ceil", "trunc", "sign", "round", "around", "clip", "power", "maximum",
    "minimum", "isnan", "isinf", "isfinite", "sort", "unique", "diff", "dot", "concatenate",
    "where", "reshape", "transpose", "flatten", "ravel", "flip",
];

const MATH_FUNCTIONS: &[&str] = &[
    "sqrt", "exp", "log", "log10", "log2", "sin", "cos", "tan", "floor", "ceil", "fabs", "trunc",
    "pow", "isnan", "isinf", "isfinite",
];

const RANDOM_FUNCTIONS: &[&str] = &[
    "random", "rand", "uniform", "randint", "normal", "gauss", "choice", "shuffle", "permutation",
    "seed",
];

/// Resolve an import to the name it binds and its module value.
///
/// A dotted name binds its root, so `numpy.linalg` binds `numpy`.
pub fn resolve_module(name: &str) -> Option<(String, Value)> {
    let root = name.split('.').next()?;
    let module = match root {
        "np" | "numpy" => "np",
        "math" => "math",
        "random" => "random",
        _ => return None,
    };
    Some((root.to_string(), Value::Module(module.to_string())))
}

fn constant(module: &str, name: &str) -> Option<f64> {
    let value = match (module, name) {
        ("np" | "math", "pi") => std::f64::consts::PI,
        ("np" | "math", "e") => std::f64::consts::E,
        ("np" | "math", "inf") => f64::INFINITY,
        ("np" | "math", "nan") => f64::NAN,
        ("math", "tau") => std::f64::consts::TAU,
        _ => return None,
    };
    Some(value)
}

/// `module.name` as a value
pub(crate) fn module_attribute(module: &str, name: &str) -> Result<Value, EvalError> {
    if let Some(x) = constant(module, name) {
        return Ok(Value::Number(x));
    }
    let functions: &[&str] = match module {
        "np" if name == "random" => return Ok(Value::Module("random".into())),
        "np" => NP_FUNCTIONS,
        "math" => MATH_FUNCTIONS,
        "random" => RANDOM_FUNCTIONS,
        _ => &[],
    };
    if functions.contains(&name) {
        return Ok(Value::Function(format!("{}.{}", module, name)));
    }
    Err(EvalError::NoAttribute { target: format!("module {}", module), name: name.to_string() })
}

fn shape_value(shape: &[usize]) -> Value {
    Value::Array(NdArray::from_vec(shape.iter().map(|&d| d as f64).collect()))
}

impl Evaluator {
    pub(crate) fn get_attribute(&self, target: Value, name: &str) -> Result<Value, EvalError> {
        match (&target, name) {
            (Value::Module(m), _) => module_attribute(m, name),
            (Value::Array(a), "shape") => Ok(shape_value(a.shape())),
            (Value::Array(a), "size") => Ok(Value::Number(a.size() as f64)),
            (Value::Array(a), "ndim") => Ok(Value::Number(a.ndim() as f64)),
            (Value::Array(a), "dtype") => Ok(Value::Str(a.dtype.name().to_string())),
            (Value::Array(_), "T") => array::transpose(&target),
            (Value::StrArray(items), "shape") => Ok(shape_value(&[items.len()])),
            (Value::StrArray(items), "size") => Ok(Value::Number(items.len() as f64)),
            (Value::StrArray(_), "ndim") => Ok(Value::Number(1.0)),
            (Value::StrArray(_), "dtype") => Ok(Value::Str("str".into())),
            (Value::StrArray(_), "T") => Ok(target.clone()),
            (Value::Table(t), _) => table::attribute(t, name),
            _ => Err(EvalError::NoAttribute {
                target: target.type_name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// `receiver.name(args)` for non-module receivers
    pub(crate) fn call_method(
        &mut self,
        receiver: Value,
        name: &str,
        mut args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        match receiver {
            Value::Str(s) => string::method(&s, name, &args),
            Value::Table(t) => table::method(t, name, &args),
            Value::Array(_) | Value::StrArray(_) | Value::Number(_) | Value::Bool(_) => {
                match name {
                    "reshape" => array::reshape(&receiver, &args),
                    "astype" => {
                        arity("astype", &args, 1, 1)?;
                        string::astype(receiver, &args[0])
                    }
                    "tolist" => {
                        arity("tolist", &args, 0, 0)?;
                        array::tolist(&receiver)
                    }
                    "flatten" | "ravel" | "sort" | "transpose" => {
                        arity(name, &args, 0, 0)?;
                        self.call_function(&format!("np.{}", name), vec![receiver])
                    }
                    "sum" | "prod" | "mean" | "min" | "max" | "std" | "var" | "median" | "argmin"
                    | "argmax" | "cumsum" | "cumprod" | "all" | "any" | "round" | "clip" => {
                        args.insert(0, receiver);
                        self.call_function(&format!("np.{}", name), args)
                    }
                    _ => Err(EvalError::NoAttribute {
                        target: receiver.type_name().to_string(),
                        name: name.to_string(),
                    }),
                }
            }
            other => Err(EvalError::NoAttribute {
                target: other.type_name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Call a builtin (`len`) or a qualified module function (`np.sum`)
    pub(crate) fn call_function(
        &mut self,
        qualified: &str,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        match qualified.split_once('.') {
            Some(("np", name)) => self.call_np(name, args),
            Some(("math", name)) => math::math_call(name, &args),
            Some(("random", name)) => self.random_call(name, &args),
            Some(_) => Err(EvalError::UnknownFunction(qualified.to_string())),
            None => self.call_builtin(qualified, args),
        }
    }

    fn call_np(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        if stats::REDUCTIONS.contains(&name) {
            return stats::reduce(name, &args);
        }
        if let Some(f) = math::unary_fn(name) {
            return math::map_unary(name, &args, f);
        }

        let one = |args: &[Value]| -> Result<Value, EvalError> {
            arity(name, args, 1, 1)?;
            Ok(args[0].clone())
        };
        match name {
            "array" | "asarray" => array::array(&args),
            "arange" => array::arange(name, &args),
            "linspace" => array::linspace(&args),
            "zeros" => array::filled(name, &args, 0.0),
            "ones" => array::filled(name, &args, 1.0),
            "cumsum" | "cumprod" => stats::cumulative(name, &args),
            "percentile" => stats::percentile(&args),
            "round" | "around" => math::round(&args),
            "clip" => math::clip(&args),
            "power" | "maximum" | "minimum" => math::binary_fn(name, &args),
            "isnan" | "isinf" | "isfinite" => math::classify(name, &args),
            "sort" => array::sort(&one(&args)?),
            "unique" => array::unique(&one(&args)?),
            "diff" => array::diff(&one(&args)?),
            "dot" => array::dot(&args),
            "concatenate" => array::concatenate(&args),
            "where" => array::where_(&args),
            "reshape" => match args.split_first() {
                Some((a, shape)) if !shape.is_empty() => array::reshape(a, shape),
                _ => Err(EvalError::Arity {
                    name: "reshape".into(),
                    expected: "2".into(),
                    got: args.len(),
                }),
            },
            "transpose" => array::transpose(&one(&args)?),
            "flatten" | "ravel" => array::flatten(&one(&args)?),
            "flip" => array::flip(&one(&args)?),
            _ => Err(EvalError::UnknownFunction(format!("np.{}", name))),
        }
    }

    fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        match name {
            "len" => array::len(&args),
            "str" => string::to_string(&args),
            "float" => string::to_float(&args),
            "int" => string::to_int(&args),
            "abs" => match args.first() {
                Some(Value::Number(_) | Value::Bool(_) | Value::Array(_)) | None => {
                    math::map_unary("abs", &args, f64::abs)
                }
                Some(other) => Err(type_error("number for abs", other)),
            },
            "round" => math::round(&args),
            "sum" => stats::builtin_sum(&args),
            "min" | "max" => stats::builtin_extreme(name, &args),
            "sorted" => {
                arity(name, &args, 1, 1)?;
                array::sorted(&args[0])
            }
            "list" => {
                arity(name, &args, 1, 1)?;
                array::list(&args[0])
            }
            "range" => array::range(&args),
            "json" => string::json(&args),
            _ => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }
}
