//! The `random` module, backed by the evaluator's `StdRng`

use super::helpers::{arity, checked_size, rows, to_f64, to_i64, to_usize, type_error};
use super::index::items;
use super::{EvalError, Evaluator};
use crate::ast::{DType, NdArray, Value};
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Optional trailing size argument: a count or a shape
fn size_arg(v: Option<&Value>) -> Result<Option<Vec<usize>>, EvalError> {
    match v {
        None | Some(Value::None) => Ok(None),
        Some(Value::List(dims)) => {
            dims.iter().map(|d| to_usize(d, "size")).collect::<Result<_, _>>().map(Some)
        }
        Some(Value::Array(a)) if a.ndim() == 1 => a
            .iter()
            .map(|d| to_usize(&Value::Number(d), "size"))
            .collect::<Result<_, _>>()
            .map(Some),
        Some(other) => Ok(Some(vec![to_usize(other, "size")?])),
    }
}

/// Draw one sample per element of `shape`, or a single scalar
fn sample(shape: Option<Vec<usize>>, mut draw: impl FnMut() -> f64) -> Result<Value, EvalError> {
    match shape {
        None => Ok(Value::Number(draw())),
        Some(shape) => {
            checked_size(&shape)?;
            let values = ArrayD::from_shape_simple_fn(IxDyn(&shape), draw);
            Ok(Value::Array(NdArray::new(values, DType::Float)))
        }
    }
}

impl Evaluator {
    pub(crate) fn random_call(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let qualified = format!("random.{}", name);
        let rng = &mut self.rng;
        match name {
            "random" | "rand" => {
                arity(&qualified, args, 0, 1)?;
                let shape = size_arg(args.first())?;
                sample(shape, || rng.random::<f64>())
            }
            "uniform" => {
                arity(&qualified, args, 0, 3)?;
                let lo = args.first().map(|v| to_f64(v, &qualified)).transpose()?.unwrap_or(0.0);
                let hi = args.get(1).map(|v| to_f64(v, &qualified)).transpose()?.unwrap_or(1.0);
                let shape = size_arg(args.get(2))?;
                sample(shape, || lo + (hi - lo) * rng.random::<f64>())
            }
            "randint" => {
                arity(&qualified, args, 1, 3)?;
                // A single bound is the exclusive upper limit
                let (lo, hi) = match args.get(1) {
                    Some(Value::None) | None => (0, to_i64(&args[0], &qualified)?),
                    Some(hi) => (to_i64(&args[0], &qualified)?, to_i64(hi, &qualified)?),
                };
                if lo >= hi {
                    return Err(EvalError::ValueError(format!(
                        "{}: low >= high ({} >= {})",
                        qualified, lo, hi
                    )));
                }
                let shape = size_arg(args.get(2))?;
                sample(shape, || rng.random_range(lo..hi) as f64)
            }
            "normal" | "gauss" => {
                arity(&qualified, args, 0, 3)?;
                let mu = args.first().map(|v| to_f64(v, &qualified)).transpose()?.unwrap_or(0.0);
                let sigma = args.get(1).map(|v| to_f64(v, &qualified)).transpose()?.unwrap_or(1.0);
                if sigma < 0.0 {
                    return Err(EvalError::ValueError(format!(
                        "{}: scale must be non-negative",
                        qualified
                    )));
                }
                let shape = size_arg(args.get(2))?;
                // Box-Muller; 1 - u keeps the logarithm finite
                sample(shape, || {
                    let u1: f64 = 1.0 - rng.random::<f64>();
                    let u2: f64 = rng.random();
                    mu + sigma * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
                })
            }
            "choice" => {
                arity(&qualified, args, 1, 2)?;
                let pool = match &args[0] {
                    Value::Number(_) => {
                        let n = to_usize(&args[0], &qualified)?;
                        (0..n).map(|i| Value::Number(i as f64)).collect()
                    }
                    other => items(other)?,
                };
                if pool.is_empty() {
                    return Err(EvalError::ValueError(format!(
                        "{}: cannot choose from an empty sequence",
                        qualified
                    )));
                }
                match args.get(1) {
                    None => Ok(pool[rng.random_range(0..pool.len())].clone()),
                    Some(n) => {
                        let n = to_usize(n, &qualified)?;
                        let picks =
                            (0..n).map(|_| pool[rng.random_range(0..pool.len())].clone()).collect();
                        Ok(super::array::from_values(picks))
                    }
                }
            }
            "shuffle" | "permutation" => {
                arity(&qualified, args, 1, 1)?;
                match &args[0] {
                    Value::Array(a) if a.ndim() <= 1 => {
                        let mut data = a.to_vec();
                        data.shuffle(rng);
                        Ok(Value::Array(NdArray::from_vec(data).with_dtype(a.dtype)))
                    }
                    Value::Array(a) => {
                        // Rows move as units
                        let mut parts = rows(a);
                        parts.shuffle(rng);
                        Ok(super::array::from_values(parts))
                    }
                    Value::StrArray(items) => {
                        let mut items = items.clone();
                        items.shuffle(rng);
                        Ok(Value::StrArray(items))
                    }
                    Value::List(items) => {
                        let mut items = items.clone();
                        items.shuffle(rng);
                        Ok(Value::List(items))
                    }
                    Value::Number(_) => {
                        let n = to_usize(&args[0], &qualified)?;
                        let mut data: Vec<f64> = (0..n).map(|i| i as f64).collect();
                        data.shuffle(rng);
                        Ok(Value::Array(NdArray::from_vec(data)))
                    }
                    other => Err(type_error("sequence to shuffle", other)),
                }
            }
            "seed" => {
                arity(&qualified, args, 1, 1)?;
                let seed = to_i64(&args[0], &qualified)?;
                log::debug!("random seed {}", seed);
                self.rng = StdRng::seed_from_u64(seed as u64);
                Ok(Value::None)
            }
            _ => Err(EvalError::UnknownFunction(qualified)),
        }
    }
}
