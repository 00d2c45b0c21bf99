//! Evaluator for npcli expressions
//!
//! A tree-walking interpreter over the AST from `parser`. Expressions are
//! evaluated against a `Scope`; statements of the form `name = expr` write
//! back into it. The value of a program is the value of its last statement.
//!
//! # Dispatch
//!
//! Calls resolve in three ways:
//!
//! 1. **Module functions** (`np.sum(d)`, `random.seed(1)`): the callee is an
//!    attribute of a `Value::Module`, dispatched by qualified name in
//!    `call_function()`.
//! 2. **Methods** (`d.sum()`, `s.split(',')`): the callee is an attribute of
//!    any other value, dispatched on the receiver type in `call_method()`.
//! 3. **Builtins and function values** (`len(d)`, `f = np.mean; f(d)`):
//!    the callee evaluates to a `Value::Function`.
//!
//! The single source of truth for which names exist is the tables in
//! `modules.rs`.

mod array;
mod helpers;
mod index;
mod math;
mod modules;
mod ops;
mod random;
mod stats;
mod string;
mod table;
mod tests;

pub use modules::{resolve_module, BUILTINS};

use crate::ast::{BoolOp, Expr, Program, Stmt, UnaryOp, Value};
use crate::lexer::{lex, LexError};
use crate::parser::{parse, ParseError};
use crate::scope::Scope;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },
    #[error(
        "Shape mismatch: operands with shapes {left:?} and {right:?} cannot be broadcast together"
    )]
    Shape { left: Vec<usize>, right: Vec<usize> },
    #[error("Index {index} is out of bounds for axis with size {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("'{target}' has no attribute '{name}'")]
    NoAttribute { target: String, name: String },
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("{name}() takes {expected} argument(s) but {got} were given")]
    Arity { name: String, expected: String, got: usize },
    #[error("Value error: {0}")]
    ValueError(String),
    #[error("Shape error: {0}")]
    Layout(#[from] ndarray::ShapeError),
}

/// The interpreter. Holds only the random number generator; all variable
/// state lives in the `Scope` passed to each call.
pub struct Evaluator {
    pub(crate) rng: StdRng,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator { rng: StdRng::from_os_rng() }
    }

    /// An evaluator whose `random` module is deterministic
    pub fn with_seed(seed: u64) -> Self {
        Evaluator { rng: StdRng::seed_from_u64(seed) }
    }

    /// Lex, parse and evaluate a source string
    pub fn eval_str(&mut self, source: &str, scope: &mut Scope) -> Result<Value, EvalError> {
        let tokens = lex(source)?;
        let program = parse(tokens)?;
        self.eval_program(&program, scope)
    }

    /// Run every statement; the last one supplies the result.
    ///
    /// For a trailing assignment the result is the assigned value.
    pub fn eval_program(
        &mut self,
        program: &Program,
        scope: &mut Scope,
    ) -> Result<Value, EvalError> {
        let mut last = Value::None;
        for stmt in &program.statements {
            last = match stmt {
                Stmt::Expr(expr) => self.eval_expr(expr, scope)?,
                Stmt::Assign { name, value } => {
                    let v = self.eval_expr(value, scope)?;
                    log::debug!("assign {} = {}", name, v.summary());
                    scope.set(name.clone(), v.clone());
                    v
                }
            };
        }
        Ok(last)
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Name(name) => self.lookup(name, scope),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(array::from_values(values))
            }
            Expr::Unary { op: UnaryOp::Not, operand } => {
                let v = self.eval_expr(operand, scope)?;
                Ok(Value::Bool(!helpers::truthy(&v)?))
            }
            Expr::Unary { op, operand } => {
                let v = self.eval_expr(operand, scope)?;
                ops::unary(*op, v)
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                ops::binary(*op, l, r)
            }
            Expr::Logical { op, left, right } => {
                // Short-circuit, returning the deciding operand
                let l = self.eval_expr(left, scope)?;
                let l_true = helpers::truthy(&l)?;
                match (op, l_true) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(l),
                    _ => self.eval_expr(right, scope),
                }
            }
            Expr::Attribute { value, name } => {
                let target = self.eval_expr(value, scope)?;
                self.get_attribute(target, name)
            }
            Expr::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|e| self.eval_expr(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;

                if let Expr::Attribute { value, name } = func.as_ref() {
                    let receiver = self.eval_expr(value, scope)?;
                    return match receiver {
                        Value::Module(module) => {
                            self.call_function(&format!("{}.{}", module, name), args)
                        }
                        other => self.call_method(other, name, args),
                    };
                }

                match self.eval_expr(func, scope)? {
                    Value::Function(qualified) => self.call_function(&qualified, args),
                    other => Err(EvalError::TypeError {
                        expected: "callable".into(),
                        got: other.type_name().into(),
                    }),
                }
            }
            Expr::Index { value, index } => {
                let target = self.eval_expr(value, scope)?;
                let selectors = index
                    .iter()
                    .map(|part| self.eval_selector(part, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                index::select(target, &selectors)
            }
        }
    }

    /// Scope bindings shadow builtins
    fn lookup(&self, name: &str, scope: &Scope) -> Result<Value, EvalError> {
        if let Some(v) = scope.get(name) {
            return Ok(v.clone());
        }
        if BUILTINS.contains(&name) {
            return Ok(Value::Function(name.to_string()));
        }
        Err(EvalError::UndefinedName(name.to_string()))
    }
}
