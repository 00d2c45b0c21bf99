//! Expression chain: evaluate expressions in order, feeding each result to
//! the next as `d`
//!
//! `npcli 'd * 2' -e 'd + 1'` is `d = d * 2; d = d + 1; d`. Only `d` is
//! rebound between steps; the numbered source names and anything an
//! expression assigns stay as they are.

use crate::ast::Value;
use crate::binder::{plan, BindOptions};
use crate::error::ConfigError;
use crate::eval::{EvalError, Evaluator};
use crate::lexer::lex;
use crate::parser::parse;
use crate::scope::Scope;
use crate::source::{InputFormat, InputSpec};
use thiserror::Error;

/// Something that can evaluate one expression string against a scope
pub trait Engine {
    fn evaluate(&mut self, source: &str, scope: &mut Scope) -> Result<Value, EvalError>;
}

impl Engine for Evaluator {
    fn evaluate(&mut self, source: &str, scope: &mut Scope) -> Result<Value, EvalError> {
        self.eval_str(source, scope)
    }
}

/// A chain step failed; later steps did not run
#[derive(Error, Debug)]
#[error("expression {} `{expression}`: {cause}", .index + 1)]
pub struct EvaluationError {
    /// Zero-based position in the chain
    pub index: usize,
    pub expression: String,
    #[source]
    pub cause: EvalError,
}

/// What code mode needs to know about the invocation
#[derive(Debug, Clone, Copy)]
pub struct RenderPlan<'a> {
    pub sources: &'a [InputSpec],
    pub format: InputFormat,
    pub options: &'a BindOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    expressions: Vec<String>,
}

impl Chain {
    pub fn new(expressions: Vec<String>) -> Result<Self, ConfigError> {
        if expressions.is_empty() {
            return Err(ConfigError::EmptyChain);
        }
        Ok(Chain { expressions })
    }

    /// Does the first expression read `d` or `data`?
    ///
    /// An expression that does not parse reads nothing; evaluating it
    /// reports the syntax error.
    pub fn reads_data(&self) -> bool {
        let Some(first) = self.expressions.first() else {
            return false;
        };
        match lex(first).map_err(EvalError::from).and_then(|t| parse(t).map_err(EvalError::from)) {
            Ok(program) => {
                let names = program.names();
                names.contains("d") || names.contains("data")
            }
            Err(_) => false,
        }
    }

    pub fn evaluate(
        &self,
        scope: &mut Scope,
        engine: &mut dyn Engine,
    ) -> Result<Value, EvaluationError> {
        let mut last = Value::None;
        for (index, expression) in self.expressions.iter().enumerate() {
            log::debug!("step {}: {}", index + 1, expression);
            let value = engine.evaluate(expression, scope).map_err(|cause| EvaluationError {
                index,
                expression: expression.clone(),
                cause,
            })?;
            log::debug!("step {} result: {}", index + 1, value.summary());
            scope.set("d", value.clone());
            last = value;
        }
        Ok(last)
    }

    /// The program this invocation would run, as text. Nothing is evaluated.
    pub fn render(&self, plan_for: &RenderPlan<'_>) -> String {
        let mut out = String::from("import numpy as np\n");
        for module in &plan_for.options.modules {
            out.push_str(&format!("import {}\n", module));
        }
        if plan_for.options.kitchen_sink {
            let names: Vec<&str> =
                crate::binder::KITCHEN_SINK.iter().map(|(name, _)| *name).collect();
            out.push_str(&format!("# kitchen sink: {}\n", names.join(", ")));
        }

        for binding in plan(plan_for.sources) {
            let spec = &plan_for.sources[binding.index];
            out.push_str(&format!(
                "{} = read({:?}, {:?})\n",
                binding.names.join(" = "),
                spec.location.to_string(),
                plan_for.format.name()
            ));
        }

        for expression in &self.expressions {
            let mut statements = split_statements(expression);
            let last = statements.pop().unwrap_or_default();
            for statement in statements {
                out.push_str(&statement);
                out.push('\n');
            }
            out.push_str(&format!("d = {}\n", last));
        }
        out.push_str("d\n");
        out
    }
}

/// Split an expression into its statements, leaving quoted text and
/// comments alone
fn split_statements(expression: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut comment = false;

    for c in expression.chars() {
        if comment {
            if c == '\n' {
                comment = false;
            } else {
                continue;
            }
        }
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
                continue;
            }
            None => {}
        }
        match c {
            '#' => comment = true,
            ';' | '\n' => {
                let statement = current.trim().to_string();
                if !statement.is_empty() {
                    statements.push(statement);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let statement = current.trim().to_string();
    if !statement.is_empty() {
        statements.push(statement);
    }
    statements
}
