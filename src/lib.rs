//! npcli - numpy-style array expressions for shell pipelines
//!
//! # Overview
//!
//! npcli reads text data into arrays, evaluates an expression (or a chain of
//! expressions) against them, and writes the result back as text. It is
//! meant for one-liners:
//!
//! ```text
//! seq 10 | npcli 'd * 2'                 # 2 4 6 ... one per line
//! npcli 'd1 + d2' a.txt b.txt            # elementwise sum of two files
//! seq 5 | npcli 'd * 2' -e 'd.sum()'     # chain: d is the previous result
//! ```
//!
//! # Pipeline
//!
//! 1. **Sources** (`source`): each input is read in full and converted per
//!    the input format (`auto`, `lines`, `str`, `csv`, `pandas`).
//! 2. **Binding** (`binder`): sources become names in a `Scope`. The first
//!    positional source is `d` and `d1`, the next `d2`, and so on.
//! 3. **Evaluation** (`chain`, `eval`): each expression runs against the
//!    scope and its result is rebound to `d` for the next one.
//! 4. **Formatting** (`format`, `display`): the final value is rendered for
//!    the one requested output mode.
//!
//! # Example
//!
//! ```rust
//! use npcli::{Evaluator, NdArray, Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("np", Value::Module("np".into()));
//! scope.set("d", Value::Array(NdArray::from_vec(vec![1.0, 2.0, 3.0])));
//! let mut eval = Evaluator::new();
//! let result = eval.eval_str("np.sum(d * 2)", &mut scope).unwrap();
//! assert_eq!(result, Value::Number(12.0));
//! ```

pub mod ast;
pub mod binder;
pub mod chain;
pub mod display;
pub mod error;
pub mod eval;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod scope;
pub mod source;

// Re-export commonly used items
pub use ast::{DType, Expr, NdArray, Program, Table, Value};
pub use binder::{bind, plan, BindOptions, Binding};
pub use chain::{Chain, Engine, EvaluationError, RenderPlan};
pub use error::{ConfigError, Error};
pub use eval::{EvalError, Evaluator};
pub use format::{format_result, ElementFormat, FormatError, OutputMode};
pub use lexer::{lex, LexError, Token};
pub use parser::{parse, ParseError};
pub use pipeline::{run, Invocation};
pub use scope::Scope;
pub use source::{read_source, InputFormat, InputSpec, Location, SourceError};
