//! Invocation-level errors
//!
//! Each pipeline stage has its own error type; `Error` wraps them so
//! `main` can report which stage failed.

use crate::chain::EvaluationError;
use crate::format::FormatError;
use crate::source::SourceError;
use thiserror::Error;

/// Contradictory or malformed options, found before any input is read
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("at most one output mode may be given, got {0} and {1}")]
    ConflictingOutputModes(&'static str, &'static str),
    #[error("missing expression")]
    MissingExpression,
    #[error("option {0} needs a value")]
    MissingValue(String),
    #[error("unknown option: {0}")]
    UnknownFlag(String),
    #[error("unknown input format '{0}' (expected auto, lines, str, csv or pandas)")]
    UnknownInputFormat(String),
    #[error("unknown element format '{0}' (expected default, str, int, float, .N or %.Nf)")]
    UnknownElementFormat(String),
    #[error("no module named '{0}'")]
    UnknownModule(String),
    #[error("invalid source name '{0}': expected NAME=SOURCE with NAME an identifier")]
    InvalidSourceName(String),
    #[error("invalid source '{0}'")]
    InvalidSource(String),
    #[error("stdin ('-') may be given as a source only once")]
    RepeatedStdin,
    #[error("an expression chain needs at least one expression")]
    EmptyChain,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("writing output: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short name of the failing stage, used in the error line
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Source(_) => "source",
            Error::Evaluation(_) => "evaluation",
            Error::Format(_) => "format",
            Error::Io(_) => "output",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        let err: Error = ConfigError::EmptyChain.into();
        assert_eq!(err.stage(), "config");
        assert_eq!(err.to_string(), "an expression chain needs at least one expression");
    }
}
