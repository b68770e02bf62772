//! Errors of the expression language.

use thiserror::Error;

/// A lexing, parsing or evaluation failure.
///
/// The `Display` text is complete enough to be handed back to the code author.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("error at line {line}: {message}")]
    Eval { line: usize, message: String },

    #[error("evaluation exceeded the step budget of {0}")]
    StepLimit(u64),

    #[error("program added more than {0} constraints")]
    ConstraintLimit(usize),
}

impl ExprError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        ExprError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn eval(line: usize, message: impl Into<String>) -> Self {
        ExprError::Eval {
            line,
            message: message.into(),
        }
    }

    /// Source line of the failure, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            ExprError::Syntax { line, .. } | ExprError::Eval { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type ExprResult<T> = std::result::Result<T, ExprError>;
