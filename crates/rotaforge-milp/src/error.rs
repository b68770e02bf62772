//! Error types for solver sessions.

use thiserror::Error;

/// Errors raised while building or querying a [`Model`](crate::Model).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("variable '{0}' already exists")]
    DuplicateVariable(String),

    #[error("constraint '{0}' already exists")]
    DuplicateConstraint(String),

    #[error("variable index {0} does not belong to this model")]
    UnknownVariable(usize),

    #[error("invalid bounds [{lower}, {upper}] for variable '{name}'")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    #[error("non-finite coefficient in {0}")]
    NonFinite(String),

    #[error("conflict analysis requires an infeasible model (status: {0})")]
    NotInfeasible(String),
}
