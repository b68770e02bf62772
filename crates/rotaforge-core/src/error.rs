//! Error types for RotaForge

use thiserror::Error;

/// Main error type for RotaForge engine operations.
///
/// `Translation` and `ValidationExhausted` are scoped to a single constraint and
/// never abort the processing of others. `CommitMismatch` leaves the record active
/// for the next rebuild. `Solver` and `RelaxationFailed` end a solve cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RotaForgeError {
    /// Malformed or absent decision variable schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// The translation service failed to produce code
    #[error("Translation error: {0}")]
    Translation(String),

    /// Every validation attempt failed
    #[error("Validation exhausted after {attempts} attempt(s): {last_error}")]
    ValidationExhausted { attempts: u32, last_error: String },

    /// Code validated in the sandbox but failed against the live model
    #[error("Commit mismatch for '{text}': {reason}")]
    CommitMismatch { text: String, reason: String },

    /// The model has no feasible assignment
    #[error("Solver reported an infeasible model")]
    SolverInfeasible,

    /// Non-infeasibility solver failure (numerical breakdown, limits, unboundedness)
    #[error("Solver error: {0}")]
    Solver(String),

    /// The slack-relaxed model could not be solved either
    #[error("Relaxation failed: {0}")]
    RelaxationFailed(String),

    /// No constraint record exists for the given text
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),

    /// A constraint record with the same text already exists
    #[error("Duplicate constraint: {0}")]
    DuplicateConstraint(String),

    /// The problem specification is inconsistent
    #[error("Specification error: {0}")]
    Specification(String),

    /// Engine configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid operation for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Failure reported by the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TranslationError(pub String);

impl TranslationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<TranslationError> for RotaForgeError {
    fn from(err: TranslationError) -> Self {
        RotaForgeError::Translation(err.0)
    }
}

/// Result type alias for RotaForge operations
pub type Result<T> = std::result::Result<T, RotaForgeError>;
