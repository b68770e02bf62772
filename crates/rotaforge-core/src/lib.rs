//! RotaForge Core - shared types for the constraint lifecycle engine
//!
//! This crate provides the vocabulary every other RotaForge crate speaks:
//! - [`ProblemSpecification`]: the immutable planning problem (horizon, entity lists,
//!   resource capacities, variable schema and objective source)
//! - [`VarKey`]: index tuples addressing decision variables
//! - [`SolveStatus`]: the status of a model instance
//! - [`RotaForgeError`]: the engine error taxonomy
//! - [`Translator`]: the seam to the external phrase-to-code translation service

pub mod error;
pub mod key;
pub mod spec;
pub mod status;
pub mod translate;

pub use error::{Result, RotaForgeError, TranslationError};
pub use key::{KeyPart, VarKey};
pub use spec::{Horizon, ProblemSpecification, SpecificationInput, VariablesInput, RESERVED_SYMBOLS};
pub use status::SolveStatus;
pub use translate::Translator;
