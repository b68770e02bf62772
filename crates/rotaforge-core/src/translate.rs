//! The translation service seam.

use std::sync::Arc;

use crate::error::TranslationError;
use crate::spec::ProblemSpecification;

/// Turns a natural-language constraint phrase into constraint code.
///
/// Implementations may be nondeterministic and are called again with the phrase
/// followed by the previous failure when generated code does not validate.
pub trait Translator: Send + Sync {
    fn translate(&self, phrase: &str, spec: &ProblemSpecification) -> Result<String, TranslationError>;
}

impl<T: Translator + ?Sized> Translator for &T {
    fn translate(&self, phrase: &str, spec: &ProblemSpecification) -> Result<String, TranslationError> {
        (**self).translate(phrase, spec)
    }
}

impl<T: Translator + ?Sized> Translator for Arc<T> {
    fn translate(&self, phrase: &str, spec: &ProblemSpecification) -> Result<String, TranslationError> {
        (**self).translate(phrase, spec)
    }
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn translate(&self, phrase: &str, spec: &ProblemSpecification) -> Result<String, TranslationError> {
        (**self).translate(phrase, spec)
    }
}
