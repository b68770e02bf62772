//! Constraint Validator: the translate-validate-retry loop.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::{Result, RotaForgeError, Translator};
use rotaforge_expr::Mode;
use serde::Serialize;
use tracing::{info, warn};

use crate::factory::VariableFactory;
use crate::instance::ModelInstance;

/// Header placed between the phrase and the error text on resubmission.
pub const RETRY_PROMPT: &str = "The previous code failed with error:";

/// Builds the phrase sent to the translator after a failed attempt.
pub fn retry_phrase(text: &str, error: &str) -> String {
    format!("{}\n\n{}\n{}", text, RETRY_PROMPT, error)
}

/// Result of running candidate code against a disposable instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    pub generated_identifiers: BTreeSet<String>,
    pub error: Option<String>,
}

impl ValidationResult {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            generated_identifiers: BTreeSet::new(),
            error: Some(error),
        }
    }
}

/// A phrase whose code has been validated.
///
/// Only the validator creates these, so a registry record always carries code
/// that ran successfully at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub(crate) text: String,
    pub(crate) code: String,
    pub(crate) generated_identifiers: BTreeSet<String>,
    pub(crate) attempts: u32,
    pub(crate) repaired: bool,
}

impl ValidationOutcome {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn generated_identifiers(&self) -> &BTreeSet<String> {
        &self.generated_identifiers
    }

    /// Translation attempts used, starting at 1.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True when the accepted code came from a resubmission carrying error text.
    ///
    /// Such code may no longer mean what the phrase says and deserves review.
    pub fn repaired(&self) -> bool {
        self.repaired
    }
}

/// Decides whether a failed phrase may be resubmitted to the translator.
pub trait ResubmitApproval: Send + Sync {
    /// `attempt` is the number of the attempt that just failed.
    fn approve(&self, phrase: &str, error: &str, attempt: u32) -> bool;
}

impl<F> ResubmitApproval for F
where
    F: Fn(&str, &str, u32) -> bool + Send + Sync,
{
    fn approve(&self, phrase: &str, error: &str, attempt: u32) -> bool {
        self(phrase, error, attempt)
    }
}

/// Validates constraint code against disposable model instances.
#[derive(Clone)]
pub struct ConstraintValidator {
    factory: Arc<VariableFactory>,
    max_attempts: u32,
    confirm_resubmission: bool,
    approval: Option<Arc<dyn ResubmitApproval>>,
}

impl fmt::Debug for ConstraintValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintValidator")
            .field("max_attempts", &self.max_attempts)
            .field("confirm_resubmission", &self.confirm_resubmission)
            .field("has_approval", &self.approval.is_some())
            .finish()
    }
}

impl ConstraintValidator {
    pub fn new(factory: Arc<VariableFactory>, config: &EngineConfig) -> Self {
        Self {
            factory,
            max_attempts: config.validation.max_attempts.max(1),
            confirm_resubmission: config.validation.confirm_resubmission,
            approval: None,
        }
    }

    /// Installs the hook consulted before resubmissions.
    pub fn with_approval(mut self, approval: Arc<dyn ResubmitApproval>) -> Self {
        self.approval = Some(approval);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `code` against a fresh instance and reports the constraints it adds.
    pub fn validate(&self, text: &str, code: &str) -> ValidationResult {
        let mut instance = match ModelInstance::ephemeral(Arc::clone(&self.factory)) {
            Ok(instance) => instance,
            Err(e) => return ValidationResult::failed(e.to_string()),
        };
        match instance.execute(code, Mode::Constraint) {
            Ok(ids) => ValidationResult {
                success: true,
                generated_identifiers: ids,
                error: None,
            },
            Err(e) => {
                warn!(text = %text, error = %e, "candidate code failed");
                ValidationResult::failed(e.to_string())
            }
        }
    }

    /// Translates `text` and validates the code, retrying with the error text
    /// appended until an attempt succeeds or `max_attempts` is reached.
    ///
    /// A translator failure ends the loop with [`RotaForgeError::Translation`].
    pub fn validate_phrase(&self, text: &str, translator: &dyn Translator) -> Result<ValidationOutcome> {
        let spec = self.factory.spec();
        let mut request = text.to_string();
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            info!(
                event = "validation_attempt",
                text = %text,
                attempt,
                max_attempts = self.max_attempts,
            );
            let code = translator.translate(&request, spec)?;
            let result = self.validate(text, &code);
            if result.success {
                return Ok(ValidationOutcome {
                    text: text.to_string(),
                    code,
                    generated_identifiers: result.generated_identifiers,
                    attempts: attempt,
                    repaired: attempt > 1,
                });
            }

            last_error = result.error.unwrap_or_default();
            if attempt == self.max_attempts {
                break;
            }
            if self.confirm_resubmission && !self.approved(text, &last_error, attempt) {
                warn!(
                    event = "validation_exhausted",
                    text = %text,
                    attempts = attempt,
                    reason = "resubmission refused",
                );
                return Err(RotaForgeError::ValidationExhausted {
                    attempts: attempt,
                    last_error,
                });
            }
            info!(event = "validation_retry", text = %text, attempt, error = %last_error);
            request = retry_phrase(text, &last_error);
        }

        warn!(
            event = "validation_exhausted",
            text = %text,
            attempts = self.max_attempts,
            error = %last_error,
        );
        Err(RotaForgeError::ValidationExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    fn approved(&self, text: &str, error: &str, attempt: u32) -> bool {
        self.approval
            .as_ref()
            .is_some_and(|hook| hook.approve(text, error, attempt))
    }
}
