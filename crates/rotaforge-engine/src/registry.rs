//! Constraint Registry: validated constraint records and their lifecycle.

use std::collections::BTreeSet;

use rotaforge_core::{Result, RotaForgeError, Translator};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::instance::ModelInstance;
use crate::validator::{ConstraintValidator, ValidationOutcome};

/// A natural-language constraint with its validated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    text: String,
    code: String,
    is_active: bool,
    generated_identifiers: BTreeSet<String>,
}

impl ConstraintRecord {
    fn from_outcome(outcome: ValidationOutcome, is_active: bool) -> Self {
        Self {
            text: outcome.text,
            code: outcome.code,
            is_active,
            generated_identifiers: outcome.generated_identifiers,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Identifiers from the last successful validation or commit.
    pub fn generated_identifiers(&self) -> &BTreeSet<String> {
        &self.generated_identifiers
    }
}

/// Result of committing one record to a live instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Code ran against the live instance and added these identifiers.
    Committed(BTreeSet<String>),
    /// The record is toggled off.
    Inactive,
    /// Code validated earlier but failed against the live instance.
    Mismatch(String),
    /// No record has this text.
    Unknown,
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed(_))
    }

    pub fn into_result(self, text: &str) -> Result<BTreeSet<String>> {
        match self {
            CommitOutcome::Committed(ids) => Ok(ids),
            CommitOutcome::Inactive => Err(RotaForgeError::InvalidState(format!(
                "constraint '{}' is inactive",
                text
            ))),
            CommitOutcome::Mismatch(reason) => Err(RotaForgeError::CommitMismatch {
                text: text.to_string(),
                reason,
            }),
            CommitOutcome::Unknown => Err(RotaForgeError::UnknownConstraint(text.to_string())),
        }
    }
}

/// What a replay committed and what it skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub generation: u64,
    /// Texts committed, in registry order.
    pub committed: Vec<String>,
    /// `(text, reason)` for every active record whose commit failed.
    pub failed: Vec<(String, String)>,
    /// Records skipped because they are inactive.
    pub inactive: usize,
}

impl ReplaySummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered store of constraint records keyed by text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRegistry {
    records: Vec<ConstraintRecord>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validated phrase as an active record.
    pub fn add(&mut self, outcome: ValidationOutcome) -> Result<&ConstraintRecord> {
        if self.position(&outcome.text).is_some() {
            return Err(RotaForgeError::DuplicateConstraint(outcome.text));
        }
        self.records.push(ConstraintRecord::from_outcome(outcome, true));
        let idx = self.records.len() - 1;
        Ok(&self.records[idx])
    }

    /// Runs the stored code of `text` against the live instance.
    ///
    /// Failures are returned as outcomes. A mismatch leaves the record active.
    pub fn commit(&mut self, text: &str, instance: &mut ModelInstance) -> CommitOutcome {
        let Some(idx) = self.position(text) else {
            return CommitOutcome::Unknown;
        };
        let record = &mut self.records[idx];
        if !record.is_active {
            return CommitOutcome::Inactive;
        }
        match instance.commit(&record.text, &record.code) {
            Ok(ids) => {
                info!(
                    event = "commit",
                    text = %record.text,
                    generation = instance.generation(),
                    identifiers = ids.len(),
                );
                record.generated_identifiers = ids.clone();
                CommitOutcome::Committed(ids)
            }
            Err(e) => {
                warn!(
                    event = "commit_mismatch",
                    text = %record.text,
                    generation = instance.generation(),
                    error = %e,
                );
                CommitOutcome::Mismatch(e.to_string())
            }
        }
    }

    /// Commits every active record in order. One failing record never stops the
    /// others.
    pub fn replay(&mut self, instance: &mut ModelInstance) -> ReplaySummary {
        let mut summary = ReplaySummary {
            generation: instance.generation(),
            ..ReplaySummary::default()
        };
        let texts: Vec<String> = self.records.iter().map(|r| r.text.clone()).collect();
        for text in texts {
            match self.commit(&text, instance) {
                CommitOutcome::Committed(_) => summary.committed.push(text),
                CommitOutcome::Inactive => summary.inactive += 1,
                CommitOutcome::Mismatch(reason) => summary.failed.push((text, reason)),
                CommitOutcome::Unknown => {}
            }
        }
        info!(
            event = "replay_end",
            generation = summary.generation,
            committed = summary.committed.len(),
            failed = summary.failed.len(),
            inactive = summary.inactive,
        );
        summary
    }

    /// Replaces the record for `old_text` with a freshly validated `new_text`.
    ///
    /// The new record keeps the old active flag. On any failure the original
    /// record is left exactly as it was.
    pub fn edit(
        &mut self,
        old_text: &str,
        new_text: &str,
        validator: &ConstraintValidator,
        translator: &dyn Translator,
    ) -> Result<&ConstraintRecord> {
        let idx = self
            .position(old_text)
            .ok_or_else(|| RotaForgeError::UnknownConstraint(old_text.to_string()))?;
        if new_text != old_text && self.position(new_text).is_some() {
            return Err(RotaForgeError::DuplicateConstraint(new_text.to_string()));
        }

        let outcome = validator.validate_phrase(new_text, translator)?;
        let is_active = self.records[idx].is_active;
        self.records[idx] = ConstraintRecord::from_outcome(outcome, is_active);
        info!(old = %old_text, new = %new_text, "constraint edited");
        Ok(&self.records[idx])
    }

    /// Sets the active flag. Code and identifiers are untouched.
    pub fn toggle(&mut self, text: &str, active: bool) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.text == text)
            .ok_or_else(|| RotaForgeError::UnknownConstraint(text.to_string()))?;
        record.is_active = active;
        Ok(())
    }

    /// Removes the record. A live model keeps its constraints until the next rebuild.
    pub fn delete(&mut self, text: &str) -> Result<ConstraintRecord> {
        let idx = self
            .position(text)
            .ok_or_else(|| RotaForgeError::UnknownConstraint(text.to_string()))?;
        Ok(self.records.remove(idx))
    }

    pub fn get(&self, text: &str) -> Option<&ConstraintRecord> {
        self.records.iter().find(|r| r.text == text)
    }

    pub fn records(&self) -> &[ConstraintRecord] {
        &self.records
    }

    pub fn active(&self) -> impl Iterator<Item = &ConstraintRecord> {
        self.records.iter().filter(|r| r.is_active)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, text: &str) -> Option<usize> {
        self.records.iter().position(|r| r.text == text)
    }
}
