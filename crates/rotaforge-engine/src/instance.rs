//! Model Instance: one solver session with its containers, committed constraints
//! and provenance.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rotaforge_core::{Result, RotaForgeError, SolveStatus};
use rotaforge_expr::{ContainerSet, ExprError, Mode, VarContainer};
use rotaforge_milp::{Model, SolverSettings, Status};
use tracing::debug;

use crate::assignment::Assignment;
use crate::factory::{entity_part, VariableFactory};
use crate::provenance::ProvenanceIndex;

/// A solver session built from the variable schema.
///
/// Owned by exactly one workflow: the live session of a driver, or the disposable
/// copy a validation builds. Never shared.
#[derive(Debug)]
pub struct ModelInstance {
    factory: Arc<VariableFactory>,
    generation: u64,
    model: Model,
    containers: ContainerSet,
    committed: BTreeMap<String, CommittedCode>,
    provenance: ProvenanceIndex,
    status: SolveStatus,
}

/// Code committed for one text in this generation and the identifiers it added.
#[derive(Debug, Clone)]
struct CommittedCode {
    code: String,
    ids: BTreeSet<String>,
}

impl ModelInstance {
    /// Creates a session and declares the schema's containers on it.
    pub fn build(factory: Arc<VariableFactory>, generation: u64, settings: SolverSettings) -> Result<Self> {
        let mut model = Model::with_settings(format!("schedule_g{}", generation), settings);
        let containers = factory.build(&mut model)?;
        Ok(Self {
            factory,
            generation,
            model,
            containers,
            committed: BTreeMap::new(),
            provenance: ProvenanceIndex::new(generation),
            status: SolveStatus::Unsolved,
        })
    }

    /// A disposable instance for validation.
    pub fn ephemeral(factory: Arc<VariableFactory>) -> Result<Self> {
        Self::build(factory, 0, SolverSettings::deterministic())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn containers(&self) -> &ContainerSet {
        &self.containers
    }

    /// The container bound to `x`.
    pub fn primary(&self) -> Result<&VarContainer> {
        self.containers
            .primary()
            .ok_or_else(|| RotaForgeError::Schema("instance has no primary container".into()))
    }

    /// Position of the entity id in primary container keys.
    pub fn entity_part(&self) -> usize {
        entity_part(&self.containers)
    }

    pub fn provenance(&self) -> &ProvenanceIndex {
        &self.provenance
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SolveStatus) {
        self.status = status;
    }

    /// Names of all constraints currently in the session.
    pub fn constraint_ids(&self) -> BTreeSet<String> {
        self.model.constraint_names().map(String::from).collect()
    }

    pub fn is_committed(&self, text: &str) -> bool {
        self.committed.contains_key(text)
    }

    pub fn committed(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.committed.iter().map(|(t, c)| (t.as_str(), &c.ids))
    }

    /// Runs `code` and returns the identifiers of the constraints it added.
    ///
    /// The result is the difference of the identifier sets before and after the
    /// run, so caller-chosen names and multi-constraint statements are both seen.
    /// A failed run leaves the session unchanged.
    pub fn execute(&mut self, code: &str, mode: Mode) -> std::result::Result<BTreeSet<String>, ExprError> {
        let before = self.constraint_ids();
        self.factory
            .sandbox()
            .run(code, mode, &mut self.model, &mut self.containers)?;
        self.status = SolveStatus::Unsolved;
        Ok(self
            .model
            .constraint_names()
            .filter(|name| !before.contains(*name))
            .map(String::from)
            .collect())
    }

    /// Executes constraint code for `text` and records its identifiers.
    ///
    /// Committing the same text with the same code twice in one generation returns
    /// the stored identifiers without running the code again. New code for a text
    /// that was already committed runs and replaces the stored entry.
    pub fn commit(&mut self, text: &str, code: &str) -> std::result::Result<BTreeSet<String>, ExprError> {
        if let Some(done) = self.committed.get(text).filter(|done| done.code == code) {
            return Ok(done.ids.clone());
        }
        let ids = self.execute(code, Mode::Constraint)?;
        for id in &ids {
            self.provenance.insert(id.clone(), text);
        }
        self.committed.insert(
            text.to_string(),
            CommittedCode {
                code: code.to_string(),
                ids: ids.clone(),
            },
        );
        Ok(ids)
    }

    /// Solves the session and records the resulting status.
    pub fn optimize(&mut self) -> Status {
        let status = self.model.optimize();
        self.status = solve_status(status);
        debug!(
            generation = self.generation,
            status = %status,
            elapsed_ms = self.model.stats().elapsed.as_millis() as u64,
            "model optimized"
        );
        status
    }

    /// Keys of the primary container assigned in the last solution.
    pub fn assignment(&self, threshold: f64) -> Option<Assignment> {
        let primary = self.containers.primary()?;
        Assignment::extract(&self.model, primary, threshold, self.entity_part())
    }
}

/// Maps a solver status to the status of a model instance.
pub fn solve_status(status: Status) -> SolveStatus {
    match status {
        Status::Optimal => SolveStatus::Optimal,
        Status::Suboptimal => SolveStatus::Suboptimal,
        Status::Infeasible => SolveStatus::Infeasible,
        Status::Loaded => SolveStatus::Unsolved,
        Status::Unbounded | Status::LimitReached | Status::NumericError => SolveStatus::Error,
    }
}
