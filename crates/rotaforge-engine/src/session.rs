//! Schedule sessions: the explicit context of one interactive schedule.

use std::fmt;
use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::{ProblemSpecification, Result, RotaForgeError, SpecificationInput, Translator};
use rotaforge_expr::Limits;
use serde::Serialize;
use tracing::info;

use crate::driver::{DriverState, OptimizerDriver, SolveReport};
use crate::export::{ResultExporter, ScheduleTable, TableExporter};
use crate::factory::VariableFactory;
use crate::registry::{CommitOutcome, ConstraintRecord, ConstraintRegistry};
use crate::validator::{ConstraintValidator, ResubmitApproval};

/// Result of adding a phrase to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub record: ConstraintRecord,
    pub attempts: u32,
    /// The accepted code came from a resubmission with error text.
    pub repaired: bool,
    /// Identifiers committed to the live model, when one exists.
    pub committed: Option<Vec<String>>,
    /// Live commit failure, kept as a warning. The record stays registered.
    pub mismatch: Option<String>,
}

/// One schedule: specification, configuration, translator, registry and driver.
pub struct ScheduleSession {
    factory: Arc<VariableFactory>,
    translator: Arc<dyn Translator>,
    validator: ConstraintValidator,
    registry: ConstraintRegistry,
    driver: OptimizerDriver,
    last_report: Option<SolveReport>,
}

impl fmt::Debug for ScheduleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleSession")
            .field("records", &self.registry.len())
            .field("state", &self.driver.state())
            .field("generation", &self.driver.generation())
            .finish()
    }
}

impl ScheduleSession {
    pub fn new(spec: ProblemSpecification, config: EngineConfig, translator: Arc<dyn Translator>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RotaForgeError::Config(e.to_string()))?;
        let limits = Limits {
            max_steps: config.sandbox.max_steps,
            max_constraints: config.sandbox.max_constraints,
        };
        let factory = Arc::new(VariableFactory::new(spec, limits)?);
        let validator = ConstraintValidator::new(Arc::clone(&factory), &config);
        let driver = OptimizerDriver::new(Arc::clone(&factory), config);
        Ok(Self {
            factory,
            translator,
            validator,
            registry: ConstraintRegistry::new(),
            driver,
            last_report: None,
        })
    }

    /// Builds a session from the external specification shape.
    pub fn from_input(input: SpecificationInput, config: EngineConfig, translator: Arc<dyn Translator>) -> Result<Self> {
        Self::new(ProblemSpecification::try_from(input)?, config, translator)
    }

    /// Installs the hook consulted before resubmitting a failed phrase.
    pub fn with_approval(mut self, approval: Arc<dyn ResubmitApproval>) -> Self {
        self.validator = self.validator.with_approval(approval);
        self
    }

    pub fn spec(&self) -> &ProblemSpecification {
        self.factory.spec()
    }

    pub fn config(&self) -> &EngineConfig {
        self.driver.config()
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn records(&self) -> &[ConstraintRecord] {
        self.registry.records()
    }

    pub fn driver(&self) -> &OptimizerDriver {
        &self.driver
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    /// Translates, validates and registers `phrase`, then commits it to the live
    /// model if one has been built.
    pub fn add_constraint(&mut self, phrase: &str) -> Result<AddOutcome> {
        if self.registry.get(phrase).is_some() {
            return Err(RotaForgeError::DuplicateConstraint(phrase.to_string()));
        }
        let outcome = self.validator.validate_phrase(phrase, self.translator.as_ref())?;
        let attempts = outcome.attempts();
        let repaired = outcome.repaired();
        self.registry.add(outcome)?;

        let (committed, mismatch) = match self.driver.instance_mut() {
            Some(instance) => match self.registry.commit(phrase, instance) {
                CommitOutcome::Committed(ids) => (Some(ids.into_iter().collect()), None),
                CommitOutcome::Mismatch(reason) => (None, Some(reason)),
                CommitOutcome::Inactive | CommitOutcome::Unknown => (None, None),
            },
            None => (None, None),
        };
        let record = self
            .registry
            .get(phrase)
            .cloned()
            .ok_or_else(|| RotaForgeError::UnknownConstraint(phrase.to_string()))?;
        info!(text = %phrase, attempts, repaired, "constraint added");
        Ok(AddOutcome {
            record,
            attempts,
            repaired,
            committed,
            mismatch,
        })
    }

    pub fn edit_constraint(&mut self, old_text: &str, new_text: &str) -> Result<&ConstraintRecord> {
        self.registry
            .edit(old_text, new_text, &self.validator, self.translator.as_ref())
    }

    pub fn toggle_constraint(&mut self, text: &str, active: bool) -> Result<()> {
        self.registry.toggle(text, active)
    }

    pub fn delete_constraint(&mut self, text: &str) -> Result<ConstraintRecord> {
        self.registry.delete(text)
    }

    /// Runs a solve cycle over the active records.
    pub fn solve(&mut self) -> &SolveReport {
        let report = self.driver.solve(&mut self.registry);
        self.last_report.insert(report)
    }

    /// Tabulates the assignment of the last solve, falling back to the relaxed
    /// assignment of an infeasible cycle.
    pub fn export(&self) -> Option<ScheduleTable> {
        self.export_with(&TableExporter::default())
    }

    pub fn export_with<E: ResultExporter>(&self, exporter: &E) -> Option<E::Output> {
        let assignment = self.last_report.as_ref()?.best_assignment()?;
        Some(exporter.export(assignment, self.factory.spec()))
    }
}
