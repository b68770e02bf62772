//! Optimizer Driver: rebuild, replay, solve and recover.
//!
//! Every solve discards the live session and replays the active records onto a
//! fresh one. Constraints are never removed from a live session.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rotaforge_config::EngineConfig;
use rotaforge_core::{Result, RotaForgeError, SolveStatus};
use rotaforge_milp::{SolverSettings, Status};
use serde::{Serialize, Serializer};
use tracing::{error, info};

use crate::analyzer::{Diagnosis, InfeasibilityAnalyzer, RelaxationReport};
use crate::assignment::Assignment;
use crate::factory::VariableFactory;
use crate::instance::{solve_status, ModelInstance};
use crate::objective::{self, ObjectiveKind};
use crate::registry::{ConstraintRegistry, ReplaySummary};

/// Lifecycle state of a driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverState {
    #[default]
    Ready,
    Solving,
    Optimal,
    Suboptimal,
    Infeasible,
    Error,
}

impl DriverState {
    /// True once a solve cycle has finished.
    pub fn is_terminal(self) -> bool {
        !matches!(self, DriverState::Ready | DriverState::Solving)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverState::Ready => "READY",
            DriverState::Solving => "SOLVING",
            DriverState::Optimal => "OPTIMAL",
            DriverState::Suboptimal => "SUBOPTIMAL",
            DriverState::Infeasible => "INFEASIBLE",
            DriverState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Everything one solve cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub generation: u64,
    pub state: DriverState,
    /// Status of the live model before any relaxation.
    pub status: SolveStatus,
    pub objective: Option<ObjectiveKind>,
    pub objective_value: Option<f64>,
    pub assignment: Option<Assignment>,
    pub replay: ReplaySummary,
    pub diagnosis: Option<Diagnosis>,
    pub relaxation: Option<RelaxationReport>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<RotaForgeError>,
    pub elapsed_ms: u64,
}

fn serialize_error<S: Serializer>(error: &Option<RotaForgeError>, s: S) -> std::result::Result<S::Ok, S::Error> {
    error.as_ref().map(ToString::to_string).serialize(s)
}

impl SolveReport {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            state: DriverState::Solving,
            status: SolveStatus::Unsolved,
            objective: None,
            objective_value: None,
            assignment: None,
            replay: ReplaySummary::default(),
            diagnosis: None,
            relaxation: None,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// The realized assignment of a feasible cycle.
    ///
    /// Infeasible cycles yield [`RotaForgeError::SolverInfeasible`] even when a
    /// relaxation succeeded; failed cycles yield their error.
    pub fn solution(&self) -> Result<&Assignment> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match (self.status, &self.assignment) {
            (SolveStatus::Infeasible, _) => Err(RotaForgeError::SolverInfeasible),
            (_, Some(assignment)) => Ok(assignment),
            (status, None) => Err(RotaForgeError::InvalidState(format!("no assignment for status {}", status))),
        }
    }

    /// Assignment of the relaxation when the live model was infeasible, otherwise
    /// the regular assignment.
    pub fn best_assignment(&self) -> Option<&Assignment> {
        self.assignment
            .as_ref()
            .or_else(|| self.relaxation.as_ref().and_then(|r| r.assignment.as_ref()))
    }
}

/// Owns the live model instance of one schedule.
#[derive(Debug)]
pub struct OptimizerDriver {
    factory: Arc<VariableFactory>,
    config: EngineConfig,
    state: DriverState,
    generation: u64,
    instance: Option<ModelInstance>,
}

impl OptimizerDriver {
    pub fn new(factory: Arc<VariableFactory>, config: EngineConfig) -> Self {
        if config.console.enabled {
            rotaforge_console::init();
        }
        Self {
            factory,
            config,
            state: DriverState::Ready,
            generation: 0,
            instance: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live instance, if one has been built.
    pub fn instance(&self) -> Option<&ModelInstance> {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut ModelInstance> {
        self.instance.as_mut()
    }

    /// Solver settings for the live session.
    ///
    /// Threads and presolve are pinned to the reproducible values unless the
    /// configuration allows nondeterminism.
    pub fn solver_settings(&self) -> SolverSettings {
        let solver = &self.config.solver;
        let mut settings = SolverSettings {
            threads: solver.threads,
            presolve: solver.presolve,
            time_limit: solver.time_limit(),
            node_limit: solver.node_limit,
            mip_gap: solver.mip_gap,
            ..SolverSettings::default()
        };
        if !solver.allow_nondeterministic {
            settings.threads = 1;
            settings.presolve = false;
        }
        settings
    }

    /// Discards the live session and builds a new generation.
    pub fn reset(&mut self) -> Result<&mut ModelInstance> {
        self.instance = None;
        self.generation += 1;
        let instance = ModelInstance::build(Arc::clone(&self.factory), self.generation, self.solver_settings())?;
        info!(
            event = "model_rebuild",
            generation = self.generation,
            variables = instance.model().num_variables(),
            containers = instance.containers().len(),
        );
        self.state = DriverState::Ready;
        Ok(self.instance.insert(instance))
    }

    /// Commits every active record to the live instance.
    pub fn replay(&mut self, registry: &mut ConstraintRegistry) -> Result<ReplaySummary> {
        let instance = self
            .instance
            .as_mut()
            .ok_or_else(|| RotaForgeError::InvalidState("no live model instance; call reset first".into()))?;
        Ok(registry.replay(instance))
    }

    /// Runs one cycle: reset, replay, objective, solve, and on infeasibility
    /// diagnosis and relaxation.
    ///
    /// Failures are reported in the returned [`SolveReport`], never raised.
    pub fn solve(&mut self, registry: &mut ConstraintRegistry) -> SolveReport {
        let started = Instant::now();
        self.state = DriverState::Solving;
        let mut report = SolveReport::new(self.generation + 1);
        info!(
            event = "solve_start",
            generation = report.generation,
            active_constraints = registry.active().count(),
            time_limit_secs = self.config.solver.time_limit_secs.unwrap_or(0),
        );

        if let Err(err) = self.run_cycle(registry, &mut report) {
            error!(generation = report.generation, error = %err, "solve cycle failed");
            if report.status == SolveStatus::Unsolved {
                report.status = SolveStatus::Error;
            }
            report.error = Some(err);
        }

        report.state = match (&report.error, report.status) {
            (Some(_), _) => DriverState::Error,
            (None, SolveStatus::Optimal) => DriverState::Optimal,
            (None, SolveStatus::Suboptimal) => DriverState::Suboptimal,
            (None, SolveStatus::Infeasible) => DriverState::Infeasible,
            (None, _) => DriverState::Error,
        };
        self.state = report.state;
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            event = "solve_end",
            generation = report.generation,
            state = %report.state,
            status = %report.status,
            assigned = report.assignment.as_ref().map_or(0, Assignment::len),
            duration_ms = report.elapsed_ms,
        );
        report
    }

    fn run_cycle(&mut self, registry: &mut ConstraintRegistry, report: &mut SolveReport) -> Result<()> {
        let threshold = self.config.assignment.rounding_threshold;
        let relaxation = self.config.relaxation.clone();
        let objective_code = self.factory.spec().objective_schema().map(String::from);

        let instance = self.reset()?;
        report.generation = instance.generation();
        report.replay = registry.replay(instance);
        report.objective = Some(objective::commit(instance, objective_code.as_deref())?);

        let status = instance.optimize();
        report.status = solve_status(status);
        match status {
            Status::Optimal | Status::Suboptimal => {
                report.objective_value = instance.model().objective_value();
                report.assignment = instance.assignment(threshold);
                Ok(())
            }
            Status::Infeasible => {
                let analyzer = InfeasibilityAnalyzer::new(instance);
                report.diagnosis = Some(analyzer.diagnose()?);
                if relaxation.enabled {
                    report.relaxation = Some(analyzer.relax(relaxation.minimize_original, threshold)?);
                }
                Ok(())
            }
            other => Err(RotaForgeError::Solver(format!("solver finished with status {}", other))),
        }
    }
}
