//! Infeasibility Analyzer: conflict diagnosis and slack relaxation.

use rotaforge_core::{Result, RotaForgeError, SolveStatus};
use rotaforge_milp::{slack_target, LinearConstraint, Sense};
use serde::Serialize;
use tracing::{info, warn};

use crate::assignment::Assignment;
use crate::instance::{solve_status, ModelInstance};

/// Slack values at or below this are treated as zero.
pub const SLACK_TOLERANCE: f64 = 1e-6;

const TOTAL_SLACK_ROW: &str = "feasrelax_total_slack";

/// A minimal conflicting constraint subset mapped to phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    /// Constraint identifiers of the conflict, in model order.
    pub conflict: Vec<String>,
    /// Distinct phrases behind the conflict.
    pub phrases: Vec<String>,
    /// Conflict members added by the engine itself, such as balancing rows.
    pub system: Vec<String>,
}

/// Slack carried by one constraint of the relaxed model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackEntry {
    pub constraint_id: String,
    pub phrase: Option<String>,
    pub amount: f64,
}

/// Outcome of solving the slack relaxation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelaxationReport {
    pub status: SolveStatus,
    pub total_slack: f64,
    pub slacks: Vec<SlackEntry>,
    /// Distinct phrases carrying nonzero slack.
    pub phrases: Vec<String>,
    pub assignment: Option<Assignment>,
}

impl RelaxationReport {
    /// Slack summed over the constraints of `phrase`.
    pub fn slack_for(&self, phrase: &str) -> f64 {
        self.slacks
            .iter()
            .filter(|s| s.phrase.as_deref() == Some(phrase))
            .map(|s| s.amount)
            .sum()
    }
}

/// Explains an infeasible model instance.
pub struct InfeasibilityAnalyzer<'a> {
    instance: &'a ModelInstance,
}

impl<'a> InfeasibilityAnalyzer<'a> {
    pub fn new(instance: &'a ModelInstance) -> Self {
        Self { instance }
    }

    /// Computes a conflict and maps its members through the provenance index.
    pub fn diagnose(&self) -> Result<Diagnosis> {
        let conflict = self
            .instance
            .model()
            .compute_conflict()
            .map_err(|e| RotaForgeError::Solver(e.to_string()))?;
        let (phrases, system) = self
            .instance
            .provenance()
            .resolve(conflict.iter().map(String::as_str));
        info!(
            event = "iis_computed",
            generation = self.instance.generation(),
            constraints = conflict.len(),
            phrases = phrases.len(),
        );
        Ok(Diagnosis {
            conflict,
            phrases,
            system,
        })
    }

    /// Solves the slack relaxation of the instance.
    ///
    /// Total slack is minimized first. With `minimize_original` the original
    /// objective is then optimized with total slack held at that minimum.
    pub fn relax(&self, minimize_original: bool, threshold: f64) -> Result<RelaxationReport> {
        let failed = |e: rotaforge_milp::SolverError| RotaForgeError::RelaxationFailed(e.to_string());
        let mut relaxed = self.instance.model().relax().map_err(failed)?;

        let mut status = relaxed.optimize();
        if !status.has_solution() {
            warn!(event = "relaxation_end", status = %status, "relaxed model has no solution");
            return Err(RotaForgeError::RelaxationFailed(format!(
                "relaxed model ended with status {}",
                status
            )));
        }

        if minimize_original {
            let bound = relaxed.objective_value().unwrap_or(0.0) + SLACK_TOLERANCE;
            let slack = relaxed.slack_expr();
            relaxed
                .add_constraint(Some(TOTAL_SLACK_ROW), LinearConstraint::new(slack, Sense::Le, bound))
                .map_err(failed)?;
            let original = self.instance.model().objective().clone();
            relaxed.set_objective(original.expr, original.sense);
            status = relaxed.optimize();
            if !status.has_solution() {
                return Err(RotaForgeError::RelaxationFailed(format!(
                    "re-optimizing the original objective ended with status {}",
                    status
                )));
            }
        }

        let provenance = self.instance.provenance();
        let slacks: Vec<SlackEntry> = relaxed
            .active_slacks(SLACK_TOLERANCE)
            .into_iter()
            .filter_map(|(var, amount)| {
                let constraint_id = slack_target(&var)?.to_string();
                let phrase = provenance.phrase(&constraint_id).map(String::from);
                Some(SlackEntry {
                    constraint_id,
                    phrase,
                    amount,
                })
            })
            .collect();
        let total_slack = slacks.iter().map(|s| s.amount).sum();
        let mut phrases: Vec<String> = Vec::new();
        for phrase in slacks.iter().filter_map(|s| s.phrase.as_ref()) {
            if !phrases.contains(phrase) {
                phrases.push(phrase.clone());
            }
        }

        let assignment = self
            .instance
            .primary()
            .ok()
            .and_then(|primary| Assignment::extract(&relaxed, primary, threshold, self.instance.entity_part()));

        info!(
            event = "relaxation_end",
            generation = self.instance.generation(),
            status = %status,
            total_slack,
            phrases = phrases.len(),
        );
        Ok(RelaxationReport {
            status: solve_status(status),
            total_slack,
            slacks,
            phrases,
            assignment,
        })
    }
}
