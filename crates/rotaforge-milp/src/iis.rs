//! Irreducible inconsistent subsets by deletion filtering.

use std::time::Instant;

use tracing::debug;

use crate::backend::{self, Scope};
use crate::error::SolverError;
use crate::model::{Model, Status};

impl Model {
    /// Computes an irreducible inconsistent subset of the constraints.
    ///
    /// The model must have been optimized with an `Infeasible` result. Each
    /// constraint is dropped in turn; it stays dropped when the rest is still
    /// infeasible. Every check is a feasibility solve without the objective. A check
    /// that hits a limit keeps the constraint, so the result is always inconsistent
    /// but may not be minimal under tight limits. Variable bounds are treated as
    /// fixed and are never part of the subset.
    pub fn compute_conflict(&self) -> Result<Vec<String>, SolverError> {
        if self.status() != Status::Infeasible {
            return Err(SolverError::NotInfeasible(self.status().to_string()));
        }

        let start = Instant::now();
        let mut active = vec![true; self.num_constraints()];
        for i in 0..active.len() {
            active[i] = false;
            let check = backend::solve(
                self,
                Scope {
                    active: Some(&active),
                    feasibility_only: true,
                },
            );
            if check.status != Status::Infeasible {
                active[i] = true;
            }
        }

        let conflict: Vec<String> = self
            .constraints()
            .iter()
            .zip(&active)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c.name.clone())
            .collect();

        debug!(
            component = "milp",
            operation = "compute_conflict",
            model = %self.name(),
            size = conflict.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "conflict computed"
        );
        Ok(conflict)
    }
}
