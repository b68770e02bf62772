//! Solve status of a model instance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a model instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Not solved since the last rebuild.
    #[default]
    Unsolved,
    /// Proven optimal.
    Optimal,
    /// A feasible assignment was found but optimality was not proven.
    Suboptimal,
    /// No feasible assignment exists.
    Infeasible,
    /// The solver failed for any other reason.
    Error,
}

impl SolveStatus {
    /// Returns true if a realized assignment can be extracted.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Suboptimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Unsolved => "UNSOLVED",
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Suboptimal => "SUBOPTIMAL",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}
