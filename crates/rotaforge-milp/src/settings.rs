//! Solver session parameters.

use std::time::Duration;

/// Parameters of a solver session.
///
/// The defaults are the reproducible interactive settings: one thread, no presolve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    /// Worker threads handed to HiGHS.
    pub threads: usize,
    /// Let HiGHS presolve the model before the search.
    pub presolve: bool,
    /// Wall-clock limit for one `optimize` call.
    pub time_limit: Option<Duration>,
    /// Branch-and-bound node limit for one `optimize` call.
    pub node_limit: Option<u64>,
    /// Relative MIP gap at which the search stops.
    pub mip_gap: f64,
    /// Tolerance for integrality of integer variables.
    pub integrality_tol: f64,
    /// Tolerance for constraint feasibility.
    pub feasibility_tol: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            threads: 1,
            presolve: false,
            time_limit: None,
            node_limit: None,
            mip_gap: 1e-6,
            integrality_tol: 1e-6,
            feasibility_tol: 1e-7,
        }
    }
}

impl SolverSettings {
    /// The reproducible settings for interactive solves.
    pub fn deterministic() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_presolve(mut self, presolve: bool) -> Self {
        self.presolve = presolve;
        self
    }
}
