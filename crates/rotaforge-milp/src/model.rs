//! Solver session: variables, named constraints, objective and last result.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::{self, Outcome, Scope};
use crate::error::SolverError;
use crate::expr::{LinExpr, LinearConstraint, VarId};
use crate::settings::SolverSettings;

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Binary,
    Integer,
    Continuous,
}

impl VarType {
    pub fn is_integral(self) -> bool {
        !matches!(self, VarType::Continuous)
    }
}

/// A decision variable of a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub var_type: VarType,
    pub lower: f64,
    pub upper: f64,
}

/// A named linear constraint of a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub row: LinearConstraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Objective function of a [`Model`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objective {
    pub expr: LinExpr,
    pub sense: ObjectiveSense,
}

/// Status of a solver session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Built or modified since the last optimize call
    #[default]
    Loaded,
    /// Proven optimal within the gap tolerance
    Optimal,
    /// A limit stopped the search with an incumbent
    Suboptimal,
    Infeasible,
    Unbounded,
    /// A limit stopped the search before any incumbent was found
    LimitReached,
    /// The backend failed to load or solve the model
    NumericError,
}

impl Status {
    pub fn has_solution(self) -> bool {
        matches!(self, Status::Optimal | Status::Suboptimal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Loaded => "LOADED",
            Status::Optimal => "OPTIMAL",
            Status::Suboptimal => "SUBOPTIMAL",
            Status::Infeasible => "INFEASIBLE",
            Status::Unbounded => "UNBOUNDED",
            Status::LimitReached => "LIMIT_REACHED",
            Status::NumericError => "NUMERIC_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Size and duration of the last optimize call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolveStats {
    pub columns: usize,
    pub rows: usize,
    pub elapsed: Duration,
}

/// Position in a model's variable and constraint lists, used to undo additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    variables: usize,
    constraints: usize,
}

/// One solver session.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    settings: SolverSettings,
    variables: Vec<Variable>,
    var_names: HashMap<String, VarId>,
    constraints: Vec<Constraint>,
    con_names: HashMap<String, usize>,
    next_auto_name: usize,
    objective: Objective,
    status: Status,
    solution: Option<Vec<f64>>,
    objective_value: Option<f64>,
    stats: SolveStats,
}

impl Model {
    /// Creates an empty session with deterministic settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, SolverSettings::default())
    }

    pub fn with_settings(name: impl Into<String>, settings: SolverSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            variables: Vec::new(),
            var_names: HashMap::new(),
            constraints: Vec::new(),
            con_names: HashMap::new(),
            next_auto_name: 0,
            objective: Objective::default(),
            status: Status::Loaded,
            solution: None,
            objective_value: None,
            stats: SolveStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: SolverSettings) {
        self.settings = settings;
        self.invalidate();
    }

    /// Adds a variable with bounds `[lower, upper]`.
    ///
    /// Binary variables are clamped to `[0, 1]`. Lower bounds may be `-inf` and upper
    /// bounds `+inf`.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        var_type: VarType,
        lower: f64,
        upper: f64,
    ) -> Result<VarId, SolverError> {
        let name = name.into();
        if self.var_names.contains_key(&name) {
            return Err(SolverError::DuplicateVariable(name));
        }
        let (lower, upper) = match var_type {
            VarType::Binary => (lower.max(0.0), upper.min(1.0)),
            _ => (lower, upper),
        };
        if lower.is_nan() || upper.is_nan() || lower > upper || lower == f64::INFINITY || upper == f64::NEG_INFINITY {
            return Err(SolverError::InvalidBounds { name, lower, upper });
        }

        let id = VarId(self.variables.len());
        self.var_names.insert(name.clone(), id);
        self.variables.push(Variable {
            name,
            var_type,
            lower,
            upper,
        });
        self.invalidate();
        Ok(id)
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    pub fn variables(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.variables.iter().enumerate().map(|(i, v)| (VarId(i), v))
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VarId> {
        self.var_names.get(name).copied()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Adds a constraint and returns its name.
    ///
    /// Unnamed constraints are called `R0`, `R1`, ... skipping names already taken.
    pub fn add_constraint(
        &mut self,
        name: Option<&str>,
        row: LinearConstraint,
    ) -> Result<String, SolverError> {
        let name = match name {
            Some(name) => {
                if self.con_names.contains_key(name) {
                    return Err(SolverError::DuplicateConstraint(name.to_string()));
                }
                name.to_string()
            }
            None => self.fresh_constraint_name(),
        };
        if !row.expr.is_finite() || !row.rhs.is_finite() {
            return Err(SolverError::NonFinite(name));
        }
        if let Some((var, _)) = row.expr.terms().iter().find(|(v, _)| v.0 >= self.variables.len()) {
            return Err(SolverError::UnknownVariable(var.0));
        }

        self.con_names.insert(name.clone(), self.constraints.len());
        self.constraints.push(Constraint {
            name: name.clone(),
            row,
        });
        self.invalidate();
        Ok(name)
    }

    fn fresh_constraint_name(&mut self) -> String {
        loop {
            let candidate = format!("R{}", self.next_auto_name);
            self.next_auto_name += 1;
            if !self.con_names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.con_names.get(name).map(|&i| &self.constraints[i])
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Names of all constraints in insertion order.
    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|c| c.name.as_str())
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Records the current number of variables and constraints.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            variables: self.variables.len(),
            constraints: self.constraints.len(),
        }
    }

    /// Drops every variable and constraint added after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        for c in self.constraints.drain(checkpoint.constraints.min(self.constraints.len())..) {
            self.con_names.remove(&c.name);
        }
        for v in self.variables.drain(checkpoint.variables.min(self.variables.len())..) {
            self.var_names.remove(&v.name);
        }
        self.invalidate();
    }

    pub fn set_objective(&mut self, expr: LinExpr, sense: ObjectiveSense) {
        self.objective = Objective {
            expr: expr.normalized(),
            sense,
        };
        self.invalidate();
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Value of a variable in the last solution.
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.solution.as_ref().and_then(|s| s.get(var.0).copied())
    }

    pub fn values(&self) -> Option<&[f64]> {
        self.solution.as_deref()
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    fn invalidate(&mut self) {
        self.status = Status::Loaded;
        self.solution = None;
        self.objective_value = None;
    }

    /// Returns true if `values` respects every bound, integrality and the
    /// constraints selected by `active` (all when `None`).
    pub(crate) fn satisfies(&self, values: &[f64], active: Option<&[bool]>) -> bool {
        let tol = self.settings.feasibility_tol;
        if values.len() != self.variables.len() {
            return false;
        }
        let within_bounds = self.variables.iter().zip(values).all(|(var, &v)| {
            v >= var.lower - tol
                && v <= var.upper + tol
                && (!var.var_type.is_integral() || (v - v.round()).abs() <= self.settings.integrality_tol)
        });
        within_bounds
            && self
                .constraints
                .iter()
                .enumerate()
                .filter(|(i, _)| active.map_or(true, |a| a.get(*i).copied().unwrap_or(true)))
                .all(|(_, c)| c.row.is_satisfied(values, tol))
    }

    /// Solves the model and returns the resulting status.
    pub fn optimize(&mut self) -> Status {
        let start = Instant::now();
        let outcome = backend::solve(self, Scope::full());
        self.apply(outcome, start);

        debug!(
            component = "milp",
            operation = "optimize",
            model = %self.name,
            status = %self.status,
            columns = self.stats.columns,
            rows = self.stats.rows,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "model solved"
        );
        self.status
    }

    fn apply(&mut self, outcome: Outcome, start: Instant) {
        self.stats = SolveStats {
            columns: self.variables.len(),
            rows: self.constraints.len(),
            elapsed: start.elapsed(),
        };
        self.status = outcome.status;
        self.objective_value = outcome
            .solution
            .as_ref()
            .map(|x| self.objective.expr.evaluate(x));
        self.solution = outcome.solution;
    }
}
