//! Elastic copies of a model with per-constraint slack variables.

use tracing::debug;

use crate::error::SolverError;
use crate::expr::{LinExpr, LinearConstraint, Sense};
use crate::model::{Model, ObjectiveSense, VarType};

/// Prefix of slack variables that allow a constraint's activity to rise.
pub const SLACK_UP: &str = "ArtP_";
/// Prefix of slack variables that allow a constraint's activity to fall.
pub const SLACK_DOWN: &str = "ArtN_";
/// Every prefix used for slack variable names.
pub const SLACK_PREFIXES: [&str; 2] = [SLACK_UP, SLACK_DOWN];

/// Returns the constraint name a slack variable belongs to.
///
/// ```
/// use rotaforge_milp::slack_target;
///
/// assert_eq!(slack_target("ArtP_min_cover_0_1"), Some("min_cover_0_1"));
/// assert_eq!(slack_target("x[ana,0,1]"), None);
/// ```
pub fn slack_target(var_name: &str) -> Option<&str> {
    SLACK_PREFIXES
        .iter()
        .find_map(|prefix| var_name.strip_prefix(prefix))
}

impl Model {
    /// Builds the feasibility relaxation of this model.
    ///
    /// The copy has the same variables in the same order, so [`VarId`](crate::VarId)s
    /// stay valid. Every `<=` row gets an `ArtN_<name>` slack, every `>=` row an
    /// `ArtP_<name>` slack and equalities both. The objective minimizes total slack.
    pub fn relax(&self) -> Result<Model, SolverError> {
        let mut relaxed = Model::with_settings(format!("{}_feasrelax", self.name()), self.settings().clone());
        for (_, var) in self.variables() {
            relaxed.add_variable(var.name.clone(), var.var_type, var.lower, var.upper)?;
        }

        let mut total = LinExpr::new();
        for c in self.constraints() {
            let mut expr = c.row.expr.clone();
            if matches!(c.row.sense, Sense::Ge | Sense::Eq) {
                let up = relaxed.add_variable(
                    format!("{}{}", SLACK_UP, c.name),
                    VarType::Continuous,
                    0.0,
                    f64::INFINITY,
                )?;
                expr.add_term(up, 1.0);
                total.add_term(up, 1.0);
            }
            if matches!(c.row.sense, Sense::Le | Sense::Eq) {
                let down = relaxed.add_variable(
                    format!("{}{}", SLACK_DOWN, c.name),
                    VarType::Continuous,
                    0.0,
                    f64::INFINITY,
                )?;
                expr.add_term(down, -1.0);
                total.add_term(down, 1.0);
            }
            relaxed.add_constraint(Some(&c.name), LinearConstraint::new(expr, c.row.sense, c.row.rhs))?;
        }
        relaxed.set_objective(total, ObjectiveSense::Minimize);

        debug!(
            component = "milp",
            operation = "relax",
            model = %self.name(),
            slack_vars = relaxed.num_variables() - self.num_variables(),
            "relaxation built"
        );
        Ok(relaxed)
    }

    /// Sum of all slack variables of a relaxed model.
    pub fn slack_expr(&self) -> LinExpr {
        let mut total = LinExpr::new();
        for (id, var) in self.variables() {
            if slack_target(&var.name).is_some() {
                total.add_term(id, 1.0);
            }
        }
        total
    }

    /// Slack variables with a value above `tol` in the last solution, as
    /// `(variable name, value)` pairs in variable order.
    pub fn active_slacks(&self, tol: f64) -> Vec<(String, f64)> {
        self.variables()
            .filter(|(_, var)| slack_target(&var.name).is_some())
            .filter_map(|(id, var)| {
                self.value(id)
                    .filter(|v| *v > tol)
                    .map(|v| (var.name.clone(), v))
            })
            .collect()
    }
}
