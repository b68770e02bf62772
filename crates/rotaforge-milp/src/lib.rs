//! Mixed-integer linear solver sessions for RotaForge.
//!
//! A [`Model`] is one solver session: it owns variables, named linear constraints,
//! an objective and the result of the last [`Model::optimize`] call.
//!
//! # Search
//!
//! - Every [`Model::optimize`] call lowers the model to a HiGHS row problem and
//!   solves it with the settings of the session.
//! - With [`SolverSettings::deterministic`] HiGHS runs on one thread, with presolve
//!   off and a fixed random seed, so repeated solves return the same point.
//!
//! # Diagnosis
//!
//! - [`Model::compute_conflict`] returns an irreducible inconsistent subset (IIS)
//!   of constraints using a deletion filter.
//! - [`Model::relax`] builds an elastic copy where every constraint receives
//!   nonnegative slack variables named with [`SLACK_PREFIXES`], minimizing their sum.
//!
//! # Example
//!
//! ```
//! use rotaforge_milp::{LinExpr, LinearConstraint, Model, ObjectiveSense, Sense, Status, VarType};
//!
//! let mut model = Model::new("example");
//! let a = model.add_variable("a", VarType::Binary, 0.0, 1.0).unwrap();
//! let b = model.add_variable("b", VarType::Binary, 0.0, 1.0).unwrap();
//! let both = LinExpr::from(a) + LinExpr::from(b);
//! model
//!     .add_constraint(Some("pick_one"), LinearConstraint::new(both.clone(), Sense::Eq, 1.0))
//!     .unwrap();
//! model.set_objective(both, ObjectiveSense::Maximize);
//!
//! assert_eq!(model.optimize(), Status::Optimal);
//! assert_eq!(model.objective_value(), Some(1.0));
//! ```

mod backend;
mod error;
mod expr;
mod iis;
mod model;
mod relax;
mod settings;


pub use error::SolverError;
pub use expr::{LinExpr, LinearConstraint, Sense, VarId};
pub use model::{
    Checkpoint, Constraint, Model, Objective, ObjectiveSense, SolveStats, Status, VarType, Variable,
};
pub use relax::{slack_target, SLACK_DOWN, SLACK_PREFIXES, SLACK_UP};
pub use settings::SolverSettings;
