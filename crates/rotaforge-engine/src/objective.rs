//! Objective commit: the specification's objective code or the generic balancing
//! objective over the primary container.

use rotaforge_core::{Result, RotaForgeError};
use rotaforge_expr::Mode;
use rotaforge_milp::{LinExpr, LinearConstraint, ObjectiveSense, Sense, VarType};
use serde::Serialize;

use crate::instance::ModelInstance;

pub const LOAD_MAX: &str = "load_max";
pub const LOAD_MIN: &str = "load_min";

/// Which objective a solve cycle committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Objective code from the specification.
    Custom,
    /// `load_max - load_min` over per-entity loads.
    Balancing,
}

/// Commits the objective on `instance`.
pub(crate) fn commit(instance: &mut ModelInstance, objective_code: Option<&str>) -> Result<ObjectiveKind> {
    match objective_code {
        Some(code) => {
            instance
                .execute(code, Mode::Objective)
                .map_err(|e| RotaForgeError::Schema(format!("objective code: {}", e)))?;
            Ok(ObjectiveKind::Custom)
        }
        None => {
            balance(instance)?;
            Ok(ObjectiveKind::Balancing)
        }
    }
}

/// Brackets each entity's load between `load_min` and `load_max` and minimizes the
/// spread.
fn balance(instance: &mut ModelInstance) -> Result<()> {
    let part = instance.entity_part();
    let mut loads: Vec<(String, LinExpr)> = Vec::new();
    for (key, var) in instance.primary()?.iter() {
        let Some(entity) = key.get(part).map(ToString::to_string) else {
            continue;
        };
        match loads.iter_mut().find(|(e, _)| *e == entity) {
            Some((_, load)) => load.add_term(var, 1.0),
            None => loads.push((entity, LinExpr::term(var, 1.0))),
        }
    }

    let model = instance.model_mut();
    let solver_err = |e: rotaforge_milp::SolverError| RotaForgeError::Schema(format!("balancing objective: {}", e));
    let load_max = model
        .add_variable(LOAD_MAX, VarType::Continuous, 0.0, f64::INFINITY)
        .map_err(solver_err)?;
    let load_min = model
        .add_variable(LOAD_MIN, VarType::Continuous, 0.0, f64::INFINITY)
        .map_err(solver_err)?;

    for (entity, load) in loads {
        let hi = load.clone() - LinExpr::from(load_max);
        model
            .add_constraint(Some(&format!("balance_hi_{}", entity)), LinearConstraint::new(hi, Sense::Le, 0.0))
            .map_err(solver_err)?;
        let lo = load - LinExpr::from(load_min);
        model
            .add_constraint(Some(&format!("balance_lo_{}", entity)), LinearConstraint::new(lo, Sense::Ge, 0.0))
            .map_err(solver_err)?;
    }
    model.set_objective(LinExpr::from(load_max) - LinExpr::from(load_min), ObjectiveSense::Minimize);
    Ok(())
}
