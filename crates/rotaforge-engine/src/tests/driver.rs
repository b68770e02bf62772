use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::{Horizon, ProblemSpecification, RotaForgeError, SolveStatus};
use rotaforge_test::{snippets, specs, ScriptedTranslator};

use super::{factory, session};
use crate::driver::{DriverState, OptimizerDriver};
use crate::objective::ObjectiveKind;
use crate::registry::ConstraintRegistry;

const COVER: &str = "every slot has one or two people";

fn cover_translator() -> Arc<ScriptedTranslator> {
    Arc::new(ScriptedTranslator::new().with_response(COVER, snippets::coverage(1, 2)))
}

#[test]
fn test_end_to_end_coverage_bounds_hold() {
    let mut s = session(specs::three_by_two_by_two(), cover_translator());
    s.add_constraint(COVER).unwrap();

    let report = s.solve();

    assert_eq!(report.status, SolveStatus::Optimal);
    assert_eq!(report.state, DriverState::Optimal);
    assert_eq!(report.objective, Some(ObjectiveKind::Balancing));
    assert!(report.error.is_none());
    let assignment = report.solution().unwrap();
    for day in 0..2 {
        for slot in 0..2 {
            let n = assignment.count_at(day, slot);
            assert!((1..=2).contains(&n), "day {day} slot {slot} has {n}");
        }
    }
    // Six slots over three people balance exactly.
    assert!(report.objective_value.unwrap().abs() < 1e-6);
}

#[test]
fn test_rebuilds_are_deterministic() {
    let mut s = session(specs::three_by_two_by_two(), cover_translator());
    s.add_constraint(COVER).unwrap();

    let first = s.solve().clone();
    let first_size = s.driver().instance().unwrap().primary().unwrap().len();
    let second = s.solve().clone();
    let second_size = s.driver().instance().unwrap().primary().unwrap().len();

    assert_eq!(first_size, 12);
    assert_eq!(first_size, second_size);
    assert_eq!(first.status, second.status);
    assert_eq!(first.assignment, second.assignment);
    assert_eq!(second.generation, first.generation + 1);
}

#[test]
fn test_live_session_settings_are_pinned() {
    let mut config = EngineConfig::default().with_time_limit_secs(5);
    config.solver.threads = 8;
    config.solver.presolve = true;
    let driver = OptimizerDriver::new(factory(specs::three_by_two_by_two()), config.clone());

    let settings = driver.solver_settings();
    assert_eq!(settings.threads, 1);
    assert!(!settings.presolve);
    assert_eq!(settings.time_limit, Some(std::time::Duration::from_secs(5)));

    config.solver.allow_nondeterministic = true;
    let driver = OptimizerDriver::new(factory(specs::three_by_two_by_two()), config);
    assert_eq!(driver.solver_settings().threads, 8);
    assert!(driver.solver_settings().presolve);
}

#[test]
fn test_replay_requires_a_live_instance() {
    let mut driver = OptimizerDriver::new(factory(specs::three_by_two_by_two()), EngineConfig::default());
    let err = driver.replay(&mut ConstraintRegistry::new()).unwrap_err();

    assert!(matches!(err, RotaForgeError::InvalidState(_)));
    assert_eq!(driver.state(), DriverState::Ready);
}

#[test]
fn test_reset_starts_a_new_generation() {
    let mut driver = OptimizerDriver::new(factory(specs::three_by_two_by_two()), EngineConfig::default());

    assert_eq!(driver.reset().unwrap().generation(), 1);
    let instance = driver.reset().unwrap();
    assert_eq!(instance.generation(), 2);
    assert_eq!(instance.provenance().generation(), 2);
    assert_eq!(instance.status(), SolveStatus::Unsolved);
    assert_eq!(instance.model().num_constraints(), 0);
}

#[test]
fn test_missing_decision_container_is_a_schema_error() {
    let spec = ProblemSpecification::new(Horizon::new(1, 1), "y = binary[staff, days, slots];")
        .with_entity_list("staff", ["ana"]);
    let mut s = session(spec, Arc::new(ScriptedTranslator::new()));

    let report = s.solve();

    assert_eq!(report.state, DriverState::Error);
    assert_eq!(report.status, SolveStatus::Error);
    assert!(matches!(report.error, Some(RotaForgeError::Schema(_))));
    assert!(report.solution().is_err());
}

#[test]
fn test_custom_objective_code() {
    let spec = specs::three_by_two_by_two()
        .with_objective("minimize sum(e in staff, d in days, s in slots: x[e, d, s]);");
    let mut s = session(spec, cover_translator());
    s.add_constraint(COVER).unwrap();

    let report = s.solve();

    assert_eq!(report.objective, Some(ObjectiveKind::Custom));
    assert_eq!(report.status, SolveStatus::Optimal);
    assert!((report.objective_value.unwrap() - 4.0).abs() < 1e-6);
    assert_eq!(report.solution().unwrap().len(), 4);
}

#[test]
fn test_broken_objective_code_ends_in_error() {
    let spec = specs::three_by_two_by_two().with_objective("minimize nothing_here;");
    let mut s = session(spec, cover_translator());

    let report = s.solve();

    assert_eq!(report.state, DriverState::Error);
    assert!(report.error.as_ref().unwrap().to_string().contains("objective code"));
}

#[test]
fn test_report_serializes_error_as_text() {
    let spec = ProblemSpecification::new(Horizon::new(1, 1), "y = binary[staff, days, slots];")
        .with_entity_list("staff", ["ana"]);
    let mut s = session(spec, Arc::new(ScriptedTranslator::new()));

    let json = serde_json::to_value(s.solve()).unwrap();

    assert_eq!(json["state"], "ERROR");
    assert!(json["error"].as_str().unwrap().starts_with("Schema error"));
}
