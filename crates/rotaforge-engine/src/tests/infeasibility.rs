use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::{RotaForgeError, SolveStatus};
use rotaforge_test::{snippets, specs, ScriptedTranslator};

use super::{session, session_with};
use crate::driver::DriverState;
use crate::session::ScheduleSession;

const COVERAGE: &str = "each shift needs six to eight crews";
const MINIMUM: &str = "at least ten crews per shift";

fn emergency_session(config: EngineConfig) -> ScheduleSession {
    let translator = ScriptedTranslator::new()
        .with_response(COVERAGE, snippets::coverage_of("crew", 6, 8))
        .with_response(MINIMUM, snippets::minimum_per_slot("crew", 10));
    let mut s = session_with(specs::emergency(2), config, Arc::new(translator));
    s.add_constraint(COVERAGE).unwrap();
    s.add_constraint(MINIMUM).unwrap();
    s
}

#[test]
fn test_conflicting_minimum_is_diagnosed_and_relaxed() {
    let mut s = emergency_session(EngineConfig::default());

    let report = s.solve();

    assert_eq!(report.status, SolveStatus::Infeasible);
    assert_eq!(report.state, DriverState::Infeasible);
    assert!(report.assignment.is_none());
    assert_eq!(report.solution().unwrap_err(), RotaForgeError::SolverInfeasible);

    let diagnosis = report.diagnosis.as_ref().unwrap();
    assert!(!diagnosis.conflict.is_empty());
    assert!(diagnosis.conflict.iter().all(|id| id.starts_with("min_10_")));
    assert_eq!(diagnosis.phrases, vec![MINIMUM]);
    assert!(diagnosis.system.is_empty());

    let relaxation = report.relaxation.as_ref().unwrap();
    assert_eq!(relaxation.status, SolveStatus::Optimal);
    assert!(relaxation.slack_for(MINIMUM) > 0.0);
    assert!(relaxation.phrases.iter().any(|p| p == MINIMUM));
    // Nine crews against a minimum of ten and a maximum of eight: two units per shift.
    assert!((relaxation.total_slack - 8.0).abs() < 1e-6);
    assert!(relaxation
        .slacks
        .iter()
        .all(|s| !s.constraint_id.starts_with("ArtP_") && !s.constraint_id.starts_with("ArtN_")));
    assert!(relaxation.assignment.is_some());
}

#[test]
fn test_conflict_between_two_phrases_names_both() {
    // Twelve crews could staff ten per shift; the coverage cap of eight is what conflicts.
    let translator = ScriptedTranslator::new()
        .with_response(COVERAGE, snippets::coverage_of("crew", 6, 8))
        .with_response(MINIMUM, snippets::minimum_per_slot("crew", 10));
    let mut s = session_with(specs::emergency_crews(2, 12), EngineConfig::default(), Arc::new(translator));
    s.add_constraint(COVERAGE).unwrap();
    s.add_constraint(MINIMUM).unwrap();

    let report = s.solve();

    assert_eq!(report.status, SolveStatus::Infeasible);
    let diagnosis = report.diagnosis.as_ref().unwrap();
    assert_eq!(diagnosis.conflict.len(), 2);
    assert!(diagnosis.conflict.iter().any(|id| id.starts_with("cover_hi_")));
    assert!(diagnosis.conflict.iter().any(|id| id.starts_with("min_10_")));
    assert!(diagnosis.conflict.iter().all(|id| !id.starts_with("cover_lo_")));
    let mut phrases = diagnosis.phrases.clone();
    phrases.sort();
    assert_eq!(phrases, vec![MINIMUM, COVERAGE]);

    let relaxation = report.relaxation.as_ref().unwrap();
    assert_eq!(relaxation.status, SolveStatus::Optimal);
    // Two units per shift over four shifts, split between the phrases as the solver likes.
    assert!((relaxation.total_slack - 8.0).abs() < 1e-6);
    let attributed = relaxation.slack_for(COVERAGE) + relaxation.slack_for(MINIMUM);
    assert!((attributed - 8.0).abs() < 1e-6);
    let assignment = relaxation.assignment.as_ref().unwrap();
    for day in 0..2 {
        for slot in 0..2 {
            assert!((8..=10).contains(&assignment.count_at(day, slot)));
        }
    }
}

#[test]
fn test_coverage_alone_is_feasible() {
    let mut s = emergency_session(EngineConfig::default());
    s.toggle_constraint(MINIMUM, false).unwrap();

    let report = s.solve();

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(report.diagnosis.is_none());
    let assignment = report.solution().unwrap();
    for day in 0..2 {
        for slot in 0..2 {
            assert!((6..=8).contains(&assignment.count_at(day, slot)));
        }
    }
    let provenance = s.driver().instance().unwrap().provenance();
    assert!(provenance.iter().all(|(id, _)| !id.starts_with("min_10_")));
}

#[test]
fn test_relaxation_can_be_disabled() {
    let mut s = emergency_session(EngineConfig::default().with_relaxation(false));

    let report = s.solve();

    assert_eq!(report.state, DriverState::Infeasible);
    assert!(report.diagnosis.is_some());
    assert!(report.relaxation.is_none());
}

#[test]
fn test_original_objective_inside_minimal_slack() {
    let mut config = EngineConfig::default();
    config.relaxation.minimize_original = true;
    let mut s = emergency_session(config);

    let report = s.solve();

    let relaxation = report.relaxation.as_ref().unwrap();
    assert!(relaxation.status.has_solution());
    assert!((relaxation.total_slack - 8.0).abs() < 1e-4);
    assert!(relaxation.slack_for(MINIMUM) > 0.0);
}

#[test]
fn test_relaxed_assignment_is_exported() {
    let mut s = emergency_session(EngineConfig::default());
    s.solve();

    let table = s.export().unwrap();

    assert_eq!(table.entities.len(), 9);
    assert_eq!(table.days, vec!["Day 1", "Day 2"]);
    assert!(!table.rows.is_empty());
}

#[test]
fn test_diagnosis_of_a_single_impossible_phrase() {
    let translator = ScriptedTranslator::new().with_response("ana works every slot and never", {
        "constrain \"ana_on\": x[\"ana\", 0, 0] >= 1;\nconstrain \"ana_off\": x[\"ana\", 0, 0] <= 0;"
    });
    let mut s = session(specs::three_by_two_by_two(), Arc::new(translator));
    s.add_constraint("ana works every slot and never").unwrap();

    let report = s.solve();

    let diagnosis = report.diagnosis.as_ref().unwrap();
    assert_eq!(diagnosis.conflict, vec!["ana_on", "ana_off"]);
    assert_eq!(diagnosis.phrases, vec!["ana works every slot and never"]);
    let relaxation = report.relaxation.as_ref().unwrap();
    assert!((relaxation.total_slack - 1.0).abs() < 1e-6);
}
