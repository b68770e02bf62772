use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::{RotaForgeError, SolveStatus, SpecificationInput};
use rotaforge_test::{snippets, specs, ScriptedTranslator};

use super::session;
use crate::driver::DriverState;
use crate::export::{ResultExporter, TableExporter};
use crate::manager::SessionManager;
use crate::session::ScheduleSession;

const COVER: &str = "every slot has one or two people";
const ANA_OFF: &str = "ana is off on the first day";
const CAP: &str = "nobody works more than three slots";

fn translator() -> Arc<ScriptedTranslator> {
    Arc::new(
        ScriptedTranslator::new()
            .with_response(COVER, snippets::coverage(1, 2))
            .with_response(ANA_OFF, snippets::day_off("ana", 0))
            .with_response(CAP, snippets::max_total("staff", 3)),
    )
}

#[test]
fn test_add_commits_only_once_a_live_model_exists() {
    let t = translator();
    let mut s = session(specs::three_by_two_by_two(), t.clone());

    let first = s.add_constraint(COVER).unwrap();
    assert!(first.committed.is_none());
    assert_eq!(first.attempts, 1);

    s.solve();
    let second = s.add_constraint(ANA_OFF).unwrap();
    assert_eq!(second.committed, Some(vec!["off_ana_0".to_string()]));
    assert!(second.mismatch.is_none());
    let live = s.driver().instance().unwrap();
    assert_eq!(live.provenance().phrase("off_ana_0"), Some(ANA_OFF));
}

#[test]
fn test_duplicate_phrase_is_not_translated_again() {
    let t = translator();
    let mut s = session(specs::three_by_two_by_two(), t.clone());
    s.add_constraint(COVER).unwrap();

    let err = s.add_constraint(COVER).unwrap_err();

    assert_eq!(err, RotaForgeError::DuplicateConstraint(COVER.into()));
    assert_eq!(t.calls_for(COVER), 1);
}

#[test]
fn test_failed_phrase_registers_nothing() {
    let t = Arc::new(ScriptedTranslator::new().with_response("bad", snippets::SYNTAX_ERROR));
    let mut s = session(specs::three_by_two_by_two(), t.clone());

    let err = s.add_constraint("bad").unwrap_err();

    assert!(matches!(err, RotaForgeError::ValidationExhausted { attempts: 3, .. }));
    assert!(s.records().is_empty());
    assert_eq!(t.calls_for("bad"), 3);
}

#[test]
fn test_lifecycle_through_the_session() {
    let mut s = session(specs::three_by_two_by_two(), translator());
    s.add_constraint(COVER).unwrap();
    s.add_constraint(ANA_OFF).unwrap();
    s.add_constraint(CAP).unwrap();

    s.toggle_constraint(CAP, false).unwrap();
    s.edit_constraint(ANA_OFF, ANA_OFF).unwrap();
    let removed = s.delete_constraint(COVER).unwrap();

    assert_eq!(removed.text(), COVER);
    let texts: Vec<&str> = s.records().iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec![ANA_OFF, CAP]);
    assert_eq!(s.state(), DriverState::Ready);

    let report = s.solve();
    assert_eq!(report.replay.committed, vec![ANA_OFF]);
    assert_eq!(report.replay.inactive, 1);
}

#[test]
fn test_export_marks_rest_days() {
    let mut s = session(specs::three_by_two_by_two(), translator());
    s.add_constraint(COVER).unwrap();
    s.add_constraint(ANA_OFF).unwrap();
    assert!(s.export().is_none());

    let assignment_len = s.solve().solution().unwrap().len();
    let table = s.export().unwrap();

    assert_eq!(table.entities, vec!["ana", "ben", "cy"]);
    assert_eq!(table.days, vec!["Day 1", "Day 2"]);
    assert_eq!(table.rows.len(), assignment_len);
    assert_eq!(table.cell(0, "ana"), Some("Rest"));
    assert!(table.rows.iter().all(|r| r.slot == "day" || r.slot == "night"));
    let text = table.to_string();
    assert!(text.contains("Day 2"));
    assert!(text.contains("Rest"));

    let custom = s.export_with(&TableExporter::new().with_rest_label("Off")).unwrap();
    assert_eq!(custom.cell(0, "ana"), Some("Off"));
}

#[test]
fn test_split_containers_form_the_primary() {
    let t = ScriptedTranslator::new().with_response(
        "someone works each half of each day",
        "for d in days {\n  constrain \"day_{d}\": sum(e in staff: x_day[e, d]) >= 1;\n  constrain \"night_{d}\": sum(e in staff: x_night[e, d]) >= 1;\n}",
    );
    let mut s = session(specs::split_containers(), Arc::new(t));
    s.add_constraint("someone works each half of each day").unwrap();

    let report = s.solve().clone();
    assert_eq!(report.status, SolveStatus::Optimal);
    let shifts = report.solution().unwrap().shifts();
    assert!(shifts.iter().any(|sh| sh.container.as_deref() == Some("x_day")));
    assert!(shifts.iter().any(|sh| sh.container.as_deref() == Some("x_night")));
    assert!(shifts.iter().all(|sh| sh.slot.is_none()));

    let table = TableExporter::new().export(report.solution().unwrap(), s.spec());
    assert!(table.rows.iter().any(|r| r.slot == "x_night"));
}

#[test]
fn test_session_from_external_input() {
    let input: SpecificationInput = serde_json::from_str(specs::THREE_BY_TWO_BY_TWO_JSON).unwrap();
    let mut s = ScheduleSession::from_input(input, EngineConfig::default(), translator()).unwrap();
    s.add_constraint(COVER).unwrap();

    assert_eq!(s.spec(), &specs::three_by_two_by_two());
    assert_eq!(s.solve().status, SolveStatus::Optimal);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = ScheduleSession::new(
        specs::three_by_two_by_two(),
        EngineConfig::default().with_max_attempts(0),
        translator(),
    )
    .unwrap_err();

    assert!(matches!(err, RotaForgeError::Config(_)));
}

#[test]
fn test_manager_runs_sessions_independently() {
    let manager = SessionManager::new();
    let a = manager
        .create(specs::three_by_two_by_two(), EngineConfig::default(), translator())
        .unwrap();
    let b = manager
        .create(specs::three_by_two_by_two(), EngineConfig::default(), translator())
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(manager.len(), 2);

    manager
        .with_session(a, |s| s.add_constraint(COVER).map(|_| ()))
        .unwrap()
        .unwrap();
    let handle = manager.solve_in_background(a).unwrap();
    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.status, SolveStatus::Optimal);

    let b_records = manager.with_session(b, |s| s.records().len()).unwrap();
    assert_eq!(b_records, 0);

    assert!(manager.remove(a).unwrap());
    assert!(manager.get(a).is_err());
    assert_eq!(manager.ids().unwrap(), vec![b]);
}

#[test]
fn test_readded_phrase_runs_its_new_code_on_the_live_model() {
    const OFF: &str = "someone is off on the first day";
    let t = Arc::new(
        ScriptedTranslator::new()
            .with_response(COVER, snippets::coverage(1, 2))
            .with_responses(OFF, [snippets::day_off("ana", 0), snippets::day_off("ben", 0)]),
    );
    let mut s = session(specs::three_by_two_by_two(), t);
    s.add_constraint(COVER).unwrap();
    s.add_constraint(OFF).unwrap();
    s.solve();
    assert!(s.driver().instance().unwrap().model().constraint("off_ana_0").is_some());

    s.delete_constraint(OFF).unwrap();
    let again = s.add_constraint(OFF).unwrap();

    assert_eq!(again.record.code(), snippets::day_off("ben", 0));
    assert_eq!(again.committed, Some(vec!["off_ben_0".to_string()]));
    let live = s.driver().instance().unwrap();
    assert!(live.model().constraint("off_ben_0").is_some());
    assert_eq!(live.provenance().phrase("off_ben_0"), Some(OFF));
}
