use rotaforge_config::EngineConfig;
use rotaforge_core::RotaForgeError;
use rotaforge_test::{snippets, specs, ScriptedTranslator};

use super::factory;
use crate::driver::OptimizerDriver;
use crate::registry::{CommitOutcome, ConstraintRegistry};
use crate::validator::ConstraintValidator;

const COVER: &str = "every slot has one or two people";
const ONE_SLOT: &str = "nobody works twice a day";
const ANA_OFF: &str = "ana is off on the first day";
const BEN_OFF: &str = "ben is off on the second day";
const CAP: &str = "nobody works more than three slots";

struct Fixture {
    translator: ScriptedTranslator,
    validator: ConstraintValidator,
    registry: ConstraintRegistry,
    driver: OptimizerDriver,
}

impl Fixture {
    fn new() -> Self {
        let f = factory(specs::three_by_two_by_two());
        let config = EngineConfig::default();
        let translator = ScriptedTranslator::new()
            .with_response(COVER, snippets::coverage(1, 2))
            .with_response(ONE_SLOT, snippets::one_slot_per_day("staff"))
            .with_response(ANA_OFF, snippets::day_off("ana", 0))
            .with_response(BEN_OFF, snippets::day_off("ben", 1))
            .with_response(CAP, snippets::max_total("staff", 3));
        Self {
            translator,
            validator: ConstraintValidator::new(f.clone(), &config),
            registry: ConstraintRegistry::new(),
            driver: OptimizerDriver::new(f, config),
        }
    }

    fn add(&mut self, phrase: &str) {
        let outcome = self.validator.validate_phrase(phrase, &self.translator).unwrap();
        self.registry.add(outcome).unwrap();
    }

    fn rebuild(&mut self) -> crate::registry::ReplaySummary {
        self.driver.reset().unwrap();
        self.driver.replay(&mut self.registry).unwrap()
    }
}

#[test]
fn test_add_registers_active_record() {
    let mut f = Fixture::new();
    f.add(COVER);

    let record = f.registry.get(COVER).unwrap();
    assert!(record.is_active());
    assert_eq!(record.code(), snippets::coverage(1, 2));
    assert_eq!(record.generated_identifiers().len(), 8);
}

#[test]
fn test_duplicate_text_is_rejected() {
    let mut f = Fixture::new();
    f.add(COVER);
    let outcome = f.validator.validate_phrase(COVER, &f.translator).unwrap();

    let err = f.registry.add(outcome).unwrap_err();
    assert_eq!(err, RotaForgeError::DuplicateConstraint(COVER.into()));
    assert_eq!(f.registry.len(), 1);
}

#[test]
fn test_commit_is_idempotent_within_a_generation() {
    let mut f = Fixture::new();
    f.add(COVER);
    f.add(ANA_OFF);
    f.rebuild();

    let instance = f.driver.instance_mut().unwrap();
    let rows = instance.model().num_constraints();
    let first = f.registry.commit(COVER, instance);
    let second = f.registry.commit(COVER, instance);

    assert!(first.is_committed());
    assert_eq!(first, second);
    assert_eq!(instance.model().num_constraints(), rows);
    assert_eq!(instance.provenance().ids_for(COVER).count(), 8);
}

#[test]
fn test_commit_outcomes_for_inactive_and_unknown() {
    let mut f = Fixture::new();
    f.add(COVER);
    f.registry.toggle(COVER, false).unwrap();
    f.driver.reset().unwrap();
    let instance = f.driver.instance_mut().unwrap();

    assert_eq!(f.registry.commit(COVER, instance), CommitOutcome::Inactive);
    assert_eq!(f.registry.commit("never added", instance), CommitOutcome::Unknown);
    assert_eq!(
        CommitOutcome::Unknown.into_result("never added"),
        Err(RotaForgeError::UnknownConstraint("never added".into()))
    );
}

#[test]
fn test_toggle_off_removes_identifiers_after_rebuild() {
    let mut f = Fixture::new();
    f.add(COVER);
    f.add(ANA_OFF);
    f.rebuild();
    assert!(f.driver.instance().unwrap().provenance().contains("off_ana_0"));

    f.registry.toggle(ANA_OFF, false).unwrap();
    let summary = f.rebuild();

    let instance = f.driver.instance().unwrap();
    assert_eq!(summary.inactive, 1);
    assert!(!instance.provenance().contains("off_ana_0"));
    assert!(instance.model().constraint("off_ana_0").is_none());
    assert_eq!(instance.provenance().len(), 8);

    let record = f.registry.get(ANA_OFF).unwrap();
    assert!(!record.is_active());
    assert_eq!(record.code(), snippets::day_off("ana", 0));
}

#[test]
fn test_delete_leaves_live_model_until_rebuild() {
    let mut f = Fixture::new();
    f.add(COVER);
    f.add(ANA_OFF);
    f.rebuild();

    let removed = f.registry.delete(ANA_OFF).unwrap();
    assert_eq!(removed.text(), ANA_OFF);
    assert!(f.driver.instance().unwrap().model().constraint("off_ana_0").is_some());

    f.rebuild();
    assert!(f.driver.instance().unwrap().model().constraint("off_ana_0").is_none());
    assert_eq!(
        f.registry.delete(ANA_OFF).unwrap_err(),
        RotaForgeError::UnknownConstraint(ANA_OFF.into())
    );
}

#[test]
fn test_failed_edit_leaves_record_unchanged() {
    let mut f = Fixture::new();
    f.add(ANA_OFF);
    f.registry.toggle(ANA_OFF, false).unwrap();
    let before = f.registry.get(ANA_OFF).unwrap().clone();
    f.translator.push("ana is off forever", Ok(snippets::UNKNOWN_SYMBOL.to_string()));

    let err = f
        .registry
        .edit(ANA_OFF, "ana is off forever", &f.validator, &f.translator)
        .unwrap_err();

    assert!(matches!(err, RotaForgeError::ValidationExhausted { attempts: 3, .. }));
    assert_eq!(f.registry.get(ANA_OFF), Some(&before));
    assert!(f.registry.get("ana is off forever").is_none());
    assert_eq!(f.registry.len(), 1);
}

#[test]
fn test_edit_replaces_in_place_and_keeps_active_flag() {
    let mut f = Fixture::new();
    f.add(COVER);
    f.add(ANA_OFF);
    f.registry.toggle(ANA_OFF, false).unwrap();

    let edited = f
        .registry
        .edit(ANA_OFF, BEN_OFF, &f.validator, &f.translator)
        .unwrap();
    assert_eq!(edited.text(), BEN_OFF);
    assert!(!edited.is_active());
    assert!(edited.generated_identifiers().contains("off_ben_1"));

    let texts: Vec<&str> = f.registry.records().iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec![COVER, BEN_OFF]);
}

#[test]
fn test_edit_to_existing_text_is_rejected() {
    let mut f = Fixture::new();
    f.add(COVER);
    f.add(ANA_OFF);

    let err = f
        .registry
        .edit(ANA_OFF, COVER, &f.validator, &f.translator)
        .unwrap_err();
    assert_eq!(err, RotaForgeError::DuplicateConstraint(COVER.into()));
}

#[test]
fn test_replay_skips_a_malformed_record() {
    let mut f = Fixture::new();
    for phrase in [COVER, ONE_SLOT, ANA_OFF, CAP] {
        f.add(phrase);
    }
    // A record whose stored code no longer runs, as after loading a stale registry.
    let mut value = serde_json::to_value(&f.registry).unwrap();
    value["records"].as_array_mut().unwrap().insert(
        2,
        serde_json::json!({
            "text": "the night shift needs a medic",
            "code": "constrain sum(e in medics: x[e, 0, 1]) >= 1;",
            "is_active": true,
            "generated_identifiers": []
        }),
    );
    f.registry = serde_json::from_value(value).unwrap();
    assert_eq!(f.registry.len(), 5);

    let summary = f.rebuild();

    assert_eq!(summary.committed, vec![COVER, ONE_SLOT, ANA_OFF, CAP]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "the night shift needs a medic");
    assert!(summary.failed[0].1.contains("medics"));
    assert!(f.registry.get("the night shift needs a medic").unwrap().is_active());
    let instance = f.driver.instance().unwrap();
    assert!(instance.provenance().contains("max_total_cy"));
    assert!(instance.provenance().contains("one_slot_ana_1"));
}

#[test]
fn test_commit_mismatch_from_state_drift() {
    let mut f = Fixture::new();
    // Each declares the same auxiliary container; each validates alone.
    f.translator.push(
        "ana works at most two slots",
        Ok("peak = continuous[] in [0, 2]; constrain \"peak_ana\": sum(d in days, s in slots: x[\"ana\", d, s]) <= peak;".into()),
    );
    f.translator.push(
        "ben works at most two slots",
        Ok("peak = continuous[] in [0, 2]; constrain \"peak_ben\": sum(d in days, s in slots: x[\"ben\", d, s]) <= peak;".into()),
    );
    f.add("ana works at most two slots");
    f.add("ben works at most two slots");

    let summary = f.rebuild();

    assert_eq!(summary.committed, vec!["ana works at most two slots"]);
    assert_eq!(summary.failed.len(), 1);
    let instance = f.driver.instance_mut().unwrap();
    let outcome = f.registry.commit("ben works at most two slots", instance);
    let err = outcome.into_result("ben works at most two slots").unwrap_err();
    assert!(matches!(err, RotaForgeError::CommitMismatch { .. }));
    assert!(f.registry.get("ben works at most two slots").unwrap().is_active());
}
