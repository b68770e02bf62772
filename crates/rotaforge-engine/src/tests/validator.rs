use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::RotaForgeError;
use rotaforge_test::{snippets, specs, ScriptedTranslator};

use super::factory;
use crate::validator::{ConstraintValidator, RETRY_PROMPT};

const COVER: &str = "every slot has one or two people";

fn validator(config: &EngineConfig) -> ConstraintValidator {
    ConstraintValidator::new(factory(specs::three_by_two_by_two()), config)
}

#[test]
fn test_validate_reports_new_identifiers() {
    let v = validator(&EngineConfig::default());
    let result = v.validate(COVER, &snippets::coverage(1, 2));

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.generated_identifiers.len(), 8);
    assert!(result.generated_identifiers.contains("cover_lo_0_0"));
    assert!(result.generated_identifiers.contains("cover_hi_1_1"));
}

#[test]
fn test_validate_unnamed_and_empty_code() {
    let v = validator(&EngineConfig::default());

    let unnamed = v.validate("p", "constrain x[\"ana\", 0, 0] + x[\"ben\", 0, 0] <= 1;");
    assert_eq!(unnamed.generated_identifiers.into_iter().collect::<Vec<_>>(), vec!["R0"]);

    let empty = v.validate("p", snippets::NO_OP);
    assert!(empty.success);
    assert!(empty.generated_identifiers.is_empty());
}

#[test]
fn test_validate_failure_carries_error_text() {
    let v = validator(&EngineConfig::default());
    let result = v.validate("p", snippets::UNKNOWN_SYMBOL);

    assert!(!result.success);
    assert!(result.generated_identifiers.is_empty());
    assert!(result.error.unwrap().contains("nurses"));
}

#[test]
fn test_retry_appends_error_and_marks_repaired() {
    let t = ScriptedTranslator::new().with_responses(COVER, [snippets::SYNTAX_ERROR.to_string(), snippets::coverage(1, 2)]);
    let v = validator(&EngineConfig::default());

    let outcome = v.validate_phrase(COVER, &t).unwrap();

    assert_eq!(outcome.attempts(), 2);
    assert!(outcome.repaired());
    assert_eq!(outcome.generated_identifiers().len(), 8);
    let calls = t.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], COVER);
    assert!(calls[1].starts_with(&format!("{}\n\n{}\n", COVER, RETRY_PROMPT)));
}

#[test]
fn test_strict_comparison_is_sent_back_for_repair() {
    const OFF: &str = "ana works less than two slots";
    let strict = "constrain \"ana_cap\": sum(d in days, s in slots: x[\"ana\", d, s]) < 2;";
    let fixed = "constrain \"ana_cap\": sum(d in days, s in slots: x[\"ana\", d, s]) <= 1;";
    let t = ScriptedTranslator::new().with_responses(OFF, [strict, fixed]);
    let v = validator(&EngineConfig::default());

    let outcome = v.validate_phrase(OFF, &t).unwrap();

    assert_eq!(outcome.attempts(), 2);
    assert_eq!(outcome.code(), fixed);
    assert!(t.calls()[1].contains("strict '<' cannot be used in a constraint"));
}

#[test]
fn test_first_attempt_success_is_not_repaired() {
    let t = ScriptedTranslator::new().with_response(COVER, snippets::coverage(1, 2));
    let outcome = validator(&EngineConfig::default())
        .validate_phrase(COVER, &t)
        .unwrap();

    assert_eq!(outcome.attempts(), 1);
    assert!(!outcome.repaired());
    assert_eq!(outcome.text(), COVER);
    assert_eq!(outcome.code(), snippets::coverage(1, 2));
}

#[test]
fn test_attempts_are_bounded() {
    let t = ScriptedTranslator::new().with_response("bad", snippets::UNKNOWN_SYMBOL);
    let v = validator(&EngineConfig::default().with_max_attempts(4));

    let err = v.validate_phrase("bad", &t).unwrap_err();

    match err {
        RotaForgeError::ValidationExhausted { attempts, last_error } => {
            assert_eq!(attempts, 4);
            assert!(last_error.contains("nurses"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.calls_for("bad"), 4);
}

#[test]
fn test_translator_failure_is_not_retried() {
    let t = ScriptedTranslator::new().with_failure("down", "service unavailable");
    let err = validator(&EngineConfig::default())
        .validate_phrase("down", &t)
        .unwrap_err();

    assert_eq!(err, RotaForgeError::Translation("service unavailable".into()));
    assert_eq!(t.calls_for("down"), 1);
}

#[test]
fn test_confirmation_without_approval_stops_after_first_attempt() {
    let t = ScriptedTranslator::new().with_responses(COVER, [snippets::SYNTAX_ERROR.to_string(), snippets::coverage(1, 2)]);
    let v = validator(&EngineConfig::default().with_confirm_resubmission(true));

    let err = v.validate_phrase(COVER, &t).unwrap_err();

    assert!(matches!(err, RotaForgeError::ValidationExhausted { attempts: 1, .. }));
    assert_eq!(t.calls_for(COVER), 1);
}

#[test]
fn test_approval_hook_sees_each_failure() {
    let t = ScriptedTranslator::new().with_responses(COVER, [snippets::SYNTAX_ERROR.to_string(), snippets::coverage(1, 2)]);
    let asked = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&asked);
    let v = validator(&EngineConfig::default().with_confirm_resubmission(true)).with_approval(Arc::new(
        move |phrase: &str, _error: &str, attempt: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            phrase == COVER && attempt == 1
        },
    ));

    let outcome = v.validate_phrase(COVER, &t).unwrap();

    assert_eq!(outcome.attempts(), 2);
    assert_eq!(asked.load(Ordering::SeqCst), 1);
}
