//! Tests for specification parsing and validation.

use super::*;

const THREE_STAFF: &str = r#"{
    "variables": { "days": 2, "slots": 2, "slot_labels": ["day", "night"], "staff": ["ana", "ben", "cy"] },
    "resources": { "vehicles": 2 },
    "decision_variable_code": "x = binary[staff, days, slots];"
}"#;

#[test]
fn test_parse_external_shape() {
    let spec = ProblemSpecification::from_json_str(THREE_STAFF).unwrap();

    assert_eq!(spec.horizon().day_count, 2);
    assert_eq!(spec.horizon().slot_count, 2);
    assert_eq!(spec.horizon().slot_label(1), "night");
    assert_eq!(
        spec.entity_list("staff"),
        Some(&["ana".to_string(), "ben".to_string(), "cy".to_string()][..])
    );
    assert_eq!(spec.resource_capacities().get("vehicles"), Some(&2));
    assert!(spec.objective_schema().is_none());
}

#[test]
fn test_count_expands_to_ids() {
    let json = r#"{
        "variables": { "days": 1, "slots": 2, "num_crew": 3 },
        "decision_variable_code": "x = binary[crew, days, slots];"
    }"#;
    let spec = ProblemSpecification::from_json_str(json).unwrap();

    assert_eq!(
        spec.entity_list("crew").unwrap(),
        &["crew_0".to_string(), "crew_1".to_string(), "crew_2".to_string()]
    );
    assert_eq!(spec.horizon().slot_label(0), "Slot 0");
}

#[test]
fn test_blank_objective_is_absent() {
    let json = r#"{
        "variables": { "days": 1, "slots": 1, "staff": ["a"] },
        "decision_variable_code": "x = binary[staff, days, slots];",
        "objective_code": "   "
    }"#;
    let spec = ProblemSpecification::from_json_str(json).unwrap();
    assert!(spec.objective_schema().is_none());
}

#[test]
fn test_zero_days_rejected() {
    let json = r#"{
        "variables": { "days": 0, "slots": 2, "staff": ["a"] },
        "decision_variable_code": "x = binary[staff, days, slots];"
    }"#;
    let err = ProblemSpecification::from_json_str(json).unwrap_err();
    assert!(matches!(err, RotaForgeError::Specification(_)));
}

#[test]
fn test_label_count_mismatch_rejected() {
    let spec = ProblemSpecification::new(
        Horizon::new(1, 2).with_slot_labels(vec!["only one".into()]),
        "x = binary[staff, days, slots];",
    )
    .with_entity_list("staff", ["a"]);

    assert!(spec.validate().is_err());
}

#[test]
fn test_reserved_entity_name_rejected() {
    let spec = ProblemSpecification::new(Horizon::new(1, 1), "x = binary[days];")
        .with_entity_list("days", ["a"]);

    let err = spec.validate().unwrap_err();
    assert!(err.to_string().contains("reserved"));
}

#[test]
fn test_duplicate_ids_rejected() {
    let spec = ProblemSpecification::new(Horizon::new(1, 1), "x = binary[staff];")
        .with_entity_list("staff", ["a", "a"]);

    assert!(spec.validate().is_err());
}

#[test]
fn test_empty_schema_is_schema_error() {
    let spec = ProblemSpecification::new(Horizon::new(1, 1), "  ").with_entity_list("staff", ["a"]);

    assert!(matches!(spec.validate(), Err(RotaForgeError::Schema(_))));
}
