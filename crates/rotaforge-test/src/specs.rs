//! Problem specifications used across the test suites.

use rotaforge_core::{Horizon, ProblemSpecification};

/// Schema declaring `x[entity, day, slot]` over the `staff` list.
pub const STAFF_SCHEMA: &str = "x = binary[staff, days, slots];";

/// Three people, two days, two slots (`day`, `night`).
pub fn three_by_two_by_two() -> ProblemSpecification {
    ProblemSpecification::new(
        Horizon::new(2, 2).with_slot_labels(vec!["day".into(), "night".into()]),
        STAFF_SCHEMA,
    )
    .with_entity_list("staff", ["ana", "ben", "cy"])
}

/// Nine emergency crews over `days` days with `morning`/`night` slots and two
/// vehicles.
pub fn emergency(days: usize) -> ProblemSpecification {
    emergency_crews(days, 9)
}

/// [`emergency`] with `crews` crews.
pub fn emergency_crews(days: usize, crews: usize) -> ProblemSpecification {
    ProblemSpecification::new(
        Horizon::new(days, 2).with_slot_labels(vec!["morning".into(), "night".into()]),
        "x = binary[crew, days, slots];",
    )
    .with_entity_list("crew", (0..crews).map(|i| format!("crew_{}", i)))
    .with_resource("vehicles", 2)
}

/// Three people with separate day and night containers, unioned as the primary.
pub fn split_containers() -> ProblemSpecification {
    ProblemSpecification::new(
        Horizon::new(2, 1),
        "x_day = binary[staff, days];\nx_night = binary[staff, days];",
    )
    .with_entity_list("staff", ["ana", "ben", "cy"])
}

/// The external JSON shape of [`three_by_two_by_two`].
pub const THREE_BY_TWO_BY_TWO_JSON: &str = r#"{
    "variables": {
        "days": 2,
        "slots": 2,
        "slot_labels": ["day", "night"],
        "staff": ["ana", "ben", "cy"]
    },
    "resources": {},
    "decision_variable_code": "x = binary[staff, days, slots];",
    "objective_code": null
}"#;
