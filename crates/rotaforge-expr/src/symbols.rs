//! Symbols a program may read, bound from a problem specification.

use std::collections::BTreeMap;

use rotaforge_core::ProblemSpecification;

use crate::value::Value;

/// Read-only bindings derived from a [`ProblemSpecification`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Symbols {
    values: BTreeMap<String, Value>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds entity lists, their `num_` counts, the horizon and resource capacities.
    pub fn from_spec(spec: &ProblemSpecification) -> Self {
        let mut symbols = Self::new();
        let horizon = spec.horizon();
        let indices = |n: usize| Value::List((0..n as i64).map(Value::Int).collect());

        symbols.bind("days", indices(horizon.day_count));
        symbols.bind("slots", indices(horizon.slot_count));
        symbols.bind("num_days", Value::Int(horizon.day_count as i64));
        symbols.bind("num_slots", Value::Int(horizon.slot_count as i64));
        symbols.bind(
            "slot_labels",
            Value::List(horizon.slot_labels.iter().cloned().map(Value::Str).collect()),
        );
        for (name, ids) in spec.entity_lists() {
            symbols.bind(name, Value::List(ids.iter().cloned().map(Value::Str).collect()));
            symbols.bind(format!("num_{}", name), Value::Int(ids.len() as i64));
        }
        for (name, capacity) in spec.resource_capacities() {
            symbols.bind(name, Value::Int(*capacity));
        }
        symbols
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
