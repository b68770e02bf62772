//! The planning problem specification.
//!
//! A [`ProblemSpecification`] is immutable once built. It is usually produced from a
//! [`SpecificationInput`] (the external JSON shape) through `TryFrom`.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RotaForgeError};

/// Symbols the expression language binds itself; entity lists and resources may not
/// shadow them.
pub const RESERVED_SYMBOLS: &[&str] = &[
    "x",
    "days",
    "slots",
    "num_days",
    "num_slots",
    "slot_labels",
    "sum",
    "range",
    "len",
    "min",
    "max",
    "abs",
    "let",
    "for",
    "in",
    "if",
    "else",
    "where",
    "and",
    "or",
    "not",
    "constrain",
    "minimize",
    "maximize",
    "binary",
    "integer",
    "continuous",
    "true",
    "false",
];

/// Planning horizon: `day_count` days with `slot_count` slots each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub day_count: usize,
    pub slot_count: usize,
    pub slot_labels: Vec<String>,
}

impl Horizon {
    /// Creates a horizon with default slot labels (`Slot 0`, `Slot 1`, ...).
    pub fn new(day_count: usize, slot_count: usize) -> Self {
        Self {
            day_count,
            slot_count,
            slot_labels: (0..slot_count).map(|s| format!("Slot {}", s)).collect(),
        }
    }

    pub fn with_slot_labels(mut self, labels: Vec<String>) -> Self {
        self.slot_labels = labels;
        self
    }

    /// Returns the label of a slot, falling back to its index.
    pub fn slot_label(&self, slot: usize) -> String {
        self.slot_labels
            .get(slot)
            .cloned()
            .unwrap_or_else(|| format!("Slot {}", slot))
    }
}

/// Immutable description of a planning problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSpecification {
    horizon: Horizon,
    entity_lists: BTreeMap<String, Vec<String>>,
    resource_capacities: BTreeMap<String, i64>,
    decision_variable_schema: String,
    objective_schema: Option<String>,
}

impl ProblemSpecification {
    /// Creates a specification with no entity lists or resources.
    pub fn new(horizon: Horizon, decision_variable_schema: impl Into<String>) -> Self {
        Self {
            horizon,
            entity_lists: BTreeMap::new(),
            resource_capacities: BTreeMap::new(),
            decision_variable_schema: decision_variable_schema.into(),
            objective_schema: None,
        }
    }

    /// Adds an ordered entity id list.
    pub fn with_entity_list<I, S>(mut self, name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_lists
            .insert(name.into(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a named resource capacity.
    pub fn with_resource(mut self, name: impl Into<String>, capacity: i64) -> Self {
        self.resource_capacities.insert(name.into(), capacity);
        self
    }

    /// Sets the objective source.
    pub fn with_objective(mut self, objective_schema: impl Into<String>) -> Self {
        self.objective_schema = Some(objective_schema.into());
        self
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn entity_lists(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entity_lists
    }

    pub fn entity_list(&self, name: &str) -> Option<&[String]> {
        self.entity_lists.get(name).map(Vec::as_slice)
    }

    pub fn resource_capacities(&self) -> &BTreeMap<String, i64> {
        &self.resource_capacities
    }

    pub fn decision_variable_schema(&self) -> &str {
        &self.decision_variable_schema
    }

    pub fn objective_schema(&self) -> Option<&str> {
        self.objective_schema.as_deref()
    }

    /// Parses and validates a specification from the external JSON shape.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let input: SpecificationInput = serde_json::from_str(s)
            .map_err(|e| RotaForgeError::Specification(format!("invalid JSON: {}", e)))?;
        Self::try_from(input)
    }

    /// Checks the structural invariants of the specification.
    pub fn validate(&self) -> Result<()> {
        if self.horizon.day_count == 0 {
            return Err(RotaForgeError::Specification(
                "horizon must contain at least one day".into(),
            ));
        }
        if self.horizon.slot_count == 0 {
            return Err(RotaForgeError::Specification(
                "horizon must contain at least one slot per day".into(),
            ));
        }
        if self.horizon.slot_labels.len() != self.horizon.slot_count {
            return Err(RotaForgeError::Specification(format!(
                "{} slot labels given for {} slots",
                self.horizon.slot_labels.len(),
                self.horizon.slot_count
            )));
        }
        if self.decision_variable_schema.trim().is_empty() {
            return Err(RotaForgeError::Schema(
                "decision variable schema is empty".into(),
            ));
        }

        for (name, ids) in &self.entity_lists {
            check_symbol(name)?;
            if ids.is_empty() {
                return Err(RotaForgeError::Specification(format!(
                    "entity list '{}' is empty",
                    name
                )));
            }
            let mut seen = std::collections::BTreeSet::new();
            for id in ids {
                if !seen.insert(id) {
                    return Err(RotaForgeError::Specification(format!(
                        "entity list '{}' repeats id '{}'",
                        name, id
                    )));
                }
            }
        }
        for name in self.resource_capacities.keys() {
            check_symbol(name)?;
            if self.entity_lists.contains_key(name) {
                return Err(RotaForgeError::Specification(format!(
                    "'{}' is both an entity list and a resource",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn check_symbol(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(RotaForgeError::Specification(format!(
            "'{}' is not a valid symbol name",
            name
        )));
    }
    if RESERVED_SYMBOLS.contains(&name) || name.starts_with("num_") {
        return Err(RotaForgeError::Specification(format!(
            "'{}' is a reserved symbol",
            name
        )));
    }
    Ok(())
}

/// The external specification shape.
///
/// ```json
/// {
///   "variables": { "days": 2, "slots": 2, "staff": ["ana", "ben", "cy"] },
///   "resources": { "vehicles": 2 },
///   "decision_variable_code": "x = binary[staff, days, slots];",
///   "objective_code": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificationInput {
    pub variables: VariablesInput,
    #[serde(default)]
    pub resources: BTreeMap<String, i64>,
    pub decision_variable_code: String,
    #[serde(default)]
    pub objective_code: Option<String>,
}

/// Horizon fields plus per-entity id lists.
///
/// Any key other than the horizon fields is an entity list: either a list of ids
/// or, for keys named `num_<name>`, a count expanded to `<name>_0`, `<name>_1`, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariablesInput {
    #[serde(alias = "day_count")]
    pub days: usize,
    #[serde(alias = "slot_count")]
    pub slots: usize,
    #[serde(default)]
    pub slot_labels: Vec<String>,
    #[serde(flatten)]
    pub entities: BTreeMap<String, Value>,
}

impl TryFrom<SpecificationInput> for ProblemSpecification {
    type Error = RotaForgeError;

    fn try_from(input: SpecificationInput) -> Result<Self> {
        let vars = input.variables;
        let mut horizon = Horizon::new(vars.days, vars.slots);
        if !vars.slot_labels.is_empty() {
            horizon = horizon.with_slot_labels(vars.slot_labels);
        }

        let mut spec = ProblemSpecification::new(horizon, input.decision_variable_code);
        for (key, value) in vars.entities {
            let (name, ids) = entity_list_from_value(&key, &value)?;
            spec = spec.with_entity_list(name, ids);
        }
        for (name, capacity) in input.resources {
            spec = spec.with_resource(name, capacity);
        }
        if let Some(objective) = input.objective_code {
            if !objective.trim().is_empty() {
                spec = spec.with_objective(objective);
            }
        }

        spec.validate()?;
        Ok(spec)
    }
}

fn entity_list_from_value(key: &str, value: &Value) -> Result<(String, Vec<String>)> {
    match value {
        Value::Array(items) => {
            let ids = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(RotaForgeError::Specification(format!(
                        "entity list '{}' contains unsupported id {}",
                        key, other
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((key.to_string(), ids))
        }
        Value::Number(n) => {
            let Some(name) = key.strip_prefix("num_") else {
                return Err(RotaForgeError::Specification(format!(
                    "count '{}' must be named num_<entity>",
                    key
                )));
            };
            let count = n.as_u64().ok_or_else(|| {
                RotaForgeError::Specification(format!("count '{}' must be a non-negative integer", key))
            })?;
            let ids = (0..count).map(|i| format!("{}_{}", name, i)).collect();
            Ok((name.to_string(), ids))
        }
        other => Err(RotaForgeError::Specification(format!(
            "unsupported value for '{}': {}",
            key, other
        ))),
    }
}
