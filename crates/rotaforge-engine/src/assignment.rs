//! Realized assignments extracted from a solved model.

use rotaforge_core::{KeyPart, VarKey};
use rotaforge_expr::VarContainer;
use rotaforge_milp::Model;
use serde::Serialize;

/// Threshold above which a binary decision variable counts as assigned.
pub const DEFAULT_ROUNDING_THRESHOLD: f64 = 0.5;

/// Decision variable keys of the primary container whose value exceeds the
/// rounding threshold, in container key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assignment {
    entries: Vec<(VarKey, f64)>,
    entity_part: usize,
}

/// One assigned key, decoded as entity, day and slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shift {
    /// Source container when the primary container is a union.
    pub container: Option<String>,
    pub entity: String,
    pub day: Option<i64>,
    pub slot: Option<i64>,
}

impl Assignment {
    /// Reads `primary` from the last solution of `model`.
    ///
    /// Returns `None` when the model holds no solution.
    pub fn extract(model: &Model, primary: &VarContainer, threshold: f64, entity_part: usize) -> Option<Self> {
        let values = model.values()?;
        let entries = primary
            .iter()
            .filter_map(|(key, var)| {
                let value = values.get(var.index()).copied()?;
                (value > threshold).then(|| (key.clone(), value))
            })
            .collect();
        Some(Self {
            entries,
            entity_part,
        })
    }

    pub fn entries(&self) -> &[(VarKey, f64)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &VarKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn value(&self, key: &VarKey) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the entity id in each key.
    pub fn entity_part(&self) -> usize {
        self.entity_part
    }

    /// Decodes keys as `(container?, entity, day?, slot?)`.
    pub fn shifts(&self) -> Vec<Shift> {
        self.keys().filter_map(|key| self.decode(key)).collect()
    }

    /// Number of assigned keys with the given day and slot.
    pub fn count_at(&self, day: i64, slot: i64) -> usize {
        self.shifts()
            .iter()
            .filter(|s| s.day == Some(day) && s.slot == Some(slot))
            .count()
    }

    fn decode(&self, key: &VarKey) -> Option<Shift> {
        let container = match self.entity_part {
            0 => None,
            _ => key.get(0).map(ToString::to_string),
        };
        let entity = key.get(self.entity_part)?.to_string();
        let int_at = |i: usize| key.get(i).and_then(KeyPart::as_int);
        Some(Shift {
            container,
            entity,
            day: int_at(self.entity_part + 1),
            slot: int_at(self.entity_part + 2),
        })
    }
}
