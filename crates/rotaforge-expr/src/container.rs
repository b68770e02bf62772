//! Index-addressable decision variable containers.

use std::collections::HashMap;

use rotaforge_core::{KeyPart, VarKey};
use rotaforge_milp::{VarId, VarType};

/// A named map from [`VarKey`] to solver variable.
///
/// Iteration follows insertion order, which is the order keys were generated in.
#[derive(Debug, Clone, PartialEq)]
pub struct VarContainer {
    name: String,
    var_type: VarType,
    entries: Vec<(VarKey, VarId)>,
    index: HashMap<VarKey, usize>,
}

impl VarContainer {
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            var_type,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds an entry. Returns false (and keeps the old entry) if the key exists.
    pub fn insert(&mut self, key: VarKey, var: VarId) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, var));
        true
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn get(&self, key: &VarKey) -> Option<VarId> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn contains_key(&self, key: &VarKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, VarId)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &VarKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True for a dimensionless container holding one variable under the empty key.
    pub fn is_scalar(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].0.is_empty()
    }

    /// Merges several containers into one whose keys are prefixed by the source
    /// container's name, in the order the containers are given.
    pub fn union<'a>(name: impl Into<String>, parts: impl IntoIterator<Item = &'a VarContainer>) -> Self {
        let mut parts = parts.into_iter().peekable();
        let var_type = parts.peek().map_or(VarType::Binary, |c| c.var_type);
        let mut merged = VarContainer::new(name, var_type);
        for part in parts {
            let prefix = KeyPart::from(part.name.as_str());
            for (key, var) in part.iter() {
                merged.insert(key.prefixed(prefix.clone()), var);
            }
        }
        merged
    }
}

/// Containers registered on one model, plus the primary container bound to `x`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerSet {
    containers: Vec<VarContainer>,
    primary: Option<VarContainer>,
}

impl ContainerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name under which the primary container is always reachable.
    pub const PRIMARY: &'static str = "x";

    pub fn insert(&mut self, container: VarContainer) {
        self.containers.push(container);
    }

    /// Looks a container up by name; `x` falls back to the primary container.
    pub fn get(&self, name: &str) -> Option<&VarContainer> {
        self.containers
            .iter()
            .find(|c| c.name == name)
            .or_else(|| (name == Self::PRIMARY).then_some(self.primary.as_ref()).flatten())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarContainer> {
        self.containers.iter()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn primary(&self) -> Option<&VarContainer> {
        self.primary.as_ref()
    }

    pub fn set_primary(&mut self, primary: VarContainer) {
        self.primary = Some(primary);
    }

    /// Drops containers registered after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.containers.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use rotaforge_core::var_key;
    use rotaforge_milp::{Model, VarType};

    use super::*;

    #[test]
    fn test_union_prefixes_keys() {
        let mut model = Model::new("union");
        let mut day = VarContainer::new("x_day", VarType::Binary);
        let mut night = VarContainer::new("x_night", VarType::Binary);
        let a = model.add_variable("a", VarType::Binary, 0.0, 1.0).unwrap();
        let b = model.add_variable("b", VarType::Binary, 0.0, 1.0).unwrap();
        day.insert(var_key!["ana", 0i64], a);
        night.insert(var_key!["ana", 0i64], b);

        let all = VarContainer::union("x", [&day, &night]);

        assert_eq!(all.len(), 2);
        assert_eq!(all.get(&var_key!["x_day", "ana", 0i64]), Some(a));
        assert_eq!(all.get(&var_key!["x_night", "ana", 0i64]), Some(b));
    }

    #[test]
    fn test_primary_lookup() {
        let mut set = ContainerSet::new();
        set.insert(VarContainer::new("x_day", VarType::Binary));
        assert!(set.get("x").is_none());

        set.set_primary(VarContainer::new("x_all", VarType::Binary));
        assert_eq!(set.get("x").map(VarContainer::name), Some("x_all"));
        assert_eq!(set.get("x_day").map(VarContainer::name), Some("x_day"));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut model = Model::new("dup");
        let a = model.add_variable("a", VarType::Binary, 0.0, 1.0).unwrap();
        let mut c = VarContainer::new("x", VarType::Binary);
        assert!(c.insert(var_key![0i64], a));
        assert!(!c.insert(var_key![0i64], a));
        assert_eq!(c.len(), 1);
    }
}
