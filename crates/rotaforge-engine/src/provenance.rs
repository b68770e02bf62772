//! Provenance Index: generated constraint identifier to originating phrase.

use std::collections::BTreeMap;

use serde::Serialize;

/// Maps constraint identifiers of one model generation to phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvenanceIndex {
    generation: u64,
    entries: BTreeMap<String, String>,
}

impl ProvenanceIndex {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            entries: BTreeMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(id.into(), text.into());
    }

    pub fn phrase(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Identifiers recorded for `text`, in identifier order.
    pub fn ids_for<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, t)| t.as_str() == text)
            .map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, t)| (id.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the index and moves it to `generation`.
    pub fn clear(&mut self, generation: u64) {
        self.entries.clear();
        self.generation = generation;
    }

    /// Maps identifiers to distinct phrases in first-seen order. Identifiers with
    /// no phrase are returned separately.
    pub fn resolve<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> (Vec<String>, Vec<String>) {
        let mut phrases: Vec<String> = Vec::new();
        let mut unattributed = Vec::new();
        for id in ids {
            match self.phrase(id) {
                Some(text) => {
                    if !phrases.iter().any(|p| p == text) {
                        phrases.push(text.to_string());
                    }
                }
                None => unattributed.push(id.to_string()),
            }
        }
        (phrases, unattributed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dedups_and_splits() {
        let mut index = ProvenanceIndex::new(1);
        index.insert("cover_0", "cover every slot");
        index.insert("cover_1", "cover every slot");
        index.insert("off_ana", "ana is off");

        let (phrases, system) = index.resolve(["cover_1", "balance_hi_ana", "off_ana", "cover_0"]);

        assert_eq!(phrases, vec!["cover every slot", "ana is off"]);
        assert_eq!(system, vec!["balance_hi_ana"]);
        assert_eq!(index.ids_for("cover every slot").collect::<Vec<_>>(), vec!["cover_0", "cover_1"]);
    }

    #[test]
    fn test_clear_moves_generation() {
        let mut index = ProvenanceIndex::new(1);
        index.insert("a", "phrase");
        index.clear(2);

        assert!(index.is_empty());
        assert_eq!(index.generation(), 2);
        assert!(!index.contains("a"));
    }
}
