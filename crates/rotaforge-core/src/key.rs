//! Index tuples addressing decision variables.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One component of a variable key: an entity id or a numeric index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Int(i64),
    Str(String),
}

impl KeyPart {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyPart::Int(n) => Some(*n),
            KeyPart::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyPart::Str(s) => Some(s),
            KeyPart::Int(_) => None,
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Int(n) => write!(f, "{}", n),
            KeyPart::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<usize> for KeyPart {
    fn from(n: usize) -> Self {
        KeyPart::Int(n as i64)
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

/// A tuple key `(entity_id..., day_index, slot_index)` into a variable container.
///
/// Most keys have three or four parts, so they are stored inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarKey(SmallVec<[KeyPart; 4]>);

impl VarKey {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn from_parts(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        Self(parts.into_iter().collect())
    }

    pub fn push(&mut self, part: KeyPart) {
        self.0.push(part);
    }

    /// Returns a copy of this key with `part` inserted in front.
    pub fn prefixed(&self, part: KeyPart) -> Self {
        let mut parts: SmallVec<[KeyPart; 4]> = SmallVec::with_capacity(self.0.len() + 1);
        parts.push(part);
        parts.extend(self.0.iter().cloned());
        Self(parts)
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn get(&self, idx: usize) -> Option<&KeyPart> {
        self.0.get(idx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the last `n` parts, typically the `(day, slot)` suffix.
    pub fn suffix(&self, n: usize) -> &[KeyPart] {
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}

impl FromIterator<KeyPart> for VarKey {
    fn from_iter<I: IntoIterator<Item = KeyPart>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds a [`VarKey`] from heterogeneous parts.
///
/// ```
/// use rotaforge_core::{var_key, KeyPart};
///
/// let key = var_key!["ana", 0i64, 1i64];
/// assert_eq!(key.get(0), Some(&KeyPart::Str("ana".into())));
/// assert_eq!(key.to_string(), "(ana, 0, 1)");
/// ```
#[macro_export]
macro_rules! var_key {
    ($($part:expr),* $(,)?) => {
        $crate::VarKey::from_parts([$($crate::KeyPart::from($part)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = var_key!["a", 0i64, 1i64];
        let b = var_key!["a", 1i64, 0i64];
        let c = var_key!["b", 0i64, 0i64];
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_prefixed_and_suffix() {
        let key = var_key!["ana", 2i64, 1i64];
        let prefixed = key.prefixed(KeyPart::from("x_day"));
        assert_eq!(prefixed.len(), 4);
        assert_eq!(prefixed.get(0).and_then(KeyPart::as_str), Some("x_day"));
        assert_eq!(key.suffix(2), &[KeyPart::Int(2), KeyPart::Int(1)]);
        assert_eq!(key.suffix(10).len(), 3);
    }

    #[test]
    fn test_json_shape() {
        let key = var_key!["ana", 0i64];
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["ana",0]"#);
        let back: VarKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
