//! Item identifiers
//!
//! Identifiers are opaque strings. Anything non-empty parses; freshly generated
//! ids use the format `i-{7-char-hash}` (e.g. `i-7f2b4c1`).
//!
//! Hash is derived from a seed (usually the source id or title), the current
//! timestamp and a per-generator counter, so two clones of the same item made in
//! the same instant still get different ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid item ID: must not be empty")]
    Empty,

    #[error("Invalid item ID: '{0}' contains whitespace")]
    Whitespace(String),
}

/// Generates a 7-character hash from a seed, timestamp and counter
fn generate_hash(seed: &str, timestamp: DateTime<Utc>, counter: u64) -> String {
    let input = format!(
        "{}{}{}",
        seed,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        counter
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Opaque, stable identifier of an outline item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ItemId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for ItemId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Source of fresh identifiers for new and cloned items
pub trait IdGenerator {
    /// Returns an id that has not been handed out by this generator before
    fn next_id(&mut self, seed: &str) -> ItemId;
}

/// Hash-based generator producing `i-{7-char-hash}` ids
///
/// Ids listed in `taken` are never returned, which keeps fresh ids disjoint
/// from the snapshot they are pasted into.
#[derive(Debug, Default)]
pub struct HashIds {
    counter: u64,
    taken: HashSet<ItemId>,
}

impl HashIds {
    /// Creates a generator with no reserved ids
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that avoids every id in `taken`
    pub fn avoiding<'a>(taken: impl IntoIterator<Item = &'a ItemId>) -> Self {
        Self {
            counter: 0,
            taken: taken.into_iter().cloned().collect(),
        }
    }
}

impl IdGenerator for HashIds {
    fn next_id(&mut self, seed: &str) -> ItemId {
        loop {
            self.counter += 1;
            let id = ItemId(format!("i-{}", generate_hash(seed, Utc::now(), self.counter)));
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Deterministic generator producing `{prefix}{n}` ids
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, _seed: &str) -> ItemId {
        let id = ItemId(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_opaque_strings() {
        let id: ItemId = "M1".parse().unwrap();
        assert_eq!(id.as_str(), "M1");

        let id: ItemId = "  550e8400-e29b-41d4  ".parse().unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!("".parse::<ItemId>(), Err(IdError::Empty));
        assert_eq!("   ".parse::<ItemId>(), Err(IdError::Empty));
        assert!(matches!(
            "a b".parse::<ItemId>(),
            Err(IdError::Whitespace(_))
        ));
    }

    #[test]
    fn hash_ids_have_expected_format() {
        let mut ids = HashIds::new();
        let id = ids.next_id("Task");
        let s = id.to_string();

        assert!(s.starts_with("i-"));
        assert_eq!(s.len(), 9);
        assert!(s[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_ids_are_unique_for_same_seed() {
        let mut ids = HashIds::new();
        let generated: HashSet<_> = (0..500).map(|_| ids.next_id("same")).collect();
        assert_eq!(generated.len(), 500);
    }

    #[test]
    fn hash_ids_avoid_taken() {
        let existing: Vec<ItemId> = vec!["M1".parse().unwrap(), "D1".parse().unwrap()];
        let mut ids = HashIds::avoiding(&existing);
        for _ in 0..50 {
            let id = ids.next_id("M1");
            assert!(!existing.contains(&id));
        }
    }

    #[test]
    fn sequential_ids() {
        let mut ids = SequentialIds::new("n");
        assert_eq!(ids.next_id("x").as_str(), "n1");
        assert_eq!(ids.next_id("x").as_str(), "n2");
    }

    #[test]
    fn serde_roundtrip_item_id() {
        let original: ItemId = "D1".parse().unwrap();
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"D1\"");
        let parsed: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn serde_rejects_empty_id() {
        assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
    }
}
