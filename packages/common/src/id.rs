//! Record identifiers.
//!
//! Every addressable entity in a document (shapes, containers, layout
//! edges) is keyed by an opaque `RecordId`. Ids are never reused and never
//! change across migrations or sync; root-level records point at the
//! `RecordId::root()` sentinel as their parent.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const ROOT: &str = "root";

/// Opaque unique id for a document record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh unique id.
    pub fn new() -> Self {
        RecordId(Uuid::new_v4().to_string())
    }

    /// The sentinel parent of root-level records.
    pub fn root() -> Self {
        RecordId(ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn root_sentinel_round_trips() {
        let root = RecordId::root();
        assert!(root.is_root());
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(json, "\"root\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert!(back.is_root());
    }
}
