//! Out-of-band record bookkeeping.
//!
//! `Meta` travels with every record across the sync boundary. The
//! `(source, version)` pair is the optimistic-concurrency token: `source`
//! names the writer that authored the latest write and `version` is that
//! writer's monotonically increasing per-record counter. The transient
//! flags are ordinary versioned fields; readers must treat staleness as
//! normal, and the gesture code paths always clear them on end/cancel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    /// Writer id that produced the most recent write.
    pub source: String,

    /// Per-record counter assigned by that writer.
    pub version: u64,

    /// Tombstone flag; deletion is conveyed, never elided.
    #[serde(skip_serializing_if = "is_false")]
    pub deleted: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub is_dragging: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub is_dragging_over: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub is_transforming: bool,
}

impl Meta {
    /// True while the record is under an active pointer gesture.
    pub fn is_actively_manipulated(&self) -> bool {
        self.is_dragging || self.is_transforming
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_flags_serialize_only_when_set() {
        let meta = Meta {
            source: "w1".to_string(),
            version: 3,
            ..Meta::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["source"], "w1");
        assert_eq!(json["version"], 3);
        assert!(json.get("isDragging").is_none());
        assert!(json.get("deleted").is_none());

        let dragging = Meta {
            is_dragging: true,
            ..meta
        };
        let json = serde_json::to_value(&dragging).unwrap();
        assert_eq!(json["isDragging"], true);
    }
}
