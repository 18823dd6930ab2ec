//! Transport boundary.
//!
//! Outbound only: the engine hands coalesced record patches to a host
//! transport and never sees wires, sockets, or retries. Removals travel
//! as full tombstone records (`meta.deleted`, bumped version) so the
//! receiving side can version-gate deletions like any other write.
//! Inbound state arrives by the host calling `Session::remote_state`.

use pagestack_common::RecordId;
use serde_json::Value;
use std::collections::HashMap;

/// One coalesced outbound publish: latest wire value per record.
pub type Patch = HashMap<RecordId, Value>;

pub trait Transport {
    fn publish(&mut self, document_id: &str, patch: &Patch);
}

/// In-memory transport double: records every publish and can replay
/// them as a single state map for a receiving session.
#[derive(Debug, Default)]
pub struct ChannelTransport {
    published: Vec<(String, Patch)>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> &[(String, Patch)] {
        &self.published
    }

    /// All publishes coalesced in order, newest value per record winning.
    pub fn state(&self) -> Value {
        let mut merged = serde_json::Map::new();
        for (_, patch) in &self.published {
            for (id, value) in patch {
                merged.insert(id.as_str().to_string(), value.clone());
            }
        }
        Value::Object(merged)
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Transport for ChannelTransport {
    fn publish(&mut self, document_id: &str, patch: &Patch) {
        self.published
            .push((document_id.to_string(), patch.clone()));
    }
}
