//! Change sets emitted by the store.
//!
//! One `ChangeSet` is committed per top-level batch, never per record, so
//! observers only ever see settled states. The store's change log is the
//! append-only sequence of these sets; the sync reconciler drains it.

use crate::record::Record;
use pagestack_common::RecordId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub added: Vec<Record>,
    /// `(before, after)` pairs.
    pub updated: Vec<(Record, Record)>,
    /// Removed records, already stamped as tombstones.
    pub removed: Vec<Record>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Ids touched by this set, in no particular order.
    pub fn touched_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = Vec::new();
        ids.extend(self.added.iter().map(|r| r.id.clone()));
        ids.extend(self.updated.iter().map(|(_, after)| after.id.clone()));
        ids.extend(self.removed.iter().map(|r| r.id.clone()));
        ids
    }
}
