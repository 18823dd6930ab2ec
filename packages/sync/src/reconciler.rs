//! # Synchronization Reconciler
//!
//! Bridges the store's change log and a host transport, one instance per
//! document view.
//!
//! Outbound, changes coalesce per record id into a pending patch and are
//! published through the throttle: the base window for idle edits, the
//! per-frame window while any pending record is mid-gesture. Removals
//! ride along as tombstone records.
//!
//! Inbound, every entry is migrated, then merged under last-write-wins:
//! records stamped by this writer are echoes and are skipped, records not
//! strictly newer than the local copy lose, tombstones that win remove
//! the record physically. Containers touched by the merge reflow once at
//! the end.

use crate::errors::SyncError;
use crate::migrate::migrate;
use crate::throttle::Throttle;
use crate::transport::{Patch, Transport};
use pagestack_common::RecordId;
use pagestack_layout::{capability, LayoutEngine};
use pagestack_store::{Record, Store};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct Reconciler {
    document_id: String,
    pending: HashMap<RecordId, Record>,
    throttle: Throttle,
}

impl Reconciler {
    pub fn new(document_id: impl Into<String>, throttle: Duration) -> Self {
        Reconciler {
            document_id: document_id.into(),
            pending: HashMap::new(),
            throttle: Throttle::new(throttle),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the store's change log into the pending patch. Local
    /// stamping is monotonic per id, so the entry with the highest
    /// version is the latest write regardless of which change-set
    /// category it sits in; a delete-then-recreate of one id in a single
    /// batch coalesces to the re-created record, not the tombstone.
    pub fn collect(&mut self, store: &mut Store) {
        for set in store.drain_changes() {
            for record in set.added {
                self.coalesce(record);
            }
            for (_, after) in set.updated {
                self.coalesce(after);
            }
            for tombstone in set.removed {
                self.coalesce(tombstone);
            }
        }
    }

    fn coalesce(&mut self, record: Record) {
        match self.pending.get(&record.id) {
            Some(seen) if record.meta.version < seen.meta.version => {}
            _ => {
                self.pending.insert(record.id.clone(), record);
            }
        }
    }

    /// Publish the pending patch if the throttle window has elapsed.
    pub fn flush_due(
        &mut self,
        transport: &mut dyn Transport,
        now: Instant,
    ) -> Result<bool, SyncError> {
        if self.pending.is_empty() {
            return Ok(false);
        }
        let active = self
            .pending
            .values()
            .any(|r| r.meta.is_actively_manipulated());
        if !self.throttle.ready(now, active) {
            return Ok(false);
        }
        self.publish(transport, now)
    }

    /// Publish regardless of the throttle (teardown path).
    pub fn flush_now(
        &mut self,
        transport: &mut dyn Transport,
        now: Instant,
    ) -> Result<bool, SyncError> {
        if self.pending.is_empty() {
            return Ok(false);
        }
        self.publish(transport, now)
    }

    fn publish(
        &mut self,
        transport: &mut dyn Transport,
        now: Instant,
    ) -> Result<bool, SyncError> {
        let mut patch = Patch::new();
        for (id, record) in &self.pending {
            patch.insert(id.clone(), serde_json::to_value(record)?);
        }
        transport.publish(&self.document_id, &patch);
        debug!(
            document = %self.document_id,
            records = patch.len(),
            "published outbound patch"
        );
        self.pending.clear();
        self.throttle.mark(now);
        Ok(true)
    }

    /// Merge an inbound state map into the store.
    pub fn apply_remote(
        &self,
        store: &mut Store,
        engine: &mut LayoutEngine,
        state: &Value,
    ) -> Result<(), SyncError> {
        let Some(entries) = state.as_object() else {
            return Ok(());
        };

        let mut dirty: Vec<RecordId> = Vec::new();
        store.merge_remote(|store| -> Result<(), SyncError> {
            for value in entries.values() {
                if value.is_null() {
                    continue;
                }
                let record: Record = serde_json::from_value(migrate(value.clone()))?;
                if record.meta.source == store.writer_id() {
                    continue;
                }
                let id = record.id.clone();
                match store.get(&id) {
                    Some(local) => {
                        if record.meta.version <= local.meta.version {
                            continue;
                        }
                    }
                    // a tombstone for a record we never had is a no-op
                    None if record.meta.deleted => continue,
                    None => {}
                }

                if record.meta.deleted {
                    if let Some(local) = store.get(&id) {
                        if let Some(props) = local.edge_props() {
                            dirty.push(props.from_id.clone());
                        } else if is_container_id(store, &local.parent_id) {
                            dirty.push(local.parent_id.clone());
                        }
                    }
                    store.delete_records(std::slice::from_ref(&id));
                    continue;
                }

                if let Some(props) = record.edge_props() {
                    dirty.push(props.from_id.clone());
                }
                if capability::is_container(record.ty()) {
                    dirty.push(id.clone());
                }
                if is_container_id(store, &record.parent_id) {
                    dirty.push(record.parent_id.clone());
                }
                store.put(record);
            }
            Ok(())
        })?;

        for id in dirty {
            engine.schedule(id);
        }
        engine.flush(store);
        Ok(())
    }
}

fn is_container_id(store: &Store, id: &RecordId) -> bool {
    store
        .get(id)
        .is_some_and(|r| capability::is_container(r.ty()))
}
