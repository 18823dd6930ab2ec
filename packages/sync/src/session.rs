//! # Session
//!
//! One document view: a store, its layout engine, and the reconciler
//! wired together. The host owns the event loop and drives the session
//! with `remote_state` when inbound data arrives and `tick` on its own
//! cadence; everything else is synchronous mutation through the store
//! and gesture APIs.

use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::migrate::migrate;
use crate::reconciler::Reconciler;
use crate::transport::Transport;
use pagestack_layout::{capability, LayoutEngine};
use pagestack_store::{Record, Store};
use serde_json::Value;
use std::time::Instant;
use tracing::info;

pub struct Session {
    store: Store,
    engine: LayoutEngine,
    reconciler: Reconciler,
}

impl Session {
    pub fn new(
        config: &SyncConfig,
        writer_id: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        let document_id = document_id.into();
        Session {
            store: Store::new(writer_id),
            engine: LayoutEngine::new(),
            reconciler: Reconciler::new(document_id, config.throttle),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine {
        &mut self.engine
    }

    pub fn parts_mut(&mut self) -> (&mut Store, &mut LayoutEngine) {
        (&mut self.store, &mut self.engine)
    }

    /// Seed the store from a persisted state map: migrate every entry,
    /// drop tombstoned and null ones, and merge without echoing.
    pub fn load_snapshot(&mut self, state: &Value) -> Result<(), SyncError> {
        let Some(entries) = state.as_object() else {
            return Ok(());
        };
        let mut containers = Vec::new();
        self.store.merge_remote(|store| -> Result<(), SyncError> {
            for value in entries.values() {
                if value.is_null() {
                    continue;
                }
                let record: Record = serde_json::from_value(migrate(value.clone()))?;
                if record.meta.deleted {
                    continue;
                }
                if capability::is_container(record.ty()) {
                    containers.push(record.id.clone());
                }
                store.put(record);
            }
            Ok(())
        })?;
        info!(
            document = self.reconciler.document_id(),
            records = self.store.len(),
            "loaded snapshot"
        );
        for id in containers {
            self.engine.schedule(id);
        }
        self.engine.flush(&mut self.store);
        Ok(())
    }

    /// Merge an inbound state map from a peer.
    pub fn remote_state(&mut self, state: &Value) -> Result<(), SyncError> {
        self.reconciler
            .apply_remote(&mut self.store, &mut self.engine, state)
    }

    /// One host-loop tick: settle pending reflows, then publish local
    /// changes if the throttle allows.
    pub fn tick(
        &mut self,
        transport: &mut dyn Transport,
        now: Instant,
    ) -> Result<bool, SyncError> {
        self.engine.flush(&mut self.store);
        self.reconciler.collect(&mut self.store);
        self.reconciler.flush_due(transport, now)
    }

    /// Teardown: push whatever is still pending, ignoring the throttle.
    pub fn close(
        &mut self,
        transport: &mut dyn Transport,
        now: Instant,
    ) -> Result<(), SyncError> {
        self.engine.flush(&mut self.store);
        self.reconciler.collect(&mut self.store);
        self.reconciler.flush_now(transport, now)?;
        Ok(())
    }
}
