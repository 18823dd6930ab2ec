//! # Containment Graph
//!
//! Typed, ordered relations between containers and children, stored as
//! ordinary `edge` records so bindings sync and tombstone like any other
//! record. Reparenting is modeled as delete-then-create, never an
//! in-place container change, so "current container" is always derivable
//! solely from live edges even when a delete and a create race mid-drag.
//!
//! Every edge mutation schedules a reflow of the edge's container on the
//! [`LayoutEngine`]; this is the only coupling between the graph and the
//! reflow pass.

use crate::errors::LayoutError;
use crate::reflow::LayoutEngine;
use pagestack_common::{key_between, OrderKey, RecordId};
use pagestack_store::{EdgeKind, EdgeProps, Props, Record, Store, StoreError};

/// Partial update for an edge.
#[derive(Debug, Clone, Default)]
pub struct EdgePatch {
    pub order_key: Option<OrderKey>,
    pub placeholder: Option<bool>,
}

/// Ordered outgoing edges of a container, sorted by ordering key with the
/// edge id breaking ties for determinism.
pub fn edges_of(store: &Store, container: &RecordId) -> Vec<Record> {
    let mut edges: Vec<Record> = store
        .records()
        .filter(|r| {
            r.edge_props()
                .is_some_and(|e| &e.from_id == container && e.kind == EdgeKind::Layout)
        })
        .cloned()
        .collect();
    edges.sort_by(|a, b| {
        (a.order_key.as_ref(), &a.id).cmp(&(b.order_key.as_ref(), &b.id))
    });
    edges
}

/// Incoming edges of a child: its current bindings.
pub fn edges_to(store: &Store, child: &RecordId) -> Vec<Record> {
    let mut edges: Vec<Record> = store
        .records()
        .filter(|r| {
            r.edge_props()
                .is_some_and(|e| &e.to_id == child && e.kind == EdgeKind::Layout)
        })
        .cloned()
        .collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    edges
}

/// The at-most-one live edge for a (container, child) pair.
pub fn edge_between(store: &Store, container: &RecordId, child: &RecordId) -> Option<Record> {
    edges_of(store, container)
        .into_iter()
        .find(|e| e.edge_props().is_some_and(|p| &p.to_id == child))
}

impl LayoutEngine {
    /// Create a layout edge and schedule its container for reflow.
    pub fn create_edge(
        &mut self,
        store: &mut Store,
        from: &RecordId,
        to: &RecordId,
        key: OrderKey,
        placeholder: bool,
    ) -> RecordId {
        let mut record = Record::new(
            Props::Edge(EdgeProps {
                from_id: from.clone(),
                to_id: to.clone(),
                kind: EdgeKind::Layout,
                placeholder,
            }),
            RecordId::root(),
        );
        record.order_key = Some(key);
        let id = store.create_record(record);
        self.schedule(from.clone());
        id
    }

    /// Patch an edge's key and/or placeholder flag.
    pub fn update_edge(
        &mut self,
        store: &mut Store,
        edge_id: &RecordId,
        patch: EdgePatch,
    ) -> Result<(), LayoutError> {
        let record = store
            .get(edge_id)
            .ok_or_else(|| StoreError::NotFound(edge_id.clone()))?;
        let from = record
            .edge_props()
            .map(|e| e.from_id.clone())
            .ok_or_else(|| LayoutError::DanglingEdge(edge_id.clone()))?;

        store.update_record(edge_id, |r| {
            if let Some(key) = patch.order_key {
                r.order_key = Some(key);
            }
            if let Some(placeholder) = patch.placeholder {
                if let Some(props) = r.edge_props_mut() {
                    props.placeholder = placeholder;
                }
            }
        })?;
        self.schedule(from);
        Ok(())
    }

    /// Delete an edge; its container still reflows so siblings close up.
    pub fn delete_edge(&mut self, store: &mut Store, edge_id: &RecordId) {
        let from = store
            .get(edge_id)
            .and_then(|r| r.edge_props())
            .map(|e| e.from_id.clone());
        store.delete_records(std::slice::from_ref(edge_id));
        if let Some(from) = from {
            self.schedule(from);
        }
    }

    /// Move a child into a container: delete its existing bindings, create
    /// the new edge, and reparent when ownership actually changes.
    pub fn bind(
        &mut self,
        store: &mut Store,
        container: &RecordId,
        child: &RecordId,
        key: OrderKey,
        placeholder: bool,
    ) -> RecordId {
        store.batch(|store| {
            for edge in edges_to(store, child) {
                self.delete_edge(store, &edge.id);
            }
            let id = self.create_edge(store, container, child, key, placeholder);
            let needs_reparent = store
                .get(child)
                .is_some_and(|r| &r.parent_id != container);
            if needs_reparent {
                store.reparent(std::slice::from_ref(child), container);
            }
            id
        })
    }

    /// Rewrite a container's sibling run with fresh, evenly spaced keys.
    /// This is the recovery path for ordering-key exhaustion.
    pub fn renumber(
        &mut self,
        store: &mut Store,
        container: &RecordId,
    ) -> Result<(), LayoutError> {
        let edges = edges_of(store, container);
        store.batch(|store| {
            let mut prev: Option<OrderKey> = None;
            for edge in &edges {
                let key = key_between(prev.as_ref(), None)?;
                store.update_record(&edge.id, |r| r.order_key = Some(key.clone()))?;
                prev = Some(key);
            }
            Ok::<(), LayoutError>(())
        })?;
        self.schedule(container.clone());
        Ok(())
    }
}
