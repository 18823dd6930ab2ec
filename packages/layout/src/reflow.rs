//! # Reflow Engine
//!
//! Recomputes child positions and container extents from the containment
//! graph. `reflow` is idempotent and writes nothing when the container is
//! already consistent, so remote merges and local gestures can both
//! trigger it freely.
//!
//! A container never reflows its descendants: nested containers reflow
//! independently when their own edges change. Children under an active
//! gesture (placeholder edge, or a live drag/hover flag on the record)
//! keep their position but still reserve their extent, which is what
//! stops remote-triggered reflows from snatching a shape out from under
//! the user's pointer.

use crate::capability;
use crate::graph;
use pagestack_common::RecordId;
use pagestack_store::Store;
use std::collections::BTreeSet;
use tracing::debug;

/// Schedules and runs reflows. Edge mutations mark containers dirty;
/// `flush` settles them all in one atomic batch.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    dirty: BTreeSet<RecordId>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a container for reflow on the next flush.
    pub fn schedule(&mut self, container: RecordId) {
        self.dirty.insert(container);
    }

    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Reflow every dirty container inside a single batch.
    pub fn flush(&mut self, store: &mut Store) {
        if self.dirty.is_empty() {
            return;
        }
        let dirty = std::mem::take(&mut self.dirty);
        store.batch(|store| {
            for container in &dirty {
                reflow(store, container);
            }
        });
    }
}

/// Lay out a container's direct children along the vertical stack.
///
/// Walks the ordered edges, advancing a running offset by each child's
/// extent plus gap; skipped (gesture-frozen) children still advance the
/// offset. Afterwards the container's height is settled to the consumed
/// total. Dangling edges found along the way are deleted.
pub fn reflow(store: &mut Store, container_id: &RecordId) {
    let Some(container) = store.get(container_id).cloned() else {
        return;
    };
    if !capability::is_container(container.ty()) {
        return;
    }
    let edges = graph::edges_of(store, container_id);
    if edges.is_empty() {
        return;
    }

    let gap = capability::gap(&container);
    let left = capability::left_inset(&container);
    let content_width = capability::content_width(&container);

    store.batch(|store| {
        let mut y = capability::top_inset(&container);
        let mut dangling: Vec<RecordId> = Vec::new();

        for edge in &edges {
            let Some(props) = edge.edge_props() else {
                continue;
            };
            let Some(child) = store.get(&props.to_id).cloned() else {
                dangling.push(edge.id.clone());
                continue;
            };

            let extent = child.height().unwrap_or(0.0);
            let frozen = props.placeholder
                || child.meta.is_actively_manipulated()
                || child.meta.is_dragging_over;

            if !frozen {
                let needs_move = child.x != left || child.y != y;
                let needs_width = child.width().is_some_and(|w| w != content_width);
                if needs_move || needs_width {
                    let _ = store.update_record(&child.id, |c| {
                        c.x = left;
                        c.y = y;
                        c.set_width(content_width);
                    });
                }
            }

            y += extent + gap;
        }

        let consumed = y.max(0.0);
        if container.height().is_some_and(|h| h != consumed) {
            let _ = store.update_record(container_id, |c| c.set_height(consumed));
        }

        for edge_id in dangling {
            debug!(edge = %edge_id, container = %container_id, "removing dangling layout edge");
            store.delete_records(std::slice::from_ref(&edge_id));
        }
    });
}
