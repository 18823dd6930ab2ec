//! # Drag/Drop State Machine
//!
//! One `DragSession` per pointer gesture:
//! `idle → translating(start) → translating(move)* → settled | reverted`.
//!
//! On start the dragged record's bindings turn into placeholders and the
//! record is flagged `is_dragging`, which freezes it against reflow so
//! the engine never fights the user's hand. Every move sample re-resolves
//! the deepest eligible container under the record's anchor, recomputes
//! the insertion slot against sibling midpoints, and keeps at most one
//! ghost record previewing the final placement. The pre-drag snapshot is
//! held until the gesture ends so cancellation can restore the record and
//! its edges exactly as if start had never run.

use crate::capability;
use crate::errors::LayoutError;
use crate::graph::{self, EdgePatch};
use crate::reflow::LayoutEngine;
use pagestack_common::{key_between, OrderKey, Rect, RecordId, Vec2};
use pagestack_store::{Record, Store, StoreError};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Translating,
    Settled,
    Reverted,
}

pub struct DragSession {
    record_id: RecordId,
    origin: Record,
    origin_edges: Vec<Record>,
    ghost_id: Option<RecordId>,
    hovered: Option<RecordId>,
    state: DragState,
}

impl DragSession {
    /// Enter `translating`: snapshot the record and its bindings, mark
    /// the bindings as placeholders, and flag the record as dragging.
    pub fn begin(
        store: &mut Store,
        engine: &mut LayoutEngine,
        record_id: &RecordId,
    ) -> Result<Self, LayoutError> {
        let origin = store
            .get(record_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(record_id.clone()))?;
        let origin_edges = graph::edges_to(store, record_id);

        store.batch(|store| -> Result<(), LayoutError> {
            for edge in &origin_edges {
                engine.update_edge(
                    store,
                    &edge.id,
                    EdgePatch {
                        order_key: None,
                        placeholder: Some(true),
                    },
                )?;
            }
            store.update_record(record_id, |r| r.meta.is_dragging = true)?;
            Ok(())
        })?;
        engine.flush(store);

        Ok(DragSession {
            record_id: record_id.clone(),
            origin,
            origin_edges,
            ghost_id: None,
            hovered: None,
            state: DragState::Translating,
        })
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    /// One pointer-move sample, `pointer` in page space.
    pub fn update(
        &mut self,
        store: &mut Store,
        engine: &mut LayoutEngine,
        pointer: Vec2,
    ) -> Result<(), LayoutError> {
        if self.state != DragState::Translating {
            return Ok(());
        }

        store.batch(|store| -> Result<(), LayoutError> {
            self.clear_ghost(store);

            match hit_test_container(store, &self.record_id, pointer) {
                None => {
                    self.set_hover(store, None);
                    self.snap_to_current_container(store)?;
                }
                Some(container_id) => {
                    self.set_hover(store, Some(&container_id));
                    let (slot, key) =
                        resolve_slot(store, engine, &container_id, &self.record_id, pointer)?;

                    match graph::edge_between(store, &container_id, &self.record_id) {
                        Some(existing) => {
                            let settled = existing
                                .edge_props()
                                .is_some_and(|p| p.placeholder)
                                && key_in_slot(
                                    existing.order_key.as_ref(),
                                    slot.below.as_ref(),
                                    slot.above.as_ref(),
                                );
                            if !settled {
                                engine.update_edge(
                                    store,
                                    &existing.id,
                                    EdgePatch {
                                        order_key: Some(key),
                                        placeholder: Some(true),
                                    },
                                )?;
                            }
                        }
                        None => {
                            engine.create_edge(
                                store,
                                &container_id,
                                &self.record_id,
                                key,
                                true,
                            );
                            let needs_reparent = store
                                .get(&self.record_id)
                                .is_some_and(|r| r.parent_id != container_id);
                            if needs_reparent {
                                store.reparent(
                                    std::slice::from_ref(&self.record_id),
                                    &container_id,
                                );
                            }
                        }
                    }

                    self.track_pointer(store, pointer)?;
                    let container = store
                        .get(&container_id)
                        .cloned()
                        .ok_or_else(|| StoreError::NotFound(container_id.clone()))?;
                    self.spawn_ghost(store, &container, slot.y);
                }
            }
            Ok(())
        })?;
        engine.flush(store);
        Ok(())
    }

    /// Settle the gesture: one winning non-placeholder edge survives and
    /// the destination container reflows.
    pub fn finish(
        &mut self,
        store: &mut Store,
        engine: &mut LayoutEngine,
        pointer: Vec2,
    ) -> Result<DragState, LayoutError> {
        if self.state != DragState::Translating {
            return Ok(self.state);
        }

        store.batch(|store| -> Result<(), LayoutError> {
            self.clear_ghost(store);
            self.set_hover(store, None);

            match hit_test_container(store, &self.record_id, pointer) {
                Some(container_id) => {
                    let (_, key) =
                        resolve_slot(store, engine, &container_id, &self.record_id, pointer)?;
                    for edge in graph::edges_to(store, &self.record_id) {
                        engine.delete_edge(store, &edge.id);
                    }
                    engine.create_edge(store, &container_id, &self.record_id, key, false);
                    let needs_reparent = store
                        .get(&self.record_id)
                        .is_some_and(|r| r.parent_id != container_id);
                    if needs_reparent {
                        store.reparent(std::slice::from_ref(&self.record_id), &container_id);
                    }
                    engine.schedule(container_id);
                }
                None => {
                    // no eligible drop target: the pre-gesture container
                    // keeps the record, gesture-created edges go away
                    let winner = self
                        .origin_edges
                        .first()
                        .and_then(|e| e.edge_props())
                        .map(|p| p.from_id.clone());
                    for edge in graph::edges_to(store, &self.record_id) {
                        let keep = match (&winner, edge.edge_props()) {
                            (Some(w), Some(p)) => &p.from_id == w,
                            _ => false,
                        };
                        if keep {
                            engine.update_edge(
                                store,
                                &edge.id,
                                EdgePatch {
                                    order_key: None,
                                    placeholder: Some(false),
                                },
                            )?;
                        } else {
                            engine.delete_edge(store, &edge.id);
                        }
                    }
                }
            }
            store.update_record(&self.record_id, |r| r.meta.is_dragging = false)?;
            Ok(())
        })?;
        engine.flush(store);

        self.state = DragState::Settled;
        Ok(self.state)
    }

    /// Cooperative abort: restore the pre-drag record and edges exactly.
    pub fn cancel(
        &mut self,
        store: &mut Store,
        engine: &mut LayoutEngine,
    ) -> Result<DragState, LayoutError> {
        if self.state != DragState::Translating {
            return Ok(self.state);
        }

        store.batch(|store| -> Result<(), LayoutError> {
            self.clear_ghost(store);
            self.set_hover(store, None);

            for edge in graph::edges_to(store, &self.record_id) {
                engine.delete_edge(store, &edge.id);
            }
            let origin = self.origin.clone();
            store.update_record(&self.record_id, move |r| *r = origin)?;
            for edge in &self.origin_edges {
                store.create_record(edge.clone());
                if let Some(props) = edge.edge_props() {
                    engine.schedule(props.from_id.clone());
                }
            }
            Ok(())
        })?;
        engine.flush(store);

        self.state = DragState::Reverted;
        Ok(self.state)
    }

    // --- internals ---

    /// "Can't drop here" feedback: park the record at its current
    /// container's origin without touching any binding.
    fn snap_to_current_container(&self, store: &mut Store) -> Result<(), LayoutError> {
        let Some(edge) = graph::edges_to(store, &self.record_id).into_iter().next() else {
            return Ok(());
        };
        let Some(props) = edge.edge_props() else {
            return Ok(());
        };
        let Some(container) = store.get(&props.from_id).cloned() else {
            return Ok(());
        };
        let x = capability::left_inset(&container);
        let y = capability::top_inset(&container);
        store.update_record(&self.record_id, |r| {
            r.x = x;
            r.y = y;
        })?;
        Ok(())
    }

    /// Keep the record's center under the pointer, in its parent's space.
    fn track_pointer(&self, store: &mut Store, pointer: Vec2) -> Result<(), LayoutError> {
        let record = store
            .get(&self.record_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(self.record_id.clone()))?;
        let (w, h) = (
            record.width().unwrap_or(0.0),
            record.height().unwrap_or(0.0),
        );
        let parent_origin = page_origin_of(store, &record.parent_id);
        store.update_record(&self.record_id, |r| {
            r.x = pointer.x - parent_origin.x - w / 2.0;
            r.y = pointer.y - parent_origin.y - h / 2.0;
        })?;
        Ok(())
    }

    fn set_hover(&mut self, store: &mut Store, target: Option<&RecordId>) {
        if self.hovered.as_ref() == target {
            return;
        }
        if let Some(prev) = self.hovered.take() {
            let _ = store.update_record(&prev, |r| r.meta.is_dragging_over = false);
        }
        if let Some(target) = target {
            if store
                .update_record(target, |r| r.meta.is_dragging_over = true)
                .is_ok()
            {
                self.hovered = Some(target.clone());
            }
        }
    }

    /// At most one ghost exists at a time; it previews the insertion slot
    /// and is removed at the start of every move sample.
    fn spawn_ghost(&mut self, store: &mut Store, container: &Record, slot_y: f64) {
        let Some(dragged) = store.get(&self.record_id) else {
            return;
        };
        let mut ghost = Record::new(dragged.props.clone(), container.id.clone());
        ghost.x = capability::left_inset(container);
        ghost.y = slot_y;
        ghost.set_width(capability::content_width(container));
        ghost.meta.is_dragging_over = true;
        self.ghost_id = Some(store.create_record(ghost));
    }

    fn clear_ghost(&mut self, store: &mut Store) {
        if let Some(ghost) = self.ghost_id.take() {
            store.delete_records(std::slice::from_ref(&ghost));
        }
    }
}

/// An insertion position between two sibling ordering keys.
#[derive(Debug, Clone)]
pub struct Slot {
    pub below: Option<OrderKey>,
    pub above: Option<OrderKey>,
    /// Container-local y of the slot.
    pub y: f64,
}

/// Compare the pointer against the vertical midpoints of the non-dragged
/// siblings: the first sibling whose midpoint the pointer has not passed
/// becomes the "above" neighbor, the previous one "below".
pub fn insertion_slot(
    store: &Store,
    container: &Record,
    dragged: &RecordId,
    anchor: Vec2,
) -> Slot {
    let local_y = anchor.y - page_point(store, container).y;
    let gap = capability::gap(container);
    let mut acc = capability::top_inset(container);
    let mut below = None;
    let mut above = None;

    for edge in graph::edges_of(store, &container.id) {
        let Some(props) = edge.edge_props() else {
            continue;
        };
        if &props.to_id == dragged {
            continue;
        }
        let Some(child) = store.get(&props.to_id) else {
            continue;
        };
        let extent = child.height().unwrap_or(0.0);
        if local_y < acc + extent / 2.0 {
            above = edge.order_key.clone();
            break;
        }
        below = edge.order_key.clone();
        acc += extent + gap;
    }

    Slot {
        below,
        above,
        y: acc,
    }
}

/// Slot plus a fresh key for it, renumbering the sibling run once if the
/// allocator reports exhaustion (or keys have collided into a tie).
fn resolve_slot(
    store: &mut Store,
    engine: &mut LayoutEngine,
    container_id: &RecordId,
    dragged: &RecordId,
    anchor: Vec2,
) -> Result<(Slot, OrderKey), LayoutError> {
    let container = store
        .get(container_id)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(container_id.clone()))?;
    let slot = insertion_slot(store, &container, dragged, anchor);
    match key_between(slot.below.as_ref(), slot.above.as_ref()) {
        Ok(key) => Ok((slot, key)),
        Err(err) => {
            warn!(container = %container_id, %err, "ordering key allocation failed; renumbering");
            engine.renumber(store, container_id)?;
            let slot = insertion_slot(store, &container, dragged, anchor);
            let key = key_between(slot.below.as_ref(), slot.above.as_ref())?;
            Ok((slot, key))
        }
    }
}

fn key_in_slot(
    key: Option<&OrderKey>,
    below: Option<&OrderKey>,
    above: Option<&OrderKey>,
) -> bool {
    let Some(key) = key else {
        return false;
    };
    below.map_or(true, |b| b < key) && above.map_or(true, |a| key < a)
}

/// Absolute (page-space) position of a record, summing the parent chain.
pub fn page_point(store: &Store, record: &Record) -> Vec2 {
    let mut point = record.position();
    let mut parent = record.parent_id.clone();
    let mut hops = 0;
    while !parent.is_root() && hops < 64 {
        match store.get(&parent) {
            Some(r) => {
                point = point.add(r.position());
                parent = r.parent_id.clone();
            }
            None => break,
        }
        hops += 1;
    }
    point
}

fn page_origin_of(store: &Store, parent_id: &RecordId) -> Vec2 {
    if parent_id.is_root() {
        return Vec2::default();
    }
    store
        .get(parent_id)
        .map(|r| page_point(store, r))
        .unwrap_or_default()
}

/// Page-space bounds of a sized record.
pub fn page_rect(store: &Store, record: &Record) -> Option<Rect> {
    let origin = page_point(store, record);
    Some(Rect::new(
        origin.x,
        origin.y,
        record.width()?,
        record.height()?,
    ))
}

/// Deepest eligible container whose bounds contain the anchor; ties on
/// depth break by id for determinism.
fn hit_test_container(store: &Store, dragged: &RecordId, anchor: Vec2) -> Option<RecordId> {
    let dragged_record = store.get(dragged)?;
    let mut best: Option<(usize, RecordId)> = None;

    for candidate in store.records() {
        if &candidate.id == dragged {
            continue;
        }
        if !capability::binding_eligible(candidate, dragged_record) {
            continue;
        }
        let Some(rect) = page_rect(store, candidate) else {
            continue;
        };
        if !rect.contains(anchor) {
            continue;
        }
        let depth = ancestor_depth(store, candidate);
        let better = match &best {
            None => true,
            Some((d, id)) => depth > *d || (depth == *d && candidate.id < *id),
        };
        if better {
            best = Some((depth, candidate.id.clone()));
        }
    }

    best.map(|(_, id)| id)
}

fn ancestor_depth(store: &Store, record: &Record) -> usize {
    let mut depth = 0;
    let mut parent = record.parent_id.clone();
    while !parent.is_root() && depth < 64 {
        match store.get(&parent) {
            Some(r) => parent = r.parent_id.clone(),
            None => break,
        }
        depth += 1;
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestack_store::{PageProps, Props, SectionProps};

    fn page_at(store: &mut Store, x: f64, y: f64) -> RecordId {
        let mut record = Record::new(Props::Page(PageProps::default()), RecordId::root());
        record.x = x;
        record.y = y;
        store.create_record(record)
    }

    fn section(store: &mut Store, parent: &RecordId, h: f64) -> RecordId {
        store.create_record(Record::new(
            Props::Section(SectionProps {
                h,
                ..SectionProps::default()
            }),
            parent.clone(),
        ))
    }

    #[test]
    fn page_point_sums_parent_chain() {
        let mut store = Store::new("w1");
        let p = page_at(&mut store, 100.0, 50.0);
        let s = section(&mut store, &p, 200.0);
        store
            .update_record(&s, |r| {
                r.x = 10.0;
                r.y = 20.0;
            })
            .unwrap();
        let s = store.get(&s).unwrap();
        assert_eq!(page_point(&store, s), Vec2::new(110.0, 70.0));
    }

    #[test]
    fn hit_test_finds_eligible_container_under_anchor() {
        let mut store = Store::new("w1");
        let p1 = page_at(&mut store, 0.0, 0.0);
        let p2 = page_at(&mut store, 2000.0, 0.0);
        let s = section(&mut store, &p1, 200.0);

        assert_eq!(
            hit_test_container(&store, &s, Vec2::new(600.0, 300.0)),
            Some(p1)
        );
        assert_eq!(
            hit_test_container(&store, &s, Vec2::new(2600.0, 300.0)),
            Some(p2)
        );
        assert_eq!(hit_test_container(&store, &s, Vec2::new(-50.0, 300.0)), None);
    }

    #[test]
    fn insertion_slot_uses_sibling_midpoints() {
        let mut store = Store::new("w1");
        let mut engine = LayoutEngine::new();
        let p = page_at(&mut store, 0.0, 0.0);
        let s1 = section(&mut store, &p, 200.0);
        let s2 = section(&mut store, &p, 150.0);
        let dragged = section(&mut store, &p, 100.0);
        engine.create_edge(&mut store, &p, &s1, OrderKey::new("a1"), false);
        engine.create_edge(&mut store, &p, &s2, OrderKey::new("a2"), false);
        engine.flush(&mut store);

        let container = store.get(&p).unwrap().clone();

        // above the first midpoint (y < 100): insert before s1
        let slot = insertion_slot(&store, &container, &dragged, Vec2::new(10.0, 40.0));
        assert_eq!(slot.below, None);
        assert_eq!(slot.above, Some(OrderKey::new("a1")));
        assert_eq!(slot.y, 0.0);

        // between midpoints (100 <= y < 275): insert between s1 and s2
        let slot = insertion_slot(&store, &container, &dragged, Vec2::new(10.0, 150.0));
        assert_eq!(slot.below, Some(OrderKey::new("a1")));
        assert_eq!(slot.above, Some(OrderKey::new("a2")));
        assert_eq!(slot.y, 200.0);

        // past every midpoint: append
        let slot = insertion_slot(&store, &container, &dragged, Vec2::new(10.0, 330.0));
        assert_eq!(slot.below, Some(OrderKey::new("a2")));
        assert_eq!(slot.above, None);
        assert_eq!(slot.y, 350.0);
    }

    #[test]
    fn key_in_slot_bounds() {
        let a1 = OrderKey::new("a1");
        let a2 = OrderKey::new("a2");
        let mid = key_between(Some(&a1), Some(&a2)).unwrap();
        assert!(key_in_slot(Some(&mid), Some(&a1), Some(&a2)));
        assert!(!key_in_slot(Some(&a1), Some(&a1), Some(&a2)));
        assert!(!key_in_slot(None, Some(&a1), Some(&a2)));
        assert!(key_in_slot(Some(&a2), Some(&a1), None));
    }
}
