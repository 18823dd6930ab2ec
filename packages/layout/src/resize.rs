//! # Resize Sessions
//!
//! Resize of a stacked section or a whole stack, mirroring the drag
//! protocol: the record is flagged `is_transforming` for the lifetime of
//! the gesture so concurrent reflows and remote merges leave it alone,
//! and the pre-resize snapshot backs exact restoration on cancel.
//! Sections only track the vertical axis; stacks scale on both axes and
//! scale their gap with the height, floored so items never touch. While
//! the handle moves, the owning container's extent is recomputed
//! immediately so siblings below track the new edge in real time instead
//! of waiting for settle.

use crate::capability;
use crate::errors::LayoutError;
use crate::graph;
use crate::reflow::LayoutEngine;
use pagestack_common::{RecordId, Vec2};
use pagestack_store::{Props, Record, Store, StoreError};

const MIN_EXTENT: f64 = 50.0;
const MIN_GAP: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeState {
    Transforming,
    Settled,
    Reverted,
}

#[derive(Debug)]
pub struct ResizeSession {
    record_id: RecordId,
    origin: Record,
    state: ResizeState,
}

impl ResizeSession {
    pub fn begin(
        store: &mut Store,
        record_id: &RecordId,
    ) -> Result<Self, LayoutError> {
        let origin = store
            .get(record_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(record_id.clone()))?;
        if !capability::resizable(origin.ty()) {
            return Err(LayoutError::NotResizable(record_id.clone()));
        }
        store.update_record(record_id, |r| r.meta.is_transforming = true)?;
        Ok(ResizeSession {
            record_id: record_id.clone(),
            origin,
            state: ResizeState::Transforming,
        })
    }

    pub fn state(&self) -> ResizeState {
        self.state
    }

    /// Apply a scale factor relative to the gesture origin. Sections use
    /// the vertical axis only; stacks scale width and height and carry
    /// their gap with the height.
    pub fn update(&self, store: &mut Store, scale: Vec2) -> Result<(), LayoutError> {
        if self.state != ResizeState::Transforming {
            return Ok(());
        }
        store.batch(|store| -> Result<(), LayoutError> {
            match &self.origin.props {
                Props::Stack(origin) => {
                    let width = origin.width * scale.x;
                    let height = origin.height * scale.y;
                    let gap = (origin.gap * scale.y).max(MIN_GAP);
                    store.update_record(&self.record_id, |r| {
                        if let Props::Stack(p) = &mut r.props {
                            p.width = width;
                            p.height = height;
                            p.gap = gap;
                        }
                    })?;
                }
                _ => {
                    let origin_h = self.origin.height().unwrap_or(MIN_EXTENT);
                    let new_h = (origin_h * scale.y).max(MIN_EXTENT);
                    store.update_record(&self.record_id, |r| r.set_height(new_h))?;
                }
            }
            self.settle_owner_extent(store)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Clear the gesture flag and hand the container to the reflow pass.
    pub fn finish(
        &mut self,
        store: &mut Store,
        engine: &mut LayoutEngine,
    ) -> Result<ResizeState, LayoutError> {
        if self.state != ResizeState::Transforming {
            return Ok(self.state);
        }
        store.update_record(&self.record_id, |r| r.meta.is_transforming = false)?;
        self.schedule_affected(store, engine);
        engine.flush(store);
        self.state = ResizeState::Settled;
        Ok(self.state)
    }

    /// Restore the pre-gesture extent exactly.
    pub fn cancel(
        &mut self,
        store: &mut Store,
        engine: &mut LayoutEngine,
    ) -> Result<ResizeState, LayoutError> {
        if self.state != ResizeState::Transforming {
            return Ok(self.state);
        }
        let origin = self.origin.clone();
        store.update_record(&self.record_id, move |r| *r = origin)?;
        self.schedule_affected(store, engine);
        engine.flush(store);
        self.state = ResizeState::Reverted;
        Ok(self.state)
    }

    /// The owning container always reflows; a resized stack also reflows
    /// itself so its children pick up the new width and gap.
    fn schedule_affected(&self, store: &Store, engine: &mut LayoutEngine) {
        if capability::is_container(self.origin.ty()) {
            engine.schedule(self.record_id.clone());
        }
        if let Some(owner) = self.owner(store) {
            engine.schedule(owner);
        }
    }

    fn owner(&self, store: &Store) -> Option<RecordId> {
        graph::edges_to(store, &self.record_id)
            .into_iter()
            .next()
            .and_then(|e| e.edge_props().map(|p| p.from_id.clone()))
    }

    /// Re-derive the owning container's height from its children's extents
    /// mid-gesture, without moving any sibling.
    fn settle_owner_extent(&self, store: &mut Store) -> Result<(), LayoutError> {
        let Some(owner_id) = self.owner(store) else {
            return Ok(());
        };
        let Some(owner) = store.get(&owner_id).cloned() else {
            return Ok(());
        };
        let gap = capability::gap(&owner);
        let mut consumed = capability::top_inset(&owner);
        for edge in graph::edges_of(store, &owner_id) {
            let Some(props) = edge.edge_props() else {
                continue;
            };
            let Some(child) = store.get(&props.to_id) else {
                continue;
            };
            consumed += child.height().unwrap_or(0.0) + gap;
        }
        let consumed = consumed.max(0.0);
        if owner.height().is_some_and(|h| h != consumed) {
            store.update_record(&owner_id, |r| r.set_height(consumed))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestack_common::OrderKey;
    use pagestack_store::{ItemProps, PageProps, SectionProps, StackProps};

    fn page(store: &mut Store) -> RecordId {
        store.create_record(Record::new(
            Props::Page(PageProps::default()),
            RecordId::root(),
        ))
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
    fn only_sections_and_stacks_resize() {
        let mut store = Store::new("w1");
        let p = page(&mut store);
        let item = store.create_record(Record::new(
            Props::Item(ItemProps::default()),
            p.clone(),
        ));
        let err = ResizeSession::begin(&mut store, &item).unwrap_err();
        assert_eq!(err, LayoutError::NotResizable(item));
        assert!(ResizeSession::begin(&mut store, &p).is_err());

        let stack = store.create_record(Record::new(
            Props::Stack(StackProps::default()),
            p.clone(),
        ));
        assert!(ResizeSession::begin(&mut store, &stack).is_ok());
    }

    #[test]
    fn resize_tracks_scale_and_clamps() {
        let mut store = Store::new("w1");
        let mut engine = LayoutEngine::new();
        let p = page(&mut store);
        let s = section(&mut store, &p, 200.0);
        engine.create_edge(&mut store, &p, &s, OrderKey::new("a1"), false);
        engine.flush(&mut store);

        let mut session = ResizeSession::begin(&mut store, &s).unwrap();
        session.update(&mut store, Vec2::new(1.0, 1.5)).unwrap();
        assert_eq!(store.get(&s).unwrap().height(), Some(300.0));
        // container extent follows mid-gesture
        assert_eq!(store.get(&p).unwrap().height(), Some(300.0));

        session.update(&mut store, Vec2::new(1.0, 0.01)).unwrap();
        assert_eq!(store.get(&s).unwrap().height(), Some(50.0));

        session.finish(&mut store, &mut engine).unwrap();
        assert!(!store.get(&s).unwrap().meta.is_transforming);
        assert_eq!(store.get(&p).unwrap().height(), Some(50.0));
    }

    #[test]
    fn siblings_below_shift_while_resizing() {
        let mut store = Store::new("w1");
        let mut engine = LayoutEngine::new();
        let p = page(&mut store);
        let s1 = section(&mut store, &p, 200.0);
        let s2 = section(&mut store, &p, 150.0);
        engine.create_edge(&mut store, &p, &s1, OrderKey::new("a1"), false);
        engine.create_edge(&mut store, &p, &s2, OrderKey::new("a2"), false);
        engine.flush(&mut store);

        let mut session = ResizeSession::begin(&mut store, &s1).unwrap();
        session.update(&mut store, Vec2::new(1.0, 2.0)).unwrap();
        // the resized record is frozen against reflow, but a manual pass
        // repositions its siblings below the new edge
        crate::reflow::reflow(&mut store, &p);
        assert_eq!(store.get(&s1).unwrap().y, 0.0);
        assert_eq!(store.get(&s2).unwrap().y, 400.0);

        session.finish(&mut store, &mut engine).unwrap();
        assert_eq!(store.get(&p).unwrap().height(), Some(550.0));
    }

    #[test]
    fn cancel_restores_origin_exactly() {
        let mut store = Store::new("w1");
        let mut engine = LayoutEngine::new();
        let p = page(&mut store);
        let s = section(&mut store, &p, 200.0);
        engine.create_edge(&mut store, &p, &s, OrderKey::new("a1"), false);
        engine.flush(&mut store);
        let before = store.get(&s).unwrap().clone();

        let mut session = ResizeSession::begin(&mut store, &s).unwrap();
        session.update(&mut store, Vec2::new(1.0, 3.0)).unwrap();
        session.cancel(&mut store, &mut engine).unwrap();

        let after = store.get(&s).unwrap();
        assert_eq!(after.height(), before.height());
        assert!(!after.meta.is_transforming);
        assert_eq!(store.get(&p).unwrap().height(), Some(200.0));
    }

    #[test]
    fn stack_resize_scales_both_axes_and_floors_the_gap() {
        let mut store = Store::new("w1");
        let mut engine = LayoutEngine::new();
        let stack = store.create_record(Record::new(
            Props::Stack(StackProps {
                width: 300.0,
                height: 400.0,
                gap: 8.0,
            }),
            RecordId::root(),
        ));
        let item = store.create_record(Record::new(
            Props::Item(ItemProps {
                w: 200.0,
                h: 50.0,
                text: "a".to_string(),
                ..ItemProps::default()
            }),
            stack.clone(),
        ));
        engine.create_edge(&mut store, &stack, &item, OrderKey::new("a1"), false);
        engine.flush(&mut store);

        let mut session = ResizeSession::begin(&mut store, &stack).unwrap();
        session.update(&mut store, Vec2::new(0.5, 0.5)).unwrap();
        match &store.get(&stack).unwrap().props {
            Props::Stack(p) => {
                assert_eq!(p.width, 150.0);
                assert_eq!(p.height, 200.0);
                assert_eq!(p.gap, 4.0);
            }
            other => panic!("expected stack props, got {other:?}"),
        }

        // the gap never collapses past its floor
        session.update(&mut store, Vec2::new(0.5, 0.1)).unwrap();
        match &store.get(&stack).unwrap().props {
            Props::Stack(p) => assert_eq!(p.gap, 2.0),
            other => panic!("expected stack props, got {other:?}"),
        }

        session.finish(&mut store, &mut engine).unwrap();
        // the stack reflows its own children with the new width and gap
        let item = store.get(&item).unwrap();
        assert_eq!(item.x, 2.0);
        assert_eq!(item.y, 2.0);
        assert_eq!(item.width(), Some(146.0));
    }
}
