//! # Document State Store
//!
//! The single mutable in-memory document: a table of records keyed by id
//! plus an append-only local change log. All mutation happens on the
//! client's main event loop; "batch" means one synchronous critical
//! section with deferred notification, not parallel execution.
//!
//! ## Writes
//!
//! Every local mutation is stamped with the store's writer id and a
//! bumped per-record version, the optimistic-concurrency token the sync
//! layer relies on. Versions are monotonic per id for the lifetime of
//! the store, even across a delete and re-create of the same id; a
//! high-water mark of every version seen backs this. Mutations made
//! inside [`Store::merge_remote`] keep the stamps they arrived with and
//! are excluded from the change log, so inbound merges never echo back
//! out.
//!
//! ## Deletion
//!
//! Destroying a record is logical: it leaves the live table and the
//! change log carries a tombstone (`meta.deleted = true`, bumped
//! version), so removal is conveyed causally to other writers.

use crate::changes::ChangeSet;
use crate::errors::StoreError;
use crate::meta::Meta;
use crate::record::{Record, RecordType};
use pagestack_common::RecordId;
use std::collections::HashMap;

pub struct Store {
    writer_id: String,
    records: HashMap<RecordId, Record>,
    batch_depth: usize,
    remote_depth: usize,
    pending: ChangeSet,
    log: Vec<ChangeSet>,
    /// Highest version ever observed per id. Stamping never goes below
    /// it, so a delete and re-create of the same id (drag cancel) stays
    /// monotonic and peers never reject the re-created record.
    high_water: HashMap<RecordId, u64>,
}

impl Store {
    pub fn new(writer_id: impl Into<String>) -> Self {
        Store {
            writer_id: writer_id.into(),
            records: HashMap::new(),
            batch_depth: 0,
            remote_depth: 0,
            pending: ChangeSet::default(),
            log: Vec::new(),
            high_water: HashMap::new(),
        }
    }

    pub fn writer_id(&self) -> &str {
        &self.writer_id
    }

    // --- reads ---

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn records_of_type(&self, ty: RecordType) -> impl Iterator<Item = &Record> {
        self.records.values().filter(move |r| r.ty() == ty)
    }

    pub fn children_of<'a>(&'a self, parent: &'a RecordId) -> impl Iterator<Item = &'a Record> {
        self.records.values().filter(move |r| &r.parent_id == parent)
    }

    // --- host-runtime mutation surface ---

    /// Insert a new record, stamping it as a local write. Re-creating an
    /// id deleted earlier in the same batch supersedes that tombstone, so
    /// the batch's change set carries the record's final state.
    pub fn create_record(&mut self, mut record: Record) -> RecordId {
        self.begin();
        let id = record.id.clone();
        self.stamp(&id, &mut record.meta);
        self.pending.removed.retain(|r| r.id != id);
        self.pending.added.push(record.clone());
        self.records.insert(id.clone(), record);
        self.commit();
        id
    }

    /// Mutate a record in place through a closure.
    pub fn update_record(
        &mut self,
        id: &RecordId,
        f: impl FnOnce(&mut Record),
    ) -> Result<(), StoreError> {
        self.begin();
        let floor = self.high_water.get(id).copied().unwrap_or(0);
        let result = match self.records.get_mut(id) {
            None => Err(StoreError::NotFound(id.clone())),
            Some(record) => {
                let before = record.clone();
                f(record);
                if self.remote_depth == 0 {
                    record.meta.source = self.writer_id.clone();
                    record.meta.version = before.meta.version.max(floor) + 1;
                }
                let after = record.clone();
                let version = after.meta.version;
                self.pending.updated.push((before, after));
                Ok(version)
            }
        };
        let result = result.map(|version| self.observe(id, version));
        self.commit();
        result
    }

    /// Remove records from the live table; the change log receives
    /// tombstones. Missing ids are skipped.
    pub fn delete_records(&mut self, ids: &[RecordId]) {
        self.begin();
        for id in ids {
            if let Some(mut record) = self.records.remove(id) {
                record.meta.deleted = true;
                self.stamp(id, &mut record.meta);
                self.pending.removed.push(record);
            }
        }
        self.commit();
    }

    /// Change ownership of records. A record is laid out as a unit of
    /// its parent, so this is the only way "current container" changes
    /// outside of edge bookkeeping.
    pub fn reparent(&mut self, ids: &[RecordId], new_parent: &RecordId) {
        self.begin();
        for id in ids {
            let _ = self.update_record(id, |r| r.parent_id = new_parent.clone());
        }
        self.commit();
    }

    /// Run `f` as one atomic batch: all changes inside coalesce into a
    /// single change set committed when the outermost batch ends.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Store) -> T) -> T {
        self.begin();
        let out = f(self);
        self.commit();
        out
    }

    /// Like [`Store::batch`], but changes made inside keep their inbound
    /// stamps and never reach the local change log.
    pub fn merge_remote<T>(&mut self, f: impl FnOnce(&mut Store) -> T) -> T {
        self.remote_depth += 1;
        let out = self.batch(f);
        self.remote_depth -= 1;
        out
    }

    /// Upsert a record verbatim. Only meaningful inside
    /// [`Store::merge_remote`]; local code paths go through
    /// [`Store::create_record`] / [`Store::update_record`].
    pub fn put(&mut self, record: Record) {
        self.begin();
        self.observe(&record.id, record.meta.version);
        match self.records.get(&record.id) {
            Some(before) => self.pending.updated.push((before.clone(), record.clone())),
            None => self.pending.added.push(record.clone()),
        }
        self.records.insert(record.id.clone(), record);
        self.commit();
    }

    /// Drain the append-only local change log.
    pub fn drain_changes(&mut self) -> Vec<ChangeSet> {
        std::mem::take(&mut self.log)
    }

    // --- internals ---

    fn stamp(&mut self, id: &RecordId, meta: &mut Meta) {
        if self.remote_depth == 0 {
            meta.source = self.writer_id.clone();
            let floor = self.high_water.get(id).copied().unwrap_or(0);
            meta.version = meta.version.max(floor) + 1;
        }
        self.observe(id, meta.version);
    }

    fn observe(&mut self, id: &RecordId, version: u64) {
        let seen = self.high_water.entry(id.clone()).or_insert(0);
        if version > *seen {
            *seen = version;
        }
    }

    fn begin(&mut self) {
        self.batch_depth += 1;
    }

    fn commit(&mut self) {
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            let set = std::mem::take(&mut self.pending);
            if !set.is_empty() && self.remote_depth == 0 {
                self.log.push(set);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ItemProps, Props, SectionProps};

    fn section() -> Record {
        Record::new(Props::Section(SectionProps::default()), RecordId::root())
    }

    #[test]
    fn create_stamps_writer_and_version() {
        let mut store = Store::new("w1");
        let id = store.create_record(section());
        let record = store.get(&id).unwrap();
        assert_eq!(record.meta.source, "w1");
        assert_eq!(record.meta.version, 1);
    }

    #[test]
    fn update_bumps_version_per_record() {
        let mut store = Store::new("w1");
        let id = store.create_record(section());
        store.update_record(&id, |r| r.x = 5.0).unwrap();
        store.update_record(&id, |r| r.y = 9.0).unwrap();
        assert_eq!(store.get(&id).unwrap().meta.version, 3);
    }

    #[test]
    fn update_missing_record_errors() {
        let mut store = Store::new("w1");
        let missing = RecordId::new();
        assert_eq!(
            store.update_record(&missing, |_| {}),
            Err(StoreError::NotFound(missing))
        );
    }

    #[test]
    fn batch_commits_one_change_set() {
        let mut store = Store::new("w1");
        store.batch(|store| {
            let a = store.create_record(section());
            let b = store.create_record(section());
            store.update_record(&a, |r| r.x = 1.0).unwrap();
            store.delete_records(&[b]);
        });
        let log = store.drain_changes();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].added.len(), 2);
        assert_eq!(log[0].updated.len(), 1);
        assert_eq!(log[0].removed.len(), 1);
    }

    #[test]
    fn nested_batches_join_the_outer_one() {
        let mut store = Store::new("w1");
        store.batch(|store| {
            store.create_record(section());
            store.batch(|store| {
                store.create_record(section());
            });
        });
        assert_eq!(store.drain_changes().len(), 1);
    }

    #[test]
    fn delete_produces_a_tombstone() {
        let mut store = Store::new("w1");
        let id = store.create_record(section());
        store.drain_changes();
        store.delete_records(&[id.clone()]);

        assert!(!store.contains(&id));
        let log = store.drain_changes();
        let tombstone = &log[0].removed[0];
        assert!(tombstone.meta.deleted);
        assert_eq!(tombstone.meta.version, 2);
    }

    #[test]
    fn recreating_a_deleted_id_stays_monotonic() {
        let mut store = Store::new("w1");
        let id = store.create_record(section());
        store.update_record(&id, |r| r.x = 5.0).unwrap();
        let snapshot = store.get(&id).unwrap().clone();
        assert_eq!(snapshot.meta.version, 2);

        store.delete_records(std::slice::from_ref(&id));
        let log = store.drain_changes();
        assert_eq!(log.last().unwrap().removed[0].meta.version, 3);

        // restoring from the pre-delete snapshot must not rewind
        store.create_record(snapshot);
        assert_eq!(store.get(&id).unwrap().meta.version, 4);
    }

    #[test]
    fn same_batch_recreate_supersedes_the_tombstone() {
        let mut store = Store::new("w1");
        let id = store.create_record(section());
        let snapshot = store.get(&id).unwrap().clone();
        store.drain_changes();

        store.batch(|store| {
            store.delete_records(std::slice::from_ref(&id));
            store.create_record(snapshot);
        });

        let log = store.drain_changes();
        assert_eq!(log.len(), 1);
        assert!(log[0].removed.is_empty());
        assert_eq!(log[0].added.len(), 1);
        assert_eq!(log[0].added[0].id, id);
        assert!(!log[0].added[0].meta.deleted);
        assert!(store.contains(&id));
    }

    #[test]
    fn remote_merge_is_not_logged_and_not_restamped() {
        let mut store = Store::new("w1");
        let mut foreign = Record::new(Props::Item(ItemProps::default()), RecordId::root());
        foreign.meta.source = "w2".to_string();
        foreign.meta.version = 40;
        let id = foreign.id.clone();

        store.merge_remote(|store| store.put(foreign));

        assert!(store.drain_changes().is_empty());
        let record = store.get(&id).unwrap();
        assert_eq!(record.meta.source, "w2");
        assert_eq!(record.meta.version, 40);
    }

    #[test]
    fn reparent_moves_ownership() {
        let mut store = Store::new("w1");
        let parent = store.create_record(section());
        let child = store.create_record(Record::new(
            Props::Item(ItemProps::default()),
            RecordId::root(),
        ));
        store.reparent(std::slice::from_ref(&child), &parent);
        assert_eq!(store.get(&child).unwrap().parent_id, parent);
        assert_eq!(store.children_of(&parent).count(), 1);
    }
}
