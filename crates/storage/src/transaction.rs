//! StoreTransaction: an isolated working copy of the catalog
//!
//! `begin` clones the committed catalog (snapshot isolation). Every statement
//! runs against the private copy; nothing is visible to other readers until
//! [`crate::MemoryStore`] installs the written tables at commit.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;

use authbridge_core::{Changeset, EntityName, EntityQuery, QueryExecutor, Result, Row};

use crate::catalog::Catalog;

/// Handle for one unit of work against a [`crate::MemoryStore`]
#[derive(Debug)]
pub struct StoreTransaction {
    id: u64,
    /// Table versions observed at begin
    base_versions: BTreeMap<EntityName, u64>,
    working: Mutex<Catalog>,
    written: Mutex<BTreeSet<EntityName>>,
}

impl StoreTransaction {
    pub(crate) fn new(id: u64, snapshot: Catalog) -> Self {
        let base_versions = EntityName::ALL
            .into_iter()
            .map(|entity| (entity, snapshot.version(entity)))
            .collect();
        Self {
            id,
            base_versions,
            working: Mutex::new(snapshot),
            written: Mutex::new(BTreeSet::new()),
        }
    }

    /// Transaction id allocated by the coordinator
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Consume the handle, yielding the working copy, the written set and
    /// the table versions observed at begin
    pub(crate) fn into_parts(self) -> (Catalog, BTreeSet<EntityName>, BTreeMap<EntityName, u64>) {
        (
            self.working.into_inner(),
            self.written.into_inner(),
            self.base_versions,
        )
    }

    fn mark_written(&self, entity: EntityName) {
        self.written.lock().insert(entity);
    }
}

impl QueryExecutor for StoreTransaction {
    fn select(&self, query: &EntityQuery) -> Result<Vec<Row>> {
        self.working.lock().select(query)
    }

    fn count(&self, query: &EntityQuery) -> Result<u64> {
        self.working.lock().count(query)
    }

    fn insert(&self, entity: EntityName, values: Row) -> Result<Row> {
        let row = self.working.lock().insert(entity, values)?;
        self.mark_written(entity);
        Ok(row)
    }

    fn update(&self, query: &EntityQuery, changes: &Changeset) -> Result<Vec<Row>> {
        let rows = self.working.lock().update(query, changes)?;
        if !rows.is_empty() {
            self.mark_written(query.entity());
        }
        Ok(rows)
    }

    fn delete(&self, query: &EntityQuery) -> Result<u64> {
        let removed = self.working.lock().delete(query)?;
        if removed > 0 {
            self.mark_written(query.entity());
        }
        Ok(removed)
    }
}
