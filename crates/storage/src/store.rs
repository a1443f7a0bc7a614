//! MemoryStore: thread-safe in-memory relational engine
//!
//! - `parking_lot::RwLock` around the committed catalog
//! - statements outside a transaction autocommit under the write lock
//! - transactions work on a cloned snapshot and are validated at commit
//!   with first-committer-wins on the tables they wrote
//!
//! Cloning a `MemoryStore` yields another handle to the same data.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use authbridge_core::{
    Changeset, EntityName, EntityQuery, Error, QueryExecutor, Result, Row, TransactionalExecutor,
};

use crate::catalog::Catalog;
use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use crate::transaction::StoreTransaction;

/// Shared in-memory store
#[derive(Debug, Clone)]
pub struct MemoryStore {
    catalog: Arc<RwLock<Catalog>>,
    coordinator: Arc<TransactionCoordinator>,
}

impl MemoryStore {
    /// Create an empty store with one table per registered entity
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Catalog::new())),
            coordinator: Arc::new(TransactionCoordinator::new()),
        }
    }

    /// Number of committed rows in `entity`, ignoring any filter
    pub fn row_count(&self, entity: EntityName) -> usize {
        self.catalog
            .read()
            .table(entity)
            .map_or(0, |table| table.rows().len())
    }

    /// Transaction statistics
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor for MemoryStore {
    fn select(&self, query: &EntityQuery) -> Result<Vec<Row>> {
        self.catalog.read().select(query)
    }

    fn count(&self, query: &EntityQuery) -> Result<u64> {
        self.catalog.read().count(query)
    }

    fn insert(&self, entity: EntityName, values: Row) -> Result<Row> {
        let row = self.catalog.write().insert(entity, values)?;
        debug!(target: "authbridge::storage", %entity, "Row inserted");
        Ok(row)
    }

    fn update(&self, query: &EntityQuery, changes: &Changeset) -> Result<Vec<Row>> {
        let rows = self.catalog.write().update(query, changes)?;
        debug!(target: "authbridge::storage", entity = %query.entity(), updated = rows.len(), "Rows updated");
        Ok(rows)
    }

    fn delete(&self, query: &EntityQuery) -> Result<u64> {
        let removed = self.catalog.write().delete(query)?;
        debug!(target: "authbridge::storage", entity = %query.entity(), removed, "Rows deleted");
        Ok(removed)
    }
}

impl TransactionalExecutor for MemoryStore {
    type Transaction = StoreTransaction;

    fn begin(&self) -> Result<StoreTransaction> {
        let snapshot = self.catalog.read().clone();
        let id = self.coordinator.start();
        Ok(StoreTransaction::new(id, snapshot))
    }

    fn commit(&self, txn: StoreTransaction) -> Result<()> {
        let id = txn.id();
        let mut catalog = self.catalog.write();

        let (mut working, written, base) = txn.into_parts();

        // validate every written table before installing any of them
        for entity in &written {
            let expected = base.get(entity).copied().unwrap_or(0);
            if catalog.version(*entity) != expected {
                self.coordinator.record_abort(id, "write conflict");
                return Err(Error::TransactionConflict { entity: *entity });
            }
        }

        for entity in written {
            if let Some(table) = working.take_table(entity) {
                catalog.install(entity, table);
            }
        }
        self.coordinator.record_commit(id);
        Ok(())
    }

    fn rollback(&self, txn: StoreTransaction) {
        self.coordinator.record_abort(txn.id(), "rollback");
    }
}
