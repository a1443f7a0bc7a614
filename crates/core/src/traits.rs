//! Core traits for the query-executor seam
//!
//! The adapter never talks to a concrete engine. It builds [`EntityQuery`]
//! fragments and hands them to a [`QueryExecutor`]; atomic units of work go
//! through [`TransactionalExecutor`]. Swapping the in-memory engine for a
//! networked one means implementing these two traits, nothing above them
//! changes.
//!
//! Thread safety: all methods take `&self` and implementations must be
//! `Send + Sync`.

use crate::error::Result;
use crate::query::{Changeset, EntityQuery};
use crate::row::Row;
use crate::schema::EntityName;

/// Opaque query executor
pub trait QueryExecutor: Send + Sync {
    /// Run a read query and return projected rows.
    ///
    /// Limit/offset apply to root rows; joined rows are bounded by each
    /// join's own strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot evaluate the query.
    fn select(&self, query: &EntityQuery) -> Result<Vec<Row>>;

    /// Count root rows matching the query's filter without fetching them.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot evaluate the query.
    fn count(&self, query: &EntityQuery) -> Result<u64>;

    /// Insert one row, applying column defaults, and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` when the engine rejects the row.
    fn insert(&self, entity: EntityName, values: Row) -> Result<Row>;

    /// Apply `changes` to matching rows and return the updated rows with all
    /// columns. The query's limit (if any) bounds the affected rows.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` when the result breaks a constraint.
    fn update(&self, query: &EntityQuery, changes: &Changeset) -> Result<Vec<Row>>;

    /// Physically remove matching rows, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot evaluate the query.
    fn delete(&self, query: &EntityQuery) -> Result<u64>;
}

/// Executor that can open atomic units of work
///
/// ```ignore
/// let txn = store.begin()?;
/// txn.insert(EntityName::User, row)?;
/// store.commit(txn)?; // or store.rollback(txn)
/// ```
pub trait TransactionalExecutor: QueryExecutor {
    /// Handle bound to one unit of work
    type Transaction: QueryExecutor;

    /// Open a unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot start a transaction.
    fn begin(&self) -> Result<Self::Transaction>;

    /// Make every write of `txn` visible atomically.
    ///
    /// # Errors
    ///
    /// Returns `TransactionConflict` if a concurrent commit won the race.
    fn commit(&self, txn: Self::Transaction) -> Result<()>;

    /// Discard every write of `txn`.
    fn rollback(&self, txn: Self::Transaction);
}
