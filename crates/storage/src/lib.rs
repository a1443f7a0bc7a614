//! Storage layer for authbridge
//!
//! This crate implements the in-memory relational engine behind the adapter:
//! - MemoryStore: per-entity tables behind a `parking_lot::RwLock`
//! - Column defaults, NOT NULL, kind and unique-key enforcement
//! - Predicate evaluation, ordering, offset/limit and join evaluation
//! - StoreTransaction: snapshot-isolated units of work
//! - TransactionCoordinator: id allocation and lifecycle metrics
//!
//! The engine is only reachable through the `QueryExecutor` and
//! `TransactionalExecutor` traits from `authbridge-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod catalog;
pub mod coordinator;
mod eval;
pub mod store;
mod table;
pub mod transaction;

pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use store::MemoryStore;
pub use transaction::StoreTransaction;
