//! Adapter integration tests
//!
//! End-to-end runs of the adapter operations against the in-memory store:
//! - crud: the eight operations and validation ordering
//! - joins: one-to-one and lateral relation loading
//! - transactions: factory lifecycle, commit and rollback
//! - commands: the serialized command surface
//! - properties: count / soft-delete / rollback invariants under proptest

#[path = "../common/mod.rs"]
mod common;

mod crud;
mod joins;
mod properties;
mod transactions;
