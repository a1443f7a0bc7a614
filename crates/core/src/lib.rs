//! Core types and traits for authbridge
//!
//! This crate defines the foundational types used throughout the system:
//! - Value / Row: cell values and result rows
//! - Timestamp: epoch-millisecond time used by timestamp columns
//! - Schema registry: the closed `EntityName` set, column sets, validators
//! - Query fragments: `EntityQuery`, predicates, joins, changesets
//! - Traits: the `QueryExecutor` / `TransactionalExecutor` seam
//! - Error: the adapter-wide error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod row;
pub mod schema;
pub mod timestamp;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use query::{
    Assignment, Changeset, ComparisonOp, Condition, EntityQuery, JoinClause, JoinStrategy,
    OrderBy, Predicate, Projection, RelationSelect, SortDirection,
};
pub use row::Row;
pub use schema::{
    resolve_entity, validate_columns, validate_model, validate_select, ColumnDef, ColumnDefault,
    ColumnKind, EntityName, Selection,
};
pub use timestamp::Timestamp;
pub use traits::{QueryExecutor, TransactionalExecutor};
pub use value::Value;
