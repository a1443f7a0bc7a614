//! Error types for the persistence adapter
//!
//! Every layer (registry, engine, adapter, factory) reports failures through
//! the single [`Error`] enum defined here. We use `thiserror` for automatic
//! `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants | Raised by |
//! |----------|----------|-----------|
//! | Validation | `UnknownModel`, `UnknownColumn` | schema registry, before any query runs |
//! | Constraint | `ConstraintViolation` | query engine on insert/update |
//! | Configuration | `NotConfigured` | factory, when a transaction starts before `configure` |
//! | Concurrency | `TransactionConflict` | query engine at commit |
//! | Input / System | `InvalidInput`, `Serialization`, `Internal` | command decoding, invariant breaks |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::EntityName;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the persistence adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum Error {
    /// Model name is not part of the closed entity set
    #[error("unknown model: {model}")]
    UnknownModel {
        /// The rejected model name, as supplied by the caller
        model: String,
    },

    /// One or more column names are not part of the entity's column set
    #[error("unknown column(s) for {entity}: {}", columns.join(", "))]
    UnknownColumn {
        /// Entity the columns were validated against
        entity: EntityName,
        /// Every offending column name, in request order
        columns: Vec<String>,
    },

    /// The query engine rejected a write (unique, primary key, not-null, type)
    #[error("constraint violation: {reason}")]
    ConstraintViolation {
        /// Engine-provided description, passed through untranslated
        reason: String,
    },

    /// A transaction was requested before runtime options were configured
    #[error("adapter factory is not configured: call configure() before run_transaction()")]
    NotConfigured,

    /// Commit lost a first-committer-wins race on the named entity
    #[error("transaction conflict on {entity}: table changed since the transaction began")]
    TransactionConflict {
        /// Entity whose table version moved underneath the transaction
        entity: EntityName,
    },

    /// Malformed request that is not a schema violation
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem
        reason: String,
    },

    /// Serialization or deserialization failure
    #[error("serialization error: {reason}")]
    Serialization {
        /// Underlying error text
        reason: String,
    },

    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal {
        /// Description of the broken invariant
        reason: String,
    },
}

impl Error {
    /// Build an `InvalidInput` error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Build a `ConstraintViolation` error
    pub fn constraint(reason: impl Into<String>) -> Self {
        Error::ConstraintViolation {
            reason: reason.into(),
        }
    }

    /// Build an `Internal` error
    pub fn internal(reason: impl Into<String>) -> Self {
        Error::Internal {
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised by the schema registry
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::UnknownModel { .. } | Error::UnknownColumn { .. })
    }

    /// Returns true if the commit lost a conflict race
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::TransactionConflict { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            reason: e.to_string(),
        }
    }
}
