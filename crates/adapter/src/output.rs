//! Output enum for command execution results.
//!
//! Every command produces exactly one output variant; the mapping is listed
//! on each [`crate::Command`] variant.

use serde::{Deserialize, Serialize};

use authbridge_core::Row;

/// Successful command results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// No return value (delete)
    Unit,
    /// Single row (create)
    Row(Row),
    /// Optional row (findOne, update)
    MaybeRow(Option<Row>),
    /// Row list (findMany, updateMany)
    Rows(Vec<Row>),
    /// Row count (count, deleteMany)
    Count(u64),
}

impl Output {
    /// Number of rows carried or counted
    pub fn len(&self) -> u64 {
        match self {
            Output::Unit | Output::MaybeRow(None) => 0,
            Output::Row(_) | Output::MaybeRow(Some(_)) => 1,
            Output::Rows(rows) => rows.len() as u64,
            Output::Count(n) => *n,
        }
    }

    /// Whether the output carries or counts no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
