//! Command enum: the adapter operations as data
//!
//! Commands are the serialized form of the abstract request the auth
//! library hands the adapter:
//! - **Self-contained**: every parameter of the operation is in the variant
//! - **Serializable**: JSON field names match the auth library's request
//!   shape (`where`, `sortBy`, `update`)
//! - **Pure data**: no closures or executor handles

use serde::{Deserialize, Serialize};

use authbridge_core::Row;

use crate::adapter::SortSpec;
use crate::filter::FilterClause;
use crate::join::JoinMap;

/// One adapter operation.
///
/// # Example
///
/// ```
/// use authbridge_adapter::Command;
///
/// let cmd: Command = serde_json::from_str(r#"{
///     "Count": {"model": "prompts", "where": [{"field": "isActive", "value": true}]}
/// }"#).unwrap();
/// assert!(matches!(cmd, Command::Count { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Insert one row.
    /// Returns: `Output::Row`
    Create {
        model: String,
        data: Row,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        select: Option<Vec<String>>,
    },

    /// Fetch at most one row.
    /// Returns: `Output::MaybeRow`
    FindOne {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        select: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        join: Option<JoinMap>,
    },

    /// Fetch rows with sort and pagination.
    /// Returns: `Output::Rows`
    FindMany {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
        #[serde(rename = "sortBy", default, skip_serializing_if = "Option::is_none")]
        sort_by: Option<SortSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        join: Option<JoinMap>,
    },

    /// Update at most one row.
    /// Returns: `Output::MaybeRow`
    Update {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
        update: Row,
    },

    /// Update every matching row.
    /// Returns: `Output::Rows`
    UpdateMany {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
        update: Row,
    },

    /// Count matching rows.
    /// Returns: `Output::Count`
    Count {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
    },

    /// Physically delete matching rows.
    /// Returns: `Output::Unit`
    Delete {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
    },

    /// Delete matching rows (sessions are marked invalid instead).
    /// Returns: `Output::Count`
    DeleteMany {
        model: String,
        #[serde(rename = "where", default)]
        where_: Vec<FilterClause>,
    },
}

impl Command {
    /// Operation name as the auth library spells it
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::FindOne { .. } => "findOne",
            Command::FindMany { .. } => "findMany",
            Command::Update { .. } => "update",
            Command::UpdateMany { .. } => "updateMany",
            Command::Count { .. } => "count",
            Command::Delete { .. } => "delete",
            Command::DeleteMany { .. } => "deleteMany",
        }
    }

    /// Model name the command targets (unvalidated)
    pub fn model(&self) -> &str {
        match self {
            Command::Create { model, .. }
            | Command::FindOne { model, .. }
            | Command::FindMany { model, .. }
            | Command::Update { model, .. }
            | Command::UpdateMany { model, .. }
            | Command::Count { model, .. }
            | Command::Delete { model, .. }
            | Command::DeleteMany { model, .. } => model,
        }
    }
}
