//! Schema registry: the closed set of entities and their column sets
//!
//! Every model name and column name that arrives from the auth subsystem is
//! untrusted. This module is the whitelist: [`validate_model`] maps a string
//! onto the closed [`EntityName`] enum, and [`validate_select`] /
//! [`validate_columns`] check names against that entity's [`ColumnDef`] list.
//! Nothing here allocates per-process state; the registry is plain static
//! data and is safe to read from any thread.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Storage kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Free text
    Text,
    /// UUID carried as text
    Uuid,
    /// Boolean
    Bool,
    /// 64-bit integer
    Integer,
    /// Epoch milliseconds carried as integer
    Timestamp,
}

/// Engine-side default applied when an insert omits the column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnDefault {
    /// Random UUID string
    GeneratedId,
    /// Per-table auto-increment counter
    Serial,
    /// Constant boolean
    Bool(bool),
    /// Current engine time
    Now,
}

/// Definition of one column of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name as exposed to callers (camelCase)
    pub name: &'static str,
    /// Storage kind
    pub kind: ColumnKind,
    /// Whether NULL is accepted
    pub nullable: bool,
    /// Default applied on insert when the column is omitted
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            default: None,
        }
    }

    const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            default: None,
        }
    }

    const fn defaulted(name: &'static str, kind: ColumnKind, default: ColumnDefault) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            default: Some(default),
        }
    }
}

use ColumnDefault::{GeneratedId, Now, Serial};
use ColumnKind::{Bool, Integer, Text, Timestamp, Uuid};

const ACCOUNT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::defaulted("id", Text, GeneratedId),
    ColumnDef::required("userId", Uuid),
    ColumnDef::required("accountId", Text),
    ColumnDef::required("providerId", Text),
    ColumnDef::optional("accessToken", Text),
    ColumnDef::optional("refreshToken", Text),
    ColumnDef::optional("accessTokenExpiresAt", Timestamp),
    ColumnDef::optional("refreshTokenExpiresAt", Timestamp),
    ColumnDef::optional("scope", Text),
    ColumnDef::optional("idToken", Text),
    ColumnDef::optional("password", Text),
    ColumnDef::defaulted("createdAt", Timestamp, Now),
    ColumnDef::defaulted("updatedAt", Timestamp, Now),
];

const SESSION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::defaulted("id", Text, GeneratedId),
    ColumnDef::required("token", Text),
    ColumnDef::optional("userId", Uuid),
    ColumnDef::optional("ipAddress", Text),
    ColumnDef::optional("userAgent", Text),
    ColumnDef::optional("browser", Text),
    ColumnDef::optional("os", Text),
    ColumnDef::optional("device", Text),
    ColumnDef::optional("deviceFingerprint", Text),
    ColumnDef::optional("markedInvalidAt", Timestamp),
    ColumnDef::required("expiresAt", Timestamp),
    ColumnDef::defaulted("createdAt", Timestamp, Now),
    ColumnDef::defaulted("updatedAt", Timestamp, Now),
];

const USER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::defaulted("id", Uuid, GeneratedId),
    ColumnDef::required("email", Text),
    ColumnDef::defaulted("emailVerified", Bool, ColumnDefault::Bool(false)),
    ColumnDef::required("name", Text),
    ColumnDef::optional("image", Text),
    ColumnDef::optional("timeZone", Text),
    ColumnDef::defaulted("createdAt", Timestamp, Now),
    ColumnDef::defaulted("updatedAt", Timestamp, Now),
];

const VERIFICATION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::required("identifier", Text),
    ColumnDef::required("value", Text),
    ColumnDef::required("expiresAt", Timestamp),
    ColumnDef::defaulted("createdAt", Timestamp, Now),
    ColumnDef::defaulted("updatedAt", Timestamp, Now),
];

const PROMPT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::defaulted("promptId", Integer, Serial),
    ColumnDef::required("text", Text),
    ColumnDef::optional("category", Text),
    ColumnDef::defaulted("isActive", Bool, ColumnDefault::Bool(true)),
    ColumnDef::defaulted("createdAt", Timestamp, Now),
    ColumnDef::defaulted("updatedAt", Timestamp, Now),
];

/// The closed set of entities the adapter may touch.
///
/// Serializes as the canonical (plural) table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityName {
    /// OAuth / credential accounts linked to a user
    Account,
    /// Login sessions (soft-deleted by `deleteMany`)
    Session,
    /// Users
    User,
    /// Email / token verification records
    Verification,
    /// Journal prompts (application table)
    Prompt,
}

impl EntityName {
    /// Every registered entity, in declaration order
    pub const ALL: [EntityName; 5] = [
        EntityName::Account,
        EntityName::Session,
        EntityName::User,
        EntityName::Verification,
        EntityName::Prompt,
    ];

    /// Canonical table name
    pub const fn table_name(&self) -> &'static str {
        match self {
            EntityName::Account => "accounts",
            EntityName::Session => "sessions",
            EntityName::User => "users",
            EntityName::Verification => "verifications",
            EntityName::Prompt => "prompts",
        }
    }

    /// Singular model name
    pub const fn model_name(&self) -> &'static str {
        match self {
            EntityName::Account => "account",
            EntityName::Session => "session",
            EntityName::User => "user",
            EntityName::Verification => "verification",
            EntityName::Prompt => "prompt",
        }
    }

    /// Resolve a model name, singular or plural. Exact match only.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.table_name() == name || e.model_name() == name)
    }

    /// Ordered column definitions
    pub const fn columns(&self) -> &'static [ColumnDef] {
        match self {
            EntityName::Account => ACCOUNT_COLUMNS,
            EntityName::Session => SESSION_COLUMNS,
            EntityName::User => USER_COLUMNS,
            EntityName::Verification => VERIFICATION_COLUMNS,
            EntityName::Prompt => PROMPT_COLUMNS,
        }
    }

    /// Ordered column names
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns().iter().map(|c| c.name)
    }

    /// Look up one column definition
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Whether `name` is in the column set
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Primary key columns
    pub const fn primary_key(&self) -> &'static [&'static str] {
        match self {
            EntityName::Account | EntityName::Session | EntityName::User => &["id"],
            EntityName::Verification => &["identifier", "value"],
            EntityName::Prompt => &["promptId"],
        }
    }

    /// Unique constraints other than the primary key
    pub const fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            EntityName::User => &[&["email"]],
            _ => &[],
        }
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl TryFrom<String> for EntityName {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        validate_model(&name)
    }
}

impl From<EntityName> for String {
    fn from(entity: EntityName) -> Self {
        entity.table_name().to_string()
    }
}

/// Projection requested by a select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Wildcard: every column of the entity
    All,
    /// Explicit column list, in request order
    Columns(Vec<&'static str>),
}

impl Selection {
    /// Resolve to concrete column names for `entity`
    pub fn column_names(&self, entity: EntityName) -> Vec<&'static str> {
        match self {
            Selection::All => entity.column_names().collect(),
            Selection::Columns(cols) => cols.clone(),
        }
    }

    /// Whether this is the wildcard sentinel
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Map an untrusted model name onto the closed entity set.
pub fn validate_model(name: &str) -> Result<EntityName> {
    EntityName::parse(name).ok_or_else(|| Error::UnknownModel {
        model: name.to_string(),
    })
}

/// Resolve a model name without failing (used for join targets).
pub fn resolve_entity(name: &str) -> Option<EntityName> {
    EntityName::parse(name)
}

/// Validate an optional select list against the entity's column set.
///
/// `None` yields [`Selection::All`]. Otherwise every column must exist; the
/// error lists all offending names, not only the first.
pub fn validate_select<S: AsRef<str>>(
    entity: EntityName,
    columns: Option<&[S]>,
) -> Result<Selection> {
    let Some(columns) = columns else {
        return Ok(Selection::All);
    };

    let mut resolved = Vec::with_capacity(columns.len());
    let mut unknown = Vec::new();
    for name in columns {
        match entity.column(name.as_ref()) {
            Some(def) => resolved.push(def.name),
            None => unknown.push(name.as_ref().to_string()),
        }
    }

    if unknown.is_empty() {
        Ok(Selection::Columns(resolved))
    } else {
        Err(Error::UnknownColumn {
            entity,
            columns: unknown,
        })
    }
}

/// Validate arbitrary column names (insert data, update values, sort fields).
pub fn validate_columns<'a, I>(entity: EntityName, names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let unknown: Vec<String> = names
        .into_iter()
        .filter(|name| !entity.has_column(name))
        .map(str::to_string)
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Error::UnknownColumn {
            entity,
            columns: unknown,
        })
    }
}
