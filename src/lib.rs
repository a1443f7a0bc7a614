//! authbridge - schema-whitelisted persistence adapter for auth entities
//!
//! authbridge sits between an authentication library and a relational engine.
//! The library speaks in abstract requests (model name, where-clauses, sort,
//! pagination, relation joins); authbridge validates every model and column
//! name against a closed schema, compiles the request into an engine query
//! and runs it, optionally inside a transaction.
//!
//! # Quick Start
//!
//! ```
//! use authbridge::{AdapterConfig, AdapterFactory, AuthOptions, FilterClause, MemoryStore, Row};
//!
//! let factory = AdapterFactory::new(MemoryStore::new(), AdapterConfig::default());
//! let adapter = factory.configure(AuthOptions::default());
//!
//! adapter.create(
//!     "user",
//!     Row::new().with("id", "u1").with("email", "a@b.com").with("name", "A"),
//!     None,
//! )?;
//! let found = adapter.find_one("user", &[FilterClause::eq("email", "a@b.com")], None, None)?;
//! assert_eq!(found.and_then(|r| r.get_str("id").map(str::to_string)), Some("u1".into()));
//! # Ok::<(), authbridge::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `authbridge-core`: values, schema registry, query fragments, executor traits
//! - `authbridge-storage`: the in-memory engine behind those traits
//! - `authbridge-adapter`: filter compiler, join composer, CRUD adapter, factory

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use authbridge_adapter::*;
pub use authbridge_core::{
    resolve_entity, validate_columns, validate_model, validate_select, EntityName, Error,
    QueryExecutor, Result, Row, Selection, Timestamp, TransactionalExecutor, Value,
};
pub use authbridge_storage::{MemoryStore, TransactionMetrics};

/// Install a global `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// # Errors
///
/// Returns `InvalidInput` if `RUST_LOG` does not parse or a global
/// subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives)
            .map_err(|e| Error::invalid_input(format!("Invalid log filter: {e}")))?,
        Err(_) => EnvFilter::new("info"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|_| Error::invalid_input("Logging already initialized"))
}

/// Factory over a fresh in-memory store, configured from
/// `<dir>/authbridge.toml`.
///
/// A default config file is written on first use.
///
/// # Errors
///
/// Returns an error if the config file cannot be written, read or parsed.
pub fn open_in_memory(dir: &Path) -> Result<AdapterFactory<MemoryStore>> {
    let path = dir.join(CONFIG_FILE_NAME);
    AdapterConfig::write_default_if_missing(&path)?;
    let config = AdapterConfig::from_file(&path)?;
    info!(target: "authbridge", path = %path.display(), adapter = %config.adapter_id, "Opened in-memory adapter");
    Ok(AdapterFactory::new(MemoryStore::new(), config))
}
