//! Persistence adapter between an auth library and a relational engine
//!
//! This crate turns abstract persistence requests (model name, where-clauses,
//! sort, pagination, relation joins, transaction scoping) into engine
//! queries:
//! - Filter compiler: where-clauses to predicates, with tagged operator fallback
//! - Join composer: relation descriptors to left / lateral joins
//! - CrudAdapter: the eight operations, including the session soft-delete
//! - AdapterFactory: configure-then-transact lifecycle
//! - AdapterConfig: `authbridge.toml`; AuthOptions: runtime options
//! - Command / Output: the operations as serializable data
//!
//! # Example
//!
//! ```ignore
//! let factory = AdapterFactory::new(MemoryStore::new(), AdapterConfig::default());
//! let adapter = factory.configure(AuthOptions::default());
//! let user = adapter.find_one("user", &[FilterClause::eq("email", "a@b.com")], None, None)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod command;
pub mod config;
pub mod factory;
pub mod filter;
pub mod join;
pub mod options;
pub mod output;

pub use adapter::{CrudAdapter, SortSpec, SESSION_INVALIDATION_COLUMN};
pub use command::Command;
pub use config::{AdapterConfig, CONFIG_FILE_NAME};
pub use factory::{AdapterFactory, TxAdapter};
pub use filter::{
    compile_where, CompiledWhere, Connector, FilterClause, Operator, OperatorResolution,
};
pub use join::{apply_joins, Cardinality, JoinDescriptor, JoinMap, JoinOn, JoinedQuery, DEFAULT_JOIN_LIMIT};
pub use options::AuthOptions;
pub use output::Output;
