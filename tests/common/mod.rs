//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

pub use authbridge::{
    AdapterConfig, AdapterFactory, AuthOptions, Cardinality, Command, CrudAdapter, EntityName,
    Error, FilterClause, JoinDescriptor, JoinMap, MemoryStore, Operator, Output, Row, SortSpec,
    Value,
};
use tempfile::TempDir;

// ============================================================================
// TestDb - factory over a fresh store, already configured
// ============================================================================

/// Configured factory over an empty in-memory store.
pub struct TestDb {
    pub factory: AdapterFactory<MemoryStore>,
}

impl TestDb {
    /// Default configuration, default options.
    pub fn new() -> Self {
        Self::with_config(AdapterConfig::default())
    }

    /// Custom configuration, default options.
    pub fn with_config(config: AdapterConfig) -> Self {
        let factory = AdapterFactory::new(MemoryStore::new(), config);
        factory.configure(AuthOptions::default());
        Self { factory }
    }

    /// Factory loaded from a `authbridge.toml` written into a temp dir.
    pub fn from_toml(toml: &str) -> (Self, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(authbridge::CONFIG_FILE_NAME), toml).expect("write config");
        let factory = authbridge::open_in_memory(dir.path()).expect("open");
        factory.configure(AuthOptions::default());
        (Self { factory }, dir)
    }

    /// Adapter bound to the store.
    pub fn adapter(&self) -> CrudAdapter<'_, MemoryStore> {
        self.factory.adapter().expect("configured")
    }

    /// Physical row count of an entity.
    pub fn rows(&self, entity: EntityName) -> usize {
        self.factory.executor().row_count(entity)
    }

    /// Seed the concrete user scenario row `{id: u1, email: a@b.com, name: A}`.
    pub fn seed_user(&self) -> Row {
        self.adapter()
            .create("user", user_row("u1", "a@b.com", "A"), None)
            .expect("seed user")
    }

    /// Seed `n` sessions for `user_id`, ids `<user_id>-s0..`.
    pub fn seed_sessions(&self, user_id: &str, n: usize) {
        for i in 0..n {
            self.adapter()
                .create("session", session_row(&format!("{user_id}-s{i}"), user_id), None)
                .expect("seed session");
        }
    }

    /// Seed prompts: `active` active rows and `inactive` inactive rows.
    pub fn seed_prompts(&self, active: usize, inactive: usize) {
        for i in 0..active + inactive {
            self.adapter()
                .create(
                    "prompts",
                    Row::new()
                        .with("text", format!("prompt {i}"))
                        .with("isActive", i < active),
                    None,
                )
                .expect("seed prompt");
        }
    }
}

// ============================================================================
// Row builders
// ============================================================================

pub fn user_row(id: &str, email: &str, name: &str) -> Row {
    Row::new().with("id", id).with("email", email).with("name", name)
}

/// Expiry stamped on seeded sessions (epoch millis, far future).
pub const SESSION_EXPIRES_AT: i64 = 4_102_444_800_000;

pub fn session_row(id: &str, user_id: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("token", format!("tok-{id}"))
        .with("userId", user_id)
        .with("expiresAt", SESSION_EXPIRES_AT)
}

pub fn account_row(id: &str, user_id: &str, provider: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("userId", user_id)
        .with("accountId", format!("{provider}-{user_id}"))
        .with("providerId", provider)
}
