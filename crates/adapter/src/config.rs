//! Adapter configuration via `authbridge.toml`
//!
//! The configuration describes the adapter to the auth library (identity and
//! capability flags) and is fixed for the lifetime of a factory. On first
//! start a default `authbridge.toml` is written; edit it and restart to
//! change settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use authbridge_core::{EntityName, Error, Result};

/// Config file name placed in the application's config directory.
pub const CONFIG_FILE_NAME: &str = "authbridge.toml";

/// Adapter configuration loaded from `authbridge.toml`.
///
/// # Example
///
/// ```toml
/// adapter_id = "authbridge"
/// use_plural = true
/// debug_logs = false
/// transactions = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Stable identifier reported to the auth library.
    #[serde(default = "default_adapter_id")]
    pub adapter_id: String,
    /// Human-readable adapter name.
    #[serde(default = "default_adapter_name")]
    pub adapter_name: String,
    /// Whether model names are reported in plural form.
    #[serde(default = "default_true")]
    pub use_plural: bool,
    /// Emit one debug line per adapter operation.
    #[serde(default)]
    pub debug_logs: bool,
    /// Capability: UUID primary keys.
    #[serde(default = "default_true")]
    pub supports_uuids: bool,
    /// Capability: JSON columns.
    #[serde(default = "default_true")]
    pub supports_json: bool,
    /// Capability: array columns.
    #[serde(default = "default_true")]
    pub supports_arrays: bool,
    /// Leave id assignment to the engine's column defaults.
    #[serde(default = "default_true")]
    pub disable_id_generation: bool,
    /// Run `run_transaction` callbacks inside an engine transaction.
    #[serde(default = "default_true")]
    pub transactions: bool,
}

fn default_adapter_id() -> String {
    "authbridge".to_string()
}

fn default_adapter_name() -> String {
    "AuthBridge Adapter".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            adapter_id: default_adapter_id(),
            adapter_name: default_adapter_name(),
            use_plural: true,
            debug_logs: false,
            supports_uuids: true,
            supports_json: true,
            supports_arrays: true,
            disable_id_generation: true,
            transactions: true,
        }
    }
}

impl AdapterConfig {
    /// Name under which `entity` is reported in logs and outputs.
    pub fn model_label(&self, entity: EntityName) -> &'static str {
        if self.use_plural {
            entity.table_name()
        } else {
            entity.model_name()
        }
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `adapter_id` is blank.
    pub fn validate(&self) -> Result<()> {
        if self.adapter_id.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "adapter_id in {CONFIG_FILE_NAME} must not be empty"
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# authbridge adapter configuration
#
# Identity reported to the auth library
adapter_id = "authbridge"
adapter_name = "AuthBridge Adapter"

# Report model names in plural form ("users" rather than "user")
use_plural = true

# Log every adapter operation at debug level (default: false)
debug_logs = false

# Capability flags
supports_uuids = true
supports_json = true
supports_arrays = true

# Let the engine assign ids through column defaults (default: true)
disable_id_generation = true

# Wrap run_transaction callbacks in an engine transaction (default: true)
# When false, callbacks run against the auto-commit adapter.
transactions = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::internal(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: AdapterConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
