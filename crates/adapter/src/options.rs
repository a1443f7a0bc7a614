//! Runtime options supplied by the auth library at `configure` time

use serde::{Deserialize, Serialize};

/// Runtime options for adapters produced by a factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthOptions {
    /// Assign a UUID `id` in `create` when the data carries none and the
    /// adapter configuration allows id generation.
    pub generate_id: bool,
    /// Honor join descriptors. When off, relations are left to the caller.
    pub experimental_joins: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            generate_id: true,
            experimental_joins: true,
        }
    }
}
