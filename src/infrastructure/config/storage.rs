//! Storage locations.

use serde::Deserialize;

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path, or `:memory:` for an in-process store.
    #[serde(default = "default_database")]
    pub database: String,
    /// Directory proofs are published to.
    #[serde(default = "default_proof_dir")]
    pub proof_dir: String,
}

fn default_database() -> String {
    "linepool.db".to_string()
}

fn default_proof_dir() -> String {
    "proofs".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            proof_dir: default_proof_dir(),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database == ":memory:"
    }
}
