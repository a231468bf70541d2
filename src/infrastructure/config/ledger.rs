//! Ledger event source configuration.

use serde::Deserialize;

/// `[ledger]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JSON-lines file of confirmed events consumed by `run`.
    #[serde(default)]
    pub events_path: Option<String>,
    /// Bound on events held back waiting for a missing dependency.
    #[serde(default = "default_max_parked")]
    pub max_parked: usize,
}

const fn default_max_parked() -> usize {
    1_024
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            events_path: None,
            max_parked: default_max_parked(),
        }
    }
}
