//! Settlement policy configuration.

use serde::Deserialize;

use crate::application::state::Policy;
use crate::domain::money::{Amount, Bps};

/// `[policy]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Fee on each entry's gross amount, in basis points.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: i64,
    /// Half-width of the band around the line that resolves Void.
    #[serde(default = "default_void_band_bps")]
    pub void_band_bps: i64,
    /// Smallest gross entry, in base units.
    #[serde(default = "default_min_entry")]
    pub min_entry: u64,
    #[serde(default = "default_oracle_version")]
    pub oracle_version: String,
}

const fn default_fee_bps() -> i64 {
    75
}

const fn default_void_band_bps() -> i64 {
    1
}

const fn default_min_entry() -> u64 {
    10_000_000
}

fn default_oracle_version() -> String {
    "v1.0.0".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            fee_bps: default_fee_bps(),
            void_band_bps: default_void_band_bps(),
            min_entry: default_min_entry(),
            oracle_version: default_oracle_version(),
        }
    }
}

impl From<&PolicyConfig> for Policy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            fee_bps: Bps::new(config.fee_bps),
            void_band: Bps::new(config.void_band_bps),
            min_entry: Amount::new(config.min_entry),
            oracle_version: config.oracle_version.clone(),
        }
    }
}
