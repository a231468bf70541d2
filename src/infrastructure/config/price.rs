//! Price source configuration.

use serde::Deserialize;

/// One HTTP price source.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSourceConfig {
    /// Name recorded in price samples and proofs.
    pub name: String,
    /// URL template; `{asset}` is replaced with the asset id.
    pub url: String,
    /// JSON pointer to the price; may contain `{asset}`.
    pub pointer: String,
    #[serde(default)]
    pub api_key_header: Option<String>,
    /// Environment variable holding the API key. The source is skipped
    /// when the variable is unset.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// `[price]` section. Sources are tried in order.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<PriceSourceConfig>,
}

fn default_sources() -> Vec<PriceSourceConfig> {
    vec![
        PriceSourceConfig {
            name: "jupiter".to_string(),
            url: "https://price.jup.ag/v6/price?ids={asset}".to_string(),
            pointer: "/data/{asset}/price".to_string(),
            api_key_header: None,
            api_key_env: None,
        },
        PriceSourceConfig {
            name: "birdeye".to_string(),
            url: "https://public-api.birdeye.so/defi/price?address={asset}".to_string(),
            pointer: "/data/value".to_string(),
            api_key_header: Some("X-API-KEY".to_string()),
            api_key_env: Some("BIRDEYE_API_KEY".to_string()),
        },
    ]
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
        }
    }
}
