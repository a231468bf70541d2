//! Configuration operator helpers.

use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::operator::ConfigSummary;

/// Parse configuration TOML; empty text yields the defaults.
pub(super) fn parse(config_toml: &str) -> Result<Config> {
    Config::parse_toml(config_toml)
}

pub(super) fn summarize(config: &Config) -> ConfigSummary {
    let scheduler = &config.scheduler;
    ConfigSummary {
        fee_bps: config.policy.fee_bps,
        void_band_bps: config.policy.void_band_bps,
        min_entry: config.policy.min_entry,
        oracle_version: config.policy.oracle_version.clone(),
        database: config.storage.database.clone(),
        proof_dir: config.storage.proof_dir.clone(),
        tick_secs: scheduler.tick_secs,
        max_concurrent_resolutions: scheduler.max_concurrent_resolutions,
        backoff: format!(
            "{}ms..{}ms x{}",
            scheduler.initial_backoff_ms, scheduler.max_backoff_ms, scheduler.backoff_multiplier
        ),
        price_sources: config.price.sources.iter().map(|s| s.name.clone()).collect(),
        events_path: config.ledger.events_path.clone(),
        max_parked: config.ledger.max_parked,
        warnings: config.warnings(),
    }
}
