//! Operator-facing use cases: configuration, wiring and the long-running
//! loop. Configuration crosses this port as TOML text so drivers stay free
//! of infrastructure types.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::port::inbound::pools::PoolApi;

/// Effective configuration, as reported by `config check`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub fee_bps: i64,
    pub void_band_bps: i64,
    pub min_entry: u64,
    pub oracle_version: String,
    pub database: String,
    pub proof_dir: String,
    pub tick_secs: u64,
    pub max_concurrent_resolutions: usize,
    pub backoff: String,
    pub price_sources: Vec<String>,
    pub events_path: Option<String>,
    pub max_parked: usize,
    /// Non-fatal observations, such as disabled price sources.
    pub warnings: Vec<String>,
}

/// Inputs for the runtime loop.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub config_toml: String,
    /// Overrides `ledger.events_path`.
    pub events_path: Option<String>,
    /// Overrides `scheduler.tick_secs`.
    pub tick_secs: Option<u64>,
}

/// Totals over one runtime session or replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    /// Events that changed the projection.
    pub applied: usize,
    pub duplicates: usize,
    pub rejected: usize,
    /// Events still parked at the end.
    pub parked: usize,
    /// Lines read from the ledger source, when it counts them.
    pub lines: Option<usize>,
}

#[async_trait]
pub trait OperatorPort: Send + Sync {
    /// Parse and validate configuration.
    fn check_config(&self, config_toml: &str) -> Result<ConfigSummary>;

    /// Install the tracing subscriber described by the configuration.
    fn init_logging(&self, config_toml: &str) -> Result<()>;

    /// Wire a pool engine over the configured store and adapters.
    fn pools(&self, config_toml: &str) -> Result<Arc<dyn PoolApi>>;

    /// Run the scheduler and ledger reconciler until interrupted.
    async fn run(&self, request: RunRequest) -> Result<RunSummary>;

    /// Apply a JSON-lines file of confirmed ledger events once.
    async fn replay(&self, config_toml: &str, events_path: &str) -> Result<RunSummary>;
}
