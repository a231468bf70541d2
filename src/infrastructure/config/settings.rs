//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. It is
//! loaded from a TOML file; every section is optional and falls back to its
//! defaults. API keys are never read from the file, only from the
//! environment variables the price sources name.
//!
//! # Example
//!
//! ```no_run
//! use linepool::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::curve::CurveConfig;
use super::ledger::LedgerConfig;
use super::logging::LoggingConfig;
use super::policy::PolicyConfig;
use super::price::PriceConfig;
use super::scheduler::SchedulerConfig;
use super::storage::StorageConfig;
use crate::application::engine::EngineSettings;
use crate::application::state::Policy;
use crate::domain::money::Bps;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fees, void band and minimum entry.
    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub curve: CurveConfig,

    /// Tick cadence, concurrency, timeouts and retry backoff.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Ordered price sources.
    #[serde(default)]
    pub price: PriceConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy::from(&self.policy)
    }

    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            curve: (&self.curve).into(),
            timeouts: self.scheduler.timeouts(),
            backoff: self.scheduler.backoff(),
            scheduler: self.scheduler.settings(),
            max_parked: self.ledger.max_parked,
        }
    }

    /// Non-fatal observations about the effective configuration.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for source in &self.price.sources {
            if let Some(var) = &source.api_key_env {
                if std::env::var(var).is_err() {
                    warnings.push(format!(
                        "price source '{}' disabled: {var} is not set",
                        source.name
                    ));
                }
            }
        }
        if self.storage.is_in_memory() {
            warnings.push("storage.database is :memory:, state is lost on exit".to_string());
        }
        if self.policy.void_band_bps == 0 {
            warnings.push("policy.void_band_bps is 0, exact ties resolve Under".to_string());
        }
        warnings
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid("logging.format", "must be 'pretty' or 'json'").into());
        }

        let policy = &self.policy;
        if !(0..Bps::SCALE).contains(&policy.fee_bps) {
            return Err(invalid("policy.fee_bps", "must be in [0, 10000)").into());
        }
        if !(0..=Bps::SCALE).contains(&policy.void_band_bps) {
            return Err(invalid("policy.void_band_bps", "must be in [0, 10000]").into());
        }
        if policy.min_entry == 0 {
            return Err(invalid("policy.min_entry", "must be greater than 0").into());
        }
        if policy.oracle_version.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "policy.oracle_version",
            }
            .into());
        }

        let curve = &self.curve;
        if curve.points < 2 {
            return Err(invalid("curve.points", "must be at least 2").into());
        }
        if !(curve.max_swing > 0.0 && curve.max_swing <= 1.0) {
            return Err(invalid("curve.max_swing", "must be in (0, 1]").into());
        }
        if !(curve.neutral_trend >= 0.0 && curve.neutral_trend <= curve.max_swing) {
            return Err(invalid("curve.neutral_trend", "must be in [0, max_swing]").into());
        }
        if !(curve.oscillation >= 0.0 && curve.oscillation < 1.0) {
            return Err(invalid("curve.oscillation", "must be in [0, 1)").into());
        }

        let scheduler = &self.scheduler;
        if scheduler.tick_secs == 0 {
            return Err(invalid("scheduler.tick_secs", "must be greater than 0").into());
        }
        if scheduler.max_concurrent_resolutions == 0 {
            return Err(invalid(
                "scheduler.max_concurrent_resolutions",
                "must be greater than 0",
            )
            .into());
        }
        if scheduler.overdue_grace_secs > 365 * 24 * 3_600 {
            return Err(invalid("scheduler.overdue_grace_secs", "must be at most a year").into());
        }
        if scheduler.initial_backoff_ms == 0 {
            return Err(invalid("scheduler.initial_backoff_ms", "must be greater than 0").into());
        }
        if scheduler.max_backoff_ms < scheduler.initial_backoff_ms {
            return Err(invalid("scheduler.max_backoff_ms", "must be >= initial_backoff_ms").into());
        }
        if scheduler.backoff_multiplier < 1.0 {
            return Err(invalid("scheduler.backoff_multiplier", "must be >= 1.0").into());
        }
        if scheduler.price_timeout_ms == 0 || scheduler.proof_timeout_ms == 0 {
            return Err(invalid("scheduler.timeouts", "timeouts must be greater than 0").into());
        }

        if self.storage.database.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "storage.database",
            }
            .into());
        }
        if self.storage.proof_dir.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "storage.proof_dir",
            }
            .into());
        }

        if self.price.sources.is_empty() {
            return Err(invalid("price.sources", "at least one source is required").into());
        }
        for source in &self.price.sources {
            if source.name.trim().is_empty() {
                return Err(invalid("price.sources.name", "must not be empty").into());
            }
            let sample = source.url.replace("{asset}", "asset");
            if let Err(e) = url::Url::parse(&sample) {
                return Err(invalid("price.sources.url", format!("{}: {e}", source.name)).into());
            }
            if !source.pointer.starts_with('/') {
                return Err(invalid(
                    "price.sources.pointer",
                    format!("{}: must start with '/'", source.name),
                )
                .into());
            }
            if source.api_key_env.is_some() != source.api_key_header.is_some() {
                return Err(invalid(
                    "price.sources.api_key_header",
                    format!("{}: api_key_header and api_key_env go together", source.name),
                )
                .into());
            }
        }

        if self.ledger.max_parked == 0 {
            return Err(invalid("ledger.max_parked", "must be greater than 0").into());
        }

        Ok(())
    }
}
