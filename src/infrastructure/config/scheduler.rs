//! Scheduler, timeout and retry configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::resolution::Timeouts;
use crate::application::retry::Backoff;
use crate::application::scheduler::SchedulerSettings;

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduler ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default = "default_max_concurrent_resolutions")]
    pub max_concurrent_resolutions: usize,
    /// Seconds past `end_ts` before a pool is reported overdue.
    #[serde(default = "default_overdue_grace_secs")]
    pub overdue_grace_secs: u64,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_price_timeout_ms")]
    pub price_timeout_ms: u64,
    #[serde(default = "default_proof_timeout_ms")]
    pub proof_timeout_ms: u64,
    /// Record a price sample for every active pool on each tick.
    #[serde(default = "default_sample_prices")]
    pub sample_prices: bool,
}

const fn default_tick_secs() -> u64 {
    15
}

fn default_max_concurrent_resolutions() -> usize {
    num_cpus::get().clamp(1, 8)
}

const fn default_overdue_grace_secs() -> u64 {
    600
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    300_000
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

const fn default_price_timeout_ms() -> u64 {
    10_000
}

const fn default_proof_timeout_ms() -> u64 {
    30_000
}

const fn default_sample_prices() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            max_concurrent_resolutions: default_max_concurrent_resolutions(),
            overdue_grace_secs: default_overdue_grace_secs(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            price_timeout_ms: default_price_timeout_ms(),
            proof_timeout_ms: default_proof_timeout_ms(),
            sample_prices: default_sample_prices(),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    #[must_use]
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            max_concurrent_resolutions: self.max_concurrent_resolutions,
            overdue_grace: chrono::Duration::seconds(
                i64::try_from(self.overdue_grace_secs).unwrap_or(i64::MAX / 1_000),
            ),
            sample_prices: self.sample_prices,
        }
    }

    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial_delay_ms: self.initial_backoff_ms,
            max_delay_ms: self.max_backoff_ms,
            multiplier: self.backoff_multiplier,
        }
    }

    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            price: Duration::from_millis(self.price_timeout_ms),
            proof: Duration::from_millis(self.proof_timeout_ms),
        }
    }
}
