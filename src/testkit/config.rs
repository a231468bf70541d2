//! Canonical test configurations.
//!
//! Single source of truth for settings used across tests, with short
//! timeouts and backoff so nothing waits.

use std::time::Duration;

use crate::application::engine::EngineSettings;
use crate::application::resolution::Timeouts;
use crate::application::retry::Backoff;
use crate::application::scheduler::SchedulerSettings;
use crate::application::state::Policy;
use crate::domain::curve::CurveParams;

/// Production policy: 75 bps fee, 1 bps void band.
pub fn policy() -> Policy {
    Policy::default()
}

pub fn timeouts() -> Timeouts {
    Timeouts {
        price: Duration::from_millis(200),
        proof: Duration::from_millis(200),
    }
}

/// Backoff of 1s doubling to 8s, easy to step over with a manual clock.
pub fn backoff() -> Backoff {
    Backoff {
        initial_delay_ms: 1_000,
        max_delay_ms: 8_000,
        multiplier: 2.0,
    }
}

pub fn engine_settings() -> EngineSettings {
    EngineSettings {
        curve: CurveParams::default(),
        timeouts: timeouts(),
        backoff: backoff(),
        scheduler: SchedulerSettings {
            max_concurrent_resolutions: 4,
            overdue_grace: chrono::Duration::minutes(10),
            sample_prices: true,
        },
        max_parked: 16,
    }
}
