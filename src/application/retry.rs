//! Per-pool retry scheduling with exponential backoff and jitter.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;

use crate::domain::id::PoolId;

/// Backoff parameters.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 300_000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RetryState {
    attempts: u32,
    next_delay_ms: u64,
    not_before: DateTime<Utc>,
}

/// A scheduled retry after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRetry {
    pub attempt: u32,
    pub delay_ms: u64,
}

/// Tracks failing pools and when they may be attempted again.
#[derive(Debug, Default)]
pub struct RetryTracker {
    backoff: Backoff,
    states: Mutex<HashMap<PoolId, RetryState>>,
}

impl RetryTracker {
    #[must_use]
    pub fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// True when `pool_id` has no pending backoff at `now`.
    #[must_use]
    pub fn ready(&self, pool_id: PoolId, now: DateTime<Utc>) -> bool {
        self.states
            .lock()
            .get(&pool_id)
            .map_or(true, |s| now >= s.not_before)
    }

    /// Record a failed attempt and schedule the next one.
    pub fn record_failure(&self, pool_id: PoolId, now: DateTime<Utc>) -> ScheduledRetry {
        let mut states = self.states.lock();
        let state = states.entry(pool_id).or_insert(RetryState {
            attempts: 0,
            next_delay_ms: self.backoff.initial_delay_ms,
            not_before: now,
        });

        let base = state.next_delay_ms;
        let delay_ms = base + jitter_ms(base);
        state.attempts += 1;
        state.not_before = now + Duration::milliseconds(delay_ms as i64);
        let next = (base as f64 * self.backoff.multiplier) as u64;
        state.next_delay_ms = next.min(self.backoff.max_delay_ms);

        ScheduledRetry {
            attempt: state.attempts,
            delay_ms,
        }
    }

    /// Forget a pool's failures after a success.
    pub fn record_success(&self, pool_id: PoolId) {
        self.states.lock().remove(&pool_id);
    }

    #[must_use]
    pub fn attempts(&self, pool_id: PoolId) -> u32 {
        self.states.lock().get(&pool_id).map_or(0, |s| s.attempts)
    }
}

/// Up to 20% random jitter on top of the base delay.
fn jitter_ms(base_ms: u64) -> u64 {
    let range = base_ms / 5;
    if range == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RetryTracker {
        RetryTracker::new(Backoff {
            initial_delay_ms: 100,
            max_delay_ms: 400,
            multiplier: 2.0,
        })
    }

    #[test]
    fn unknown_pool_is_ready() {
        assert!(tracker().ready(PoolId::new(1), Utc::now()));
    }

    #[test]
    fn failure_defers_until_delay_elapses() {
        let t = tracker();
        let now = Utc::now();
        let retry = t.record_failure(PoolId::new(1), now);
        assert_eq!(retry.attempt, 1);
        assert!((100..=120).contains(&retry.delay_ms));
        assert!(!t.ready(PoolId::new(1), now));
        assert!(t.ready(PoolId::new(1), now + Duration::milliseconds(121)));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let t = tracker();
        let now = Utc::now();
        let delays: Vec<u64> = (0..5)
            .map(|_| t.record_failure(PoolId::new(1), now).delay_ms)
            .collect();
        assert!((200..=240).contains(&delays[1]));
        assert!((400..=480).contains(&delays[2]));
        assert!((400..=480).contains(&delays[4]));
        assert_eq!(t.attempts(PoolId::new(1)), 5);
    }

    #[test]
    fn success_resets() {
        let t = tracker();
        let now = Utc::now();
        t.record_failure(PoolId::new(1), now);
        t.record_success(PoolId::new(1));
        assert_eq!(t.attempts(PoolId::new(1)), 0);
        let retry = t.record_failure(PoolId::new(1), now);
        assert!((100..=120).contains(&retry.delay_ms));
    }

    #[test]
    fn zero_delay_has_no_jitter() {
        let t = RetryTracker::new(Backoff {
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
        });
        assert_eq!(t.record_failure(PoolId::new(1), Utc::now()).delay_ms, 0);
    }
}
