//! Periodic lifecycle driver.
//!
//! Each tick samples prices for live pools, locks pools past their lock
//! time, resolves ended pools with bounded concurrency and reports pools
//! that stay unresolved past the grace period.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::lifecycle::LifecycleService;
use crate::application::resolution::ResolutionOracle;
use crate::application::retry::RetryTracker;
use crate::application::state::Context;
use crate::domain::id::PoolId;
use crate::domain::pool::{Pool, PoolStatus};
use crate::domain::price::PricePoint;
use crate::error::Result;
use crate::port::outbound::notifier::{Event, FailureEvent};
use crate::port::outbound::price::PriceOracle;
use crate::port::outbound::store::PoolFilter;

/// Scheduler tuning.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub max_concurrent_resolutions: usize,
    pub overdue_grace: Duration,
    pub sample_prices: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_resolutions: 4,
            overdue_grace: Duration::minutes(10),
            sample_prices: true,
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub sampled: usize,
    pub locked: Vec<PoolId>,
    pub resolved: Vec<PoolId>,
    pub failed: Vec<PoolId>,
    pub overdue: Vec<PoolId>,
}

pub struct Scheduler {
    ctx: Context,
    lifecycle: Arc<LifecycleService>,
    oracle: Arc<ResolutionOracle>,
    prices: Arc<dyn PriceOracle>,
    retries: RetryTracker,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(
        ctx: Context,
        lifecycle: Arc<LifecycleService>,
        oracle: Arc<ResolutionOracle>,
        prices: Arc<dyn PriceOracle>,
        retries: RetryTracker,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            ctx,
            lifecycle,
            oracle,
            prices,
            retries,
            settings,
        }
    }

    /// Run one scheduling pass.
    ///
    /// Per-pool failures are logged and retried on later ticks; only store
    /// failures that prevent listing pools are returned.
    pub async fn tick(&self) -> Result<TickReport> {
        let now = self.ctx.clock.now();
        let mut report = TickReport::default();

        if self.settings.sample_prices {
            report.sampled = self.sample_prices(now).await?;
        }
        report.locked = self.lifecycle.lock_due(now).await?;

        let due: Vec<Pool> = self
            .ctx
            .store
            .due_to_resolve(now)
            .await?
            .into_iter()
            .filter(|p| !p.is_halted() && self.retries.ready(p.id, now))
            .collect();

        let limit = self.settings.max_concurrent_resolutions.max(1);
        let results: Vec<(PoolId, Result<_>)> = stream::iter(due)
            .map(|pool| async move { (pool.id, self.oracle.resolve(pool.id).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        for (pool_id, result) in results {
            match result {
                Ok(settled) => {
                    self.retries.record_success(pool_id);
                    if settled.changed {
                        report.resolved.push(pool_id);
                    }
                }
                Err(e) if e.is_integrity() => {
                    // Lifecycle already halted the pool and escalated.
                    report.failed.push(pool_id);
                }
                Err(e) => {
                    let retry = self.retries.record_failure(pool_id, now);
                    warn!(
                        pool_id = %pool_id,
                        attempt = retry.attempt,
                        retry_in_ms = retry.delay_ms,
                        error = %e,
                        "Resolution failed"
                    );
                    self.ctx.notify(Event::ResolutionFailed(FailureEvent {
                        pool_id,
                        attempt: retry.attempt,
                        error: e.to_string(),
                        retry_in_ms: retry.delay_ms,
                    }));
                    report.failed.push(pool_id);
                }
            }
        }

        report.overdue = self.report_overdue(now).await?;

        if !report.locked.is_empty() || !report.resolved.is_empty() || !report.failed.is_empty() {
            info!(
                sampled = report.sampled,
                locked = report.locked.len(),
                resolved = report.resolved.len(),
                failed = report.failed.len(),
                overdue = report.overdue.len(),
                "Scheduler tick"
            );
        } else {
            debug!(sampled = report.sampled, overdue = report.overdue.len(), "Scheduler tick");
        }
        Ok(report)
    }

    /// Record a price point for every unsettled pool inside its window.
    async fn sample_prices(&self, now: DateTime<Utc>) -> Result<usize> {
        let live = self.live_pools(now).await?;
        let mut sampled = 0;
        for pool in live {
            match self.prices.fetch_price(&pool.asset).await {
                Ok(quote) => {
                    let point = PricePoint {
                        pool_id: pool.id,
                        ts: now,
                        price: quote.price,
                        source: quote.source,
                    };
                    self.ctx.store.record_price(&point).await?;
                    sampled += 1;
                }
                Err(e) => {
                    debug!(pool_id = %pool.id, asset = %pool.asset, error = %e, "Price sample failed");
                }
            }
        }
        Ok(sampled)
    }

    async fn live_pools(&self, now: DateTime<Utc>) -> Result<Vec<Pool>> {
        let mut live = Vec::new();
        for status in [PoolStatus::Open, PoolStatus::Locked] {
            let filter = PoolFilter {
                status: Some(status),
                ..PoolFilter::default()
            };
            live.extend(
                self.ctx
                    .store
                    .pools(&filter)
                    .await?
                    .into_iter()
                    .filter(|p| !p.is_halted() && p.start_ts <= now && now <= p.end_ts),
            );
        }
        Ok(live)
    }

    async fn report_overdue(&self, now: DateTime<Utc>) -> Result<Vec<PoolId>> {
        let cutoff = now - self.settings.overdue_grace;
        let overdue: Vec<Pool> = self.ctx.store.due_to_resolve(cutoff).await?;
        for pool in &overdue {
            let overdue_secs = (now - pool.end_ts).num_seconds();
            warn!(
                pool_id = %pool.id,
                end_ts = %pool.end_ts,
                overdue_secs,
                halted = pool.is_halted(),
                "Pool overdue for resolution"
            );
            self.ctx.notify(Event::PoolOverdue {
                pool_id: pool.id,
                end_ts: pool.end_ts,
                overdue_secs,
            });
        }
        Ok(overdue.into_iter().map(|p| p.id).collect())
    }
}
