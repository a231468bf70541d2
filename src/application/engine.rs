//! The pool engine: wires the services behind the [`PoolApi`] port.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::lifecycle::LifecycleService;
use crate::application::reconciler::Reconciler;
use crate::application::resolution::{ResolutionOracle, Timeouts};
use crate::application::retry::{Backoff, RetryTracker};
use crate::application::scheduler::{Scheduler, SchedulerSettings};
use crate::application::settlement::SettlementService;
use crate::application::state::Context;
use crate::domain::curve::{self, CurveInput, CurveParams, PredictionCurve};
use crate::domain::entry::{Entry, EntryKey};
use crate::domain::error::DomainError;
use crate::domain::id::{ParticipantId, PoolId};
use crate::domain::lifecycle::Transition;
use crate::domain::pool::{NewPool, Pool};
use crate::domain::money::Price;
use crate::domain::price::{self, PricePoint};
use crate::domain::settlement::SettlementSummary;
use crate::error::{Error, Result, SettlementError};
use crate::port::inbound::pools::{
    ClaimQuote, CommitmentCheck, EntryQuote, EntryRequest, PoolApi, PoolView, ProofCheck,
    SettledPool,
};
use crate::port::outbound::price::PriceOracle;
use crate::port::outbound::proof::ProofStore;
use crate::port::outbound::store::PoolFilter;

/// Tunables the engine needs beyond the shared [`Context`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub curve: CurveParams,
    pub timeouts: Timeouts,
    pub backoff: Backoff,
    pub scheduler: SchedulerSettings,
    /// Bound on ledger events held back for missing dependencies.
    pub max_parked: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            curve: CurveParams::default(),
            timeouts: Timeouts::default(),
            backoff: Backoff::default(),
            scheduler: SchedulerSettings::default(),
            max_parked: 1_024,
        }
    }
}

pub struct Engine {
    ctx: Context,
    lifecycle: Arc<LifecycleService>,
    settlement: SettlementService,
    oracle: Arc<ResolutionOracle>,
    reconciler: Arc<Reconciler>,
    scheduler: Arc<Scheduler>,
    prices: Arc<dyn PriceOracle>,
    curve: CurveParams,
}

impl Engine {
    pub fn new(
        ctx: Context,
        prices: Arc<dyn PriceOracle>,
        proofs: Arc<dyn ProofStore>,
        settings: EngineSettings,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleService::new(ctx.clone()));
        let oracle = Arc::new(ResolutionOracle::new(
            ctx.clone(),
            Arc::clone(&lifecycle),
            Arc::clone(&prices),
            proofs,
            settings.timeouts,
        ));
        let reconciler = Arc::new(Reconciler::new(
            ctx.clone(),
            Arc::clone(&lifecycle),
            settings.max_parked,
        ));
        let scheduler = Arc::new(Scheduler::new(
            ctx.clone(),
            Arc::clone(&lifecycle),
            Arc::clone(&oracle),
            Arc::clone(&prices),
            RetryTracker::new(settings.backoff),
            settings.scheduler,
        ));
        Self {
            settlement: SettlementService::new(ctx.clone()),
            ctx,
            lifecycle,
            oracle,
            reconciler,
            scheduler,
            prices,
            curve: settings.curve,
        }
    }

    #[must_use]
    pub fn reconciler(&self) -> Arc<Reconciler> {
        Arc::clone(&self.reconciler)
    }

    #[must_use]
    pub fn scheduler(&self) -> Arc<Scheduler> {
        Arc::clone(&self.scheduler)
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn view(&self, pool: Pool) -> PoolView {
        let effective_status = pool.effective_status(self.ctx.clock.now());
        PoolView {
            pool,
            effective_status,
        }
    }
}

#[async_trait]
impl PoolApi for Engine {
    async fn create_pool(&self, new: NewPool) -> Result<Pool> {
        self.lifecycle.create(new).await
    }

    async fn get_pool(&self, pool_id: PoolId) -> Result<PoolView> {
        let pool = self.ctx.load_pool(pool_id).await?;
        Ok(self.view(pool))
    }

    async fn record_start_price(&self, pool_id: PoolId, price: Price) -> Result<PricePoint> {
        if price <= Price::ZERO {
            return Err(DomainError::InvalidPrice(price.to_string()).into());
        }
        let pool = self.ctx.load_pool(pool_id).await?;
        let point = PricePoint {
            pool_id,
            ts: pool.start_ts,
            price,
            source: "manual".to_string(),
        };
        self.ctx.store.record_price(&point).await?;
        debug!(pool_id = %pool_id, price = %price, "Start price recorded");
        Ok(point)
    }

    async fn list_pools(&self, filter: &PoolFilter) -> Result<Vec<PoolView>> {
        let pools = self.ctx.store.pools(filter).await?;
        Ok(pools.into_iter().map(|p| self.view(p)).collect())
    }

    async fn top_pools(&self, limit: usize) -> Result<Vec<PoolView>> {
        let filter = PoolFilter {
            active: true,
            by_volume: true,
            limit: Some(limit),
            ..PoolFilter::default()
        };
        self.list_pools(&filter).await
    }

    async fn list_pools_due_to_lock(&self) -> Result<Vec<PoolView>> {
        let pools = self.ctx.store.due_to_lock(self.ctx.clock.now()).await?;
        Ok(pools.into_iter().map(|p| self.view(p)).collect())
    }

    async fn list_pools_due_to_resolve(&self) -> Result<Vec<PoolView>> {
        let pools = self.ctx.store.due_to_resolve(self.ctx.clock.now()).await?;
        Ok(pools.into_iter().map(|p| self.view(p)).collect())
    }

    async fn get_entry(&self, pool_id: PoolId, participant: ParticipantId) -> Result<Entry> {
        self.ctx.load_pool(pool_id).await?;
        let key = EntryKey::new(pool_id, participant);
        let found = self.ctx.store.entry(&key).await?;
        match found {
            Some(entry) => Ok(entry),
            None => Err(SettlementError::EntryNotFound {
                pool_id,
                participant: key.participant,
            }
            .into()),
        }
    }

    async fn list_entries(&self, pool_id: PoolId) -> Result<Vec<Entry>> {
        self.ctx.load_pool(pool_id).await?;
        self.ctx.store.entries(pool_id).await
    }

    async fn price_history(&self, pool_id: PoolId) -> Result<Vec<PricePoint>> {
        self.ctx.load_pool(pool_id).await?;
        self.ctx.store.price_history(pool_id).await
    }

    async fn submit_entry(&self, request: EntryRequest) -> Result<EntryQuote> {
        self.settlement.submit_entry(request).await
    }

    async fn request_claim(
        &self,
        pool_id: PoolId,
        participant: ParticipantId,
    ) -> Result<ClaimQuote> {
        self.settlement.request_claim(pool_id, participant).await
    }

    async fn lock_pool(&self, pool_id: PoolId) -> Result<PoolView> {
        let now = self.ctx.clock.now();
        let (pool, _) = self
            .lifecycle
            .transition(pool_id, Transition::Lock { at: now }, now)
            .await?;
        Ok(self.view(pool))
    }

    async fn resolve_pool(&self, pool_id: PoolId) -> Result<SettledPool> {
        self.oracle.resolve(pool_id).await
    }

    async fn void_pool(&self, pool_id: PoolId, reason: &str) -> Result<SettledPool> {
        self.oracle.void(pool_id, reason).await
    }

    async fn verify_proof(&self, pool_id: PoolId) -> Result<ProofCheck> {
        self.oracle.verify_proof(pool_id).await
    }

    async fn verify_commitment(&self, pool_id: PoolId) -> Result<CommitmentCheck> {
        let pool = self.ctx.load_pool(pool_id).await?;
        let actual_commit = pool.expected_commit();
        let valid = pool.commitment_intact();
        if !valid {
            warn!(pool_id = %pool_id, stored = %pool.ai.commit, actual = %actual_commit, "AI commitment mismatch");
        }
        Ok(CommitmentCheck {
            pool_id,
            stored_commit: pool.ai.commit,
            actual_commit,
            valid,
        })
    }

    async fn prediction_curve(&self, pool_id: PoolId) -> Result<PredictionCurve> {
        let pool = self.ctx.load_pool(pool_id).await?;
        let history = self.ctx.store.price_history(pool_id).await?;
        let start = price::earliest(&history).ok_or_else(|| Error::PriceUnavailable {
            asset: pool.asset.to_string(),
            reason: "no recorded start price".to_string(),
        })?;

        let current = match self.prices.fetch_price(&pool.asset).await {
            Ok(quote) => quote.price,
            Err(e) => {
                let Some(latest) = price::latest(&history) else {
                    return Err(e);
                };
                warn!(pool_id = %pool_id, error = %e, "Live price unavailable, using last sample");
                latest.price
            }
        };

        let input = CurveInput {
            start_price: start.price,
            current_price: current,
            total_over: pool.total_over,
            total_under: pool.total_under,
            confidence: pool.ai.confidence,
            start_ts: pool.start_ts,
            end_ts: pool.end_ts,
        };
        let curve = curve::generate(&input, &self.curve)?;
        debug!(pool_id = %pool_id, bias = curve.bias, target = curve.target, "Curve generated");
        Ok(curve)
    }

    async fn settlement_summary(&self, pool_id: PoolId) -> Result<SettlementSummary> {
        self.settlement.summary(pool_id).await
    }

    async fn clear_halt(&self, pool_id: PoolId) -> Result<PoolView> {
        let pool = self.lifecycle.clear_halt(pool_id).await?;
        Ok(self.view(pool))
    }
}
