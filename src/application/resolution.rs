//! Resolution oracle: measure, prove, publish, then settle.
//!
//! Measurement and publication run outside the pool guard. The staged
//! resolution written after a successful upload makes a retry skip straight
//! to the transition, so the outcome of a pool is decided once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::application::lifecycle::LifecycleService;
use crate::application::state::Context;
use crate::domain::id::PoolId;
use crate::domain::lifecycle::Applied;
use crate::domain::pool::{Pool, Winner};
use crate::domain::price;
use crate::domain::proof::{matches_hash, hash_bytes, Measurement, ResolutionProof, StagedResolution};
use crate::domain::resolution::{decide_winner, price_change_bps};
use crate::error::{Error, Result, SettlementError};
use crate::port::inbound::pools::{ProofCheck, SettledPool};
use crate::port::outbound::price::PriceOracle;
use crate::port::outbound::proof::ProofStore;

/// Upper bounds on the slow external calls of a resolution.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub price: Duration,
    pub proof: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            price: Duration::from_secs(10),
            proof: Duration::from_secs(30),
        }
    }
}

pub struct ResolutionOracle {
    ctx: Context,
    lifecycle: Arc<LifecycleService>,
    prices: Arc<dyn PriceOracle>,
    proofs: Arc<dyn ProofStore>,
    timeouts: Timeouts,
}

impl ResolutionOracle {
    pub fn new(
        ctx: Context,
        lifecycle: Arc<LifecycleService>,
        prices: Arc<dyn PriceOracle>,
        proofs: Arc<dyn ProofStore>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            ctx,
            lifecycle,
            prices,
            proofs,
            timeouts,
        }
    }

    /// Resolve an ended pool against the live price.
    ///
    /// A pool that is already settled is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `PoolNotEnded` before `end_ts`, `PoolHalted` for halted pools
    /// - transient errors when the price or proof store is unavailable;
    ///   the pool is left as it was
    /// - integrity errors when the pool settled differently meanwhile
    #[instrument(skip(self), fields(pool_id = %pool_id))]
    pub async fn resolve(&self, pool_id: PoolId) -> Result<SettledPool> {
        let pool = self.ctx.load_pool(pool_id).await?;
        if pool.is_terminal() {
            return settled(&pool, false);
        }
        if pool.is_halted() {
            return Err(SettlementError::PoolHalted(pool_id).into());
        }
        let now = self.ctx.clock.now();
        if now < pool.end_ts {
            return Err(SettlementError::PoolNotEnded(pool_id).into());
        }

        let reusable = self
            .ctx
            .store
            .staged_resolutions(pool_id)
            .await?
            .pop()
            .filter(|s| s.proof.covers(&pool));
        let staged = match reusable {
            Some(staged) => {
                info!(hash = %staged.hash, "Reusing staged resolution");
                staged
            }
            None => self.measure_and_publish(&pool).await?,
        };

        self.settle(staged).await
    }

    /// Void a pool administratively; entries are refunded their gross
    /// amount.
    ///
    /// Voiding an already Void pool returns it unchanged. A void proof
    /// staged by an earlier attempt is applied as is.
    #[instrument(skip(self), fields(pool_id = %pool_id))]
    pub async fn void(&self, pool_id: PoolId, reason: &str) -> Result<SettledPool> {
        let pool = self.ctx.load_pool(pool_id).await?;
        match pool.winner {
            Some(Winner::Void) if pool.is_terminal() => return settled(&pool, false),
            Some(_) if pool.is_terminal() => {
                return Err(SettlementError::PoolNotOpen {
                    pool_id,
                    status: pool.status.to_string(),
                }
                .into())
            }
            _ => {}
        }
        if pool.is_halted() {
            return Err(SettlementError::PoolHalted(pool_id).into());
        }

        let staged_void = self
            .ctx
            .store
            .staged_resolutions(pool_id)
            .await?
            .into_iter()
            .rev()
            .find(|s| s.proof.winner == Winner::Void && s.proof.covers(&pool));
        let staged = match staged_void {
            Some(staged) => {
                info!(hash = %staged.hash, "Reusing staged void");
                staged
            }
            None => {
                let now = self.ctx.clock.now();
                let proof = ResolutionProof::administrative_void(
                    &pool,
                    reason,
                    now,
                    &self.ctx.policy.oracle_version,
                );
                self.publish(proof).await?
            }
        };
        warn!(reason = %reason, hash = %staged.hash, "Pool voided by operator");
        self.settle(staged).await
    }

    /// Fetch a settled pool's published proof and recompute its hash.
    pub async fn verify_proof(&self, pool_id: PoolId) -> Result<ProofCheck> {
        let pool = self.ctx.load_pool(pool_id).await?;
        let Some(proof) = pool.proof.filter(|_| pool.status.is_terminal()) else {
            return Err(SettlementError::PoolNotResolved(pool_id).into());
        };
        let url = match proof.url {
            Some(url) => url,
            None => self
                .ctx
                .store
                .staged_resolutions(pool_id)
                .await?
                .into_iter()
                .rev()
                .find(|s| s.hash.eq_ignore_ascii_case(&proof.hash))
                .map(|s| s.url)
                .ok_or_else(|| Error::ProofStore(format!("no known location for proof of pool {pool_id}")))?,
        };

        let bytes = with_timeout("proof fetch", self.timeouts.proof, self.proofs.get(&url)).await?;
        let actual_hash = hash_bytes(&bytes);
        let valid = matches_hash(&bytes, &proof.hash);
        if !valid {
            warn!(pool_id = %pool_id, expected = %proof.hash, actual = %actual_hash, "Proof hash mismatch");
        }
        Ok(ProofCheck {
            pool_id,
            url,
            expected_hash: proof.hash,
            actual_hash,
            valid,
        })
    }

    async fn measure_and_publish(&self, pool: &Pool) -> Result<StagedResolution> {
        let history = self.ctx.store.price_history(pool.id).await?;
        let start = price::earliest(&history).ok_or_else(|| Error::PriceUnavailable {
            asset: pool.asset.to_string(),
            reason: "no recorded start price".to_string(),
        })?;

        let quote = with_timeout(
            "price fetch",
            self.timeouts.price,
            self.prices.fetch_price(&pool.asset),
        )
        .await?;

        let change_bps = price_change_bps(start.price, quote.price)?;
        let line = pool.line();
        let winner = decide_winner(change_bps, line, self.ctx.policy.void_band);
        let void_reason = (winner == Winner::Void).then(|| {
            format!(
                "price change {change_bps}bps within {}bps of line {line}bps",
                self.ctx.policy.void_band
            )
        });
        info!(
            start_price = %start.price,
            final_price = %quote.price,
            change_bps,
            line_bps = line.value(),
            winner = ?winner,
            "Pool measured"
        );

        let measurement = Measurement {
            start_price: start.price,
            final_price: quote.price,
            change_bps,
            winner,
            price_sources: vec![quote.source],
        };
        let proof = ResolutionProof::measured(
            pool,
            measurement,
            self.ctx.clock.now(),
            &self.ctx.policy.oracle_version,
            void_reason,
        );
        self.publish(proof).await
    }

    /// Upload the proof and stage it for the transition.
    async fn publish(&self, proof: ResolutionProof) -> Result<StagedResolution> {
        let bytes = proof.canonical_bytes()?;
        let hash = hash_bytes(&bytes);
        let url = with_timeout("proof upload", self.timeouts.proof, self.proofs.put(&bytes)).await?;

        let staged = StagedResolution {
            pool_id: proof.pool_id,
            proof,
            hash,
            url,
            staged_at: self.ctx.clock.now(),
        };
        self.ctx.store.stage_resolution(&staged).await?;
        info!(pool_id = %staged.pool_id, hash = %staged.hash, url = %staged.url, "Proof published");
        Ok(staged)
    }

    async fn settle(&self, staged: StagedResolution) -> Result<SettledPool> {
        let now = self.ctx.clock.now();
        let (pool, applied) = self.lifecycle.settle(&staged, now).await?;
        settled(&pool, applied == Applied::Changed)
    }
}

fn settled(pool: &Pool, changed: bool) -> Result<SettledPool> {
    match (pool.winner, pool.proof.clone()) {
        (Some(winner), Some(proof)) => Ok(SettledPool {
            pool_id: pool.id,
            winner,
            proof,
            changed,
        }),
        _ => Err(SettlementError::PoolNotResolved(pool.id).into()),
    }
}

/// Bound `fut` by `limit`, mapping expiry to [`Error::Timeout`].
async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation,
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
