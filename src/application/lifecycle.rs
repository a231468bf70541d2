//! Pool lifecycle service: creation, guarded transitions and halts.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::application::state::Context;
use crate::domain::id::PoolId;
use crate::domain::lifecycle::{self, Applied, Transition};
use crate::domain::pool::{NewPool, Pool, PoolStatus, ProofRef};
use crate::domain::proof::StagedResolution;
use crate::error::{Error, Result};
use crate::port::outbound::notifier::{Event, SettledEvent};

pub struct LifecycleService {
    ctx: Context,
}

impl LifecycleService {
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Validate and store a new pool.
    pub async fn create(&self, new: NewPool) -> Result<Pool> {
        let pool = Pool::create(new)?;
        self.ctx.store.insert_pool(&pool).await?;
        info!(
            pool_id = %pool.id,
            symbol = %pool.symbol,
            line_bps = ?pool.line_bps.map(|l| l.value()),
            lock_ts = %pool.lock_ts,
            end_ts = %pool.end_ts,
            "Pool created"
        );
        Ok(pool)
    }

    /// Apply `transition` to a pool under its guard.
    pub async fn transition(
        &self,
        pool_id: PoolId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<(Pool, Applied)> {
        let _guard = self.ctx.guards.lock(pool_id).await;
        let pool = self.ctx.load_pool(pool_id).await?;
        self.apply_locked(pool, transition, now).await
    }

    /// Settle a pool from a staged proof under its guard.
    ///
    /// # Errors
    ///
    /// `StaleWrite` when an entry landed after the proof captured the
    /// totals; the proof must be measured again.
    pub async fn settle(
        &self,
        staged: &StagedResolution,
        now: DateTime<Utc>,
    ) -> Result<(Pool, Applied)> {
        let pool_id = staged.pool_id;
        let _guard = self.ctx.guards.lock(pool_id).await;
        let pool = self.ctx.load_pool(pool_id).await?;
        if !pool.is_terminal() && !staged.proof.covers(&pool) {
            warn!(
                pool_id = %pool_id,
                hash = %staged.hash,
                proof_over = %staged.proof.total_over,
                proof_under = %staged.proof.total_under,
                total_over = %pool.total_over,
                total_under = %pool.total_under,
                "Staged proof predates an entry, discarding"
            );
            return Err(Error::StaleWrite(pool_id));
        }
        let transition = Transition::settle(
            staged.proof.winner,
            ProofRef::new(staged.hash.clone(), Some(staged.url.clone())),
            staged.proof.void_reason.clone(),
        );
        self.apply_locked(pool, transition, now).await
    }

    /// Apply `transition` to a pool loaded while the caller holds its guard.
    pub(crate) async fn apply_locked(
        &self,
        mut pool: Pool,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<(Pool, Applied)> {
        let name = transition.name();
        match lifecycle::apply(&mut pool, transition, now) {
            Ok(Applied::Changed) => {
                let saved = self.ctx.store.save_pool(&pool).await?;
                info!(
                    pool_id = %saved.id,
                    transition = name,
                    status = %saved.status,
                    winner = ?saved.winner,
                    "Pool transitioned"
                );
                self.announce(&saved);
                Ok((saved, Applied::Changed))
            }
            Ok(Applied::AlreadySatisfied) => {
                debug!(pool_id = %pool.id, transition = name, "Transition already satisfied");
                Ok((pool, Applied::AlreadySatisfied))
            }
            Err(err) if err.is_integrity() => {
                self.halt_locked(pool, &err).await?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Lock every stored Open pool whose lock time has passed.
    pub async fn lock_due(&self, now: DateTime<Utc>) -> Result<Vec<PoolId>> {
        let due = self.ctx.store.due_to_lock(now).await?;
        let mut locked = Vec::with_capacity(due.len());
        for pool in due.into_iter().filter(|p| !p.is_halted()) {
            let at = pool.lock_ts;
            match self.transition(pool.id, Transition::Lock { at }, now).await {
                Ok((_, Applied::Changed)) => locked.push(pool.id),
                Ok((_, Applied::AlreadySatisfied)) => {}
                Err(e) => warn!(pool_id = %pool.id, error = %e, "Scheduled lock failed"),
            }
        }
        Ok(locked)
    }

    /// Record an integrity halt on `pool` and escalate.
    ///
    /// The caller must hold the pool's guard.
    pub(crate) async fn halt_locked(&self, mut pool: Pool, cause: &Error) -> Result<()> {
        let detail = cause.to_string();
        error!(pool_id = %pool.id, detail = %detail, "Integrity violation, halting pool");
        if pool.halted.is_none() {
            pool.halted = Some(detail.clone());
            self.ctx.store.save_pool(&pool).await?;
        }
        self.ctx.notify(Event::IntegrityViolation {
            pool_id: pool.id,
            detail,
        });
        Ok(())
    }

    /// Lift a halt after manual review.
    pub async fn clear_halt(&self, pool_id: PoolId) -> Result<Pool> {
        let _guard = self.ctx.guards.lock(pool_id).await;
        let mut pool = self.ctx.load_pool(pool_id).await?;
        let Some(reason) = pool.halted.take() else {
            return Ok(pool);
        };
        let saved = self.ctx.store.save_pool(&pool).await?;
        warn!(pool_id = %pool_id, previous = %reason, "Pool halt cleared by operator");
        Ok(saved)
    }

    fn announce(&self, pool: &Pool) {
        match pool.status {
            PoolStatus::Locked => self.ctx.notify(Event::PoolLocked {
                pool_id: pool.id,
                at: pool.lock_instant(),
            }),
            PoolStatus::Resolved | PoolStatus::Void => {
                if let (Some(winner), Some(proof)) = (pool.winner, pool.proof.as_ref()) {
                    self.ctx.notify(Event::PoolSettled(SettledEvent {
                        pool_id: pool.id,
                        winner,
                        proof_hash: proof.hash.clone(),
                        proof_url: proof.url.clone(),
                    }));
                }
            }
            PoolStatus::Open => {}
        }
    }
}
