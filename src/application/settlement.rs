//! Entry validation, claim eligibility and settlement accounting.

use tracing::debug;

use crate::application::state::Context;
use crate::domain::entry::EntryKey;
use crate::domain::id::{ParticipantId, PoolId};
use crate::domain::pool::PoolStatus;
use crate::domain::settlement::{self, SettlementSummary};
use crate::error::{Result, SettlementError};
use crate::port::inbound::pools::{ClaimQuote, EntryQuote, EntryRequest};

pub struct SettlementService {
    ctx: Context,
}

impl SettlementService {
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Validate a prospective entry and quote its fee.
    ///
    /// # Errors
    ///
    /// - `PoolNotFound`, `PoolHalted`
    /// - `PoolLocked` once the pool is effectively locked
    /// - `PoolNotOpen` for settled pools
    /// - `SideMismatch` when the participant holds the other side
    /// - domain validation errors for the amount
    pub async fn submit_entry(&self, request: EntryRequest) -> Result<EntryQuote> {
        let pool = self.ctx.load_pool(request.pool_id).await?;
        if pool.is_halted() {
            return Err(SettlementError::PoolHalted(pool.id).into());
        }

        let now = self.ctx.clock.now();
        match pool.effective_status(now) {
            PoolStatus::Open => {}
            PoolStatus::Locked => return Err(SettlementError::PoolLocked(pool.id).into()),
            status => {
                return Err(SettlementError::PoolNotOpen {
                    pool_id: pool.id,
                    status: status.to_string(),
                }
                .into())
            }
        }

        let policy = &self.ctx.policy;
        let fee = settlement::quote_entry(request.amount, policy.fee_bps, policy.min_entry)?;

        let key = EntryKey::new(pool.id, request.participant.clone());
        let existing = self.ctx.store.entry(&key).await?;
        if let Some(entry) = &existing {
            if entry.side != request.side {
                return Err(SettlementError::SideMismatch {
                    pool_id: pool.id,
                    participant: request.participant,
                }
                .into());
            }
        }

        debug!(
            pool_id = %pool.id,
            participant = %request.participant,
            amount = %fee.amount,
            fee = %fee.fee,
            "Entry quoted"
        );
        Ok(EntryQuote {
            pool_id: pool.id,
            participant: request.participant,
            side: request.side,
            fee,
            top_up: existing.is_some(),
        })
    }

    /// Validate a claim and compute what is owed.
    ///
    /// # Errors
    ///
    /// `PoolHalted`, `PoolNotResolved`, `EntryNotFound`, `AlreadyClaimed` or
    /// `NotWinner`.
    pub async fn request_claim(
        &self,
        pool_id: PoolId,
        participant: ParticipantId,
    ) -> Result<ClaimQuote> {
        let pool = self.ctx.load_pool(pool_id).await?;
        if pool.is_halted() {
            return Err(SettlementError::PoolHalted(pool_id).into());
        }
        let Some(winner) = pool.winner.filter(|_| pool.is_terminal()) else {
            return Err(SettlementError::PoolNotResolved(pool_id).into());
        };

        let key = EntryKey::new(pool_id, participant.clone());
        let Some(entry) = self.ctx.store.entry(&key).await? else {
            return Err(SettlementError::EntryNotFound {
                pool_id,
                participant,
            }
            .into());
        };
        if entry.claimed {
            return Err(SettlementError::AlreadyClaimed {
                pool_id,
                participant,
            }
            .into());
        }

        let Some(payout) = settlement::payout_for(&pool, winner, &entry)? else {
            return Err(SettlementError::NotWinner {
                pool_id,
                participant,
            }
            .into());
        };

        Ok(ClaimQuote {
            pool_id,
            participant,
            payout,
        })
    }

    /// Totals owed, claimed and left over for a settled pool.
    ///
    /// # Errors
    ///
    /// `PoolHalted` while the pool awaits review, `PoolNotResolved` before
    /// settlement.
    pub async fn summary(&self, pool_id: PoolId) -> Result<SettlementSummary> {
        let pool = self.ctx.load_pool(pool_id).await?;
        if pool.is_halted() {
            return Err(SettlementError::PoolHalted(pool_id).into());
        }
        let entries = self.ctx.store.entries(pool_id).await?;
        settlement::summarize(&pool, &entries)?
            .ok_or_else(|| SettlementError::PoolNotResolved(pool_id).into())
    }
}
