//! Ledger event reconciler.
//!
//! The ledger is authoritative. Confirmed events are applied to the local
//! projection idempotently and in any cross-pool order: redeliveries are
//! no-ops, events that arrive before what they depend on are parked and
//! retried, and contradictions halt the pool.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::lifecycle::LifecycleService;
use crate::application::state::Context;
use crate::domain::entry::{net_stake, Entry, EntryKey};
use crate::domain::event::{ConfirmedEvent, LedgerEvent};
use crate::domain::id::{ParticipantId, PoolId};
use crate::domain::lifecycle::{Applied, Transition};
use crate::domain::money::Amount;
use crate::domain::pool::{Pool, ProofRef, Side, Winner};
use crate::domain::price;
use crate::domain::settlement::payout_for;
use crate::error::{Error, IntegrityError, Result, SettlementError};
use crate::port::outbound::notifier::Event;

/// What became of a confirmed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The projection changed.
    Applied,
    /// Already reflected locally.
    Duplicate,
    /// Held until the pool, entry or resolution it depends on is known.
    Parked,
}

/// Tally of a batch of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub applied: usize,
    pub duplicates: usize,
    pub parked: usize,
    pub rejected: usize,
}

impl ReconcileReport {
    pub fn record(&mut self, outcome: &Result<Outcome>) {
        match outcome {
            Ok(Outcome::Applied) => self.applied += 1,
            Ok(Outcome::Duplicate) => self.duplicates += 1,
            Ok(Outcome::Parked) => self.parked += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

pub struct Reconciler {
    ctx: Context,
    lifecycle: Arc<LifecycleService>,
    parked: Mutex<VecDeque<ConfirmedEvent>>,
    max_parked: usize,
}

impl Reconciler {
    pub fn new(ctx: Context, lifecycle: Arc<LifecycleService>, max_parked: usize) -> Self {
        Self {
            ctx,
            lifecycle,
            parked: Mutex::new(VecDeque::new()),
            max_parked,
        }
    }

    /// Apply one confirmed event.
    ///
    /// After an event applies, anything parked for the same pool is retried.
    ///
    /// # Errors
    ///
    /// Conflicts and integrity violations are returned; the event is not
    /// retried. Transient failures park the event instead.
    pub async fn handle(&self, event: ConfirmedEvent) -> Result<Outcome> {
        let pool_id = event.pool_id();
        let outcome = self.settle_event(event).await?;
        if outcome == Outcome::Applied {
            self.retry_parked(Some(pool_id)).await;
        }
        Ok(outcome)
    }

    /// Retry parked events for one pool, or for every pool when `None`.
    ///
    /// Returns how many were applied.
    pub async fn retry_parked(&self, pool_id: Option<PoolId>) -> usize {
        let pending: Vec<ConfirmedEvent> = {
            let mut parked = self.parked.lock();
            let (take, keep): (VecDeque<_>, VecDeque<_>) = parked
                .drain(..)
                .partition(|e| pool_id.map_or(true, |id| e.pool_id() == id));
            *parked = keep;
            take.into()
        };
        if pending.is_empty() {
            return 0;
        }

        let mut applied = 0;
        for event in pending {
            let kind = event.event.kind();
            let event_pool = event.pool_id();
            match self.settle_event(event).await {
                Ok(Outcome::Applied) => applied += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(pool_id = %event_pool, kind = %kind, error = %e, "Parked event rejected on retry");
                }
            }
        }
        if applied > 0 {
            debug!(applied, "Parked events applied");
        }
        applied
    }

    /// Number of events currently parked.
    #[must_use]
    pub fn parked_len(&self) -> usize {
        self.parked.lock().len()
    }

    /// Apply an event, parking it when it cannot be applied yet.
    async fn settle_event(&self, event: ConfirmedEvent) -> Result<Outcome> {
        match self.apply(&event).await {
            Ok(Outcome::Parked) => {
                self.park(event);
                Ok(Outcome::Parked)
            }
            Err(e) if e.is_transient() => {
                warn!(pool_id = %event.pool_id(), error = %e, "Transient failure, parking event");
                self.park(event);
                Ok(Outcome::Parked)
            }
            other => other,
        }
    }

    fn park(&self, event: ConfirmedEvent) {
        debug!(pool_id = %event.pool_id(), kind = %event.event.kind(), "Event parked");
        let mut parked = self.parked.lock();
        parked.push_back(event);
        while parked.len() > self.max_parked {
            let Some(dropped) = parked.pop_front() else {
                break;
            };
            warn!(
                pool_id = %dropped.pool_id(),
                kind = %dropped.event.kind(),
                max_parked = self.max_parked,
                "Parked buffer full, dropping oldest event"
            );
            self.ctx.notify(Event::EventDropped {
                pool_id: dropped.pool_id(),
                kind: dropped.event.kind(),
                reason: "parked buffer full".to_string(),
            });
        }
    }

    async fn apply(&self, confirmed: &ConfirmedEvent) -> Result<Outcome> {
        let pool_id = confirmed.pool_id();
        let _guard = self.ctx.guards.lock(pool_id).await;
        let Some(pool) = self.ctx.store.pool(pool_id).await? else {
            return Ok(Outcome::Parked);
        };
        if pool.is_halted() {
            return Err(SettlementError::PoolHalted(pool_id).into());
        }

        let at = confirmed.confirmed_at;
        match &confirmed.event {
            LedgerEvent::EntryConfirmed {
                participant,
                side,
                amount,
                fee,
                ledger_ref,
                ..
            } => {
                let entry = ConfirmedEntry {
                    participant,
                    side: *side,
                    amount: *amount,
                    fee: *fee,
                    ledger_ref: ledger_ref.as_deref(),
                    at,
                };
                self.apply_entry(pool, entry).await
            }
            LedgerEvent::ClaimConfirmed {
                participant,
                payout,
                ..
            } => self.apply_claim(&pool, participant, *payout, at).await,
            LedgerEvent::PoolLockedConfirmed { .. } => {
                let (_, applied) = self
                    .lifecycle
                    .apply_locked(pool, Transition::Lock { at }, at)
                    .await?;
                Ok(applied.into())
            }
            LedgerEvent::PoolResolvedConfirmed {
                winner, proof_hash, ..
            } => self.apply_resolution(pool, *winner, proof_hash, at).await,
        }
    }

    async fn apply_entry(&self, mut pool: Pool, confirmed: ConfirmedEntry<'_>) -> Result<Outcome> {
        let key = EntryKey::new(pool.id, confirmed.participant.clone());
        let existing = self.ctx.store.entry(&key).await?;

        if let Some(entry) = &existing {
            if entry.side == confirmed.side
                && entry.amount == confirmed.amount
                && entry.fee == confirmed.fee
            {
                return Ok(Outcome::Duplicate);
            }
        }

        let lock_instant = pool.lock_instant();
        if confirmed.at >= lock_instant {
            return Err(SettlementError::EntryAfterLock {
                pool_id: pool.id,
                confirmed_at: confirmed.at,
                lock_instant,
            }
            .into());
        }
        if pool.is_terminal() {
            let err: Error = IntegrityError::EntryAfterResolution {
                pool_id: pool.id,
                participant: confirmed.participant.clone(),
            }
            .into();
            self.lifecycle.halt_locked(pool, &err).await?;
            return Err(err);
        }

        let net = net_stake(confirmed.amount, confirmed.fee)?;
        let entry = match existing {
            None => {
                let history = self.ctx.store.price_history(pool.id).await?;
                pool.credit(confirmed.side, net)?;
                Entry {
                    pool_id: pool.id,
                    participant: confirmed.participant.clone(),
                    side: confirmed.side,
                    amount: confirmed.amount,
                    fee: confirmed.fee,
                    claimed: false,
                    claim_payout: None,
                    claimed_at: None,
                    price_at_entry: price::as_of(&history, confirmed.at).map(|p| p.price),
                    line_at_entry: pool.line_bps,
                    confirmed_at: confirmed.at,
                    ledger_ref: confirmed.ledger_ref.map(str::to_string),
                }
            }
            Some(entry) if entry.side != confirmed.side => {
                return Err(SettlementError::SideMismatch {
                    pool_id: pool.id,
                    participant: entry.participant,
                }
                .into());
            }
            Some(mut entry) => {
                let previous = entry.net()?;
                if net < previous {
                    let err: Error = IntegrityError::ShrinkingEntry {
                        pool_id: pool.id,
                        participant: entry.participant,
                    }
                    .into();
                    self.lifecycle.halt_locked(pool, &err).await?;
                    return Err(err);
                }
                pool.credit(confirmed.side, net.checked_sub(previous)?)?;
                entry.amount = confirmed.amount;
                entry.fee = confirmed.fee;
                if let Some(r) = confirmed.ledger_ref {
                    entry.ledger_ref = Some(r.to_string());
                }
                entry
            }
        };

        let saved = self.ctx.store.apply_entry(&entry, &pool).await?;
        info!(
            pool_id = %saved.id,
            participant = %entry.participant,
            side = %entry.side,
            amount = %entry.amount,
            fee = %entry.fee,
            total_over = %saved.total_over,
            total_under = %saved.total_under,
            "Entry confirmed"
        );
        Ok(Outcome::Applied)
    }

    async fn apply_claim(
        &self,
        pool: &Pool,
        participant: &ParticipantId,
        payout: Amount,
        at: DateTime<Utc>,
    ) -> Result<Outcome> {
        let key = EntryKey::new(pool.id, participant.clone());
        let Some(entry) = self.ctx.store.entry(&key).await? else {
            return Ok(Outcome::Parked);
        };
        let Some(winner) = pool.winner.filter(|_| pool.is_terminal()) else {
            return Ok(Outcome::Parked);
        };

        if entry.claimed {
            if entry.claim_payout != Some(payout) {
                warn!(
                    pool_id = %pool.id,
                    participant = %participant,
                    recorded = ?entry.claim_payout,
                    confirmed = %payout,
                    "Repeated claim with a different payout"
                );
            }
            return Ok(Outcome::Duplicate);
        }

        let Some(local) = payout_for(pool, winner, &entry)?.map(|p| p.amount) else {
            let err: Error = IntegrityError::ClaimByLoser {
                pool_id: pool.id,
                participant: participant.clone(),
            }
            .into();
            self.lifecycle.halt_locked(pool.clone(), &err).await?;
            return Err(err);
        };
        if local != payout {
            warn!(
                pool_id = %pool.id,
                participant = %participant,
                computed = %local,
                confirmed = %payout,
                "Ledger payout differs from local computation"
            );
        }

        if self.ctx.store.mark_claimed(&key, payout, at).await? {
            info!(pool_id = %pool.id, participant = %participant, payout = %payout, "Claim confirmed");
            Ok(Outcome::Applied)
        } else {
            Ok(Outcome::Duplicate)
        }
    }

    async fn apply_resolution(
        &self,
        pool: Pool,
        winner: Winner,
        proof_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<Outcome> {
        let staged = self
            .ctx
            .store
            .staged_resolutions(pool.id)
            .await?
            .into_iter()
            .rev()
            .find(|s| s.hash.eq_ignore_ascii_case(proof_hash));

        let (url, reason) = match staged {
            Some(s) => (Some(s.url), s.proof.void_reason),
            None => (None, None),
        };
        let reason = reason.or_else(|| {
            (winner == Winner::Void).then(|| "voided on ledger".to_string())
        });
        let transition = Transition::settle(winner, ProofRef::new(proof_hash, url), reason);
        let (_, applied) = self.lifecycle.apply_locked(pool, transition, at).await?;
        Ok(applied.into())
    }
}

impl From<Applied> for Outcome {
    fn from(applied: Applied) -> Self {
        match applied {
            Applied::Changed => Self::Applied,
            Applied::AlreadySatisfied => Self::Duplicate,
        }
    }
}

struct ConfirmedEntry<'a> {
    participant: &'a ParticipantId,
    side: Side,
    amount: Amount,
    fee: Amount,
    ledger_ref: Option<&'a str>,
    at: DateTime<Utc>,
}
