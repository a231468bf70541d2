//! Pool state machine: `Open -> Locked -> Resolved | Void`.
//!
//! Transitions are idempotent. Re-applying a transition whose target state
//! and payload already hold reports [`Applied::AlreadySatisfied`]; a terminal
//! pool receiving a different winner or proof hash is an integrity
//! violation.

use chrono::{DateTime, Utc};

use super::pool::{Pool, PoolStatus, ProofRef, Side, Winner};
use crate::error::{IntegrityError, Result, SettlementError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Stop accepting entries as of `at`.
    Lock { at: DateTime<Utc> },
    /// Settle with a winning side.
    Resolve { winner: Side, proof: ProofRef },
    /// Settle as void; every entry is refunded its gross amount.
    Void { reason: String, proof: ProofRef },
}

impl Transition {
    /// Settlement transition for an outcome.
    #[must_use]
    pub fn settle(winner: Winner, proof: ProofRef, reason: Option<String>) -> Self {
        match winner.side() {
            Some(side) => Self::Resolve { winner: side, proof },
            None => Self::Void {
                reason: reason.unwrap_or_else(|| "void".to_string()),
                proof,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lock { .. } => "lock",
            Self::Resolve { .. } => "resolve",
            Self::Void { .. } => "void",
        }
    }
}

/// Result of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The pool was mutated and must be persisted.
    Changed,
    /// The pool already satisfied the transition; nothing to persist.
    AlreadySatisfied,
}

/// Apply `transition` to `pool` as observed at `now`.
///
/// A stored Open pool is locked implicitly before it is settled.
///
/// # Errors
///
/// - [`SettlementError::PoolHalted`] if the pool is under review
/// - [`SettlementError::PoolNotEnded`] when resolving before `end_ts`
/// - [`IntegrityError::ConflictingResolution`] when a terminal pool receives
///   a different outcome
pub fn apply(pool: &mut Pool, transition: Transition, now: DateTime<Utc>) -> Result<Applied> {
    if pool.is_halted() {
        return Err(SettlementError::PoolHalted(pool.id).into());
    }

    match transition {
        Transition::Lock { at } => Ok(lock(pool, at)),
        Transition::Resolve { winner, proof } => {
            if now < pool.end_ts {
                return Err(SettlementError::PoolNotEnded(pool.id).into());
            }
            settle(pool, Winner::from(winner), proof, None, now)
        }
        Transition::Void { reason, proof } => settle(pool, Winner::Void, proof, Some(reason), now),
    }
}

fn lock(pool: &mut Pool, at: DateTime<Utc>) -> Applied {
    if pool.status != PoolStatus::Open {
        return Applied::AlreadySatisfied;
    }
    pool.status = PoolStatus::Locked;
    pool.locked_at = Some(at);
    Applied::Changed
}

fn settle(
    pool: &mut Pool,
    winner: Winner,
    proof: ProofRef,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Applied> {
    if pool.is_terminal() {
        return compare_settled(pool, winner, proof);
    }

    if pool.status == PoolStatus::Open {
        lock(pool, now.min(pool.lock_ts));
    }

    pool.status = match winner {
        Winner::Void => PoolStatus::Void,
        _ => PoolStatus::Resolved,
    };
    pool.winner = Some(winner);
    pool.proof = Some(proof);
    pool.void_reason = reason;
    Ok(Applied::Changed)
}

fn compare_settled(pool: &mut Pool, winner: Winner, proof: ProofRef) -> Result<Applied> {
    let stored_winner = pool.winner.unwrap_or(Winner::Void);
    let stored = pool.proof.clone();
    let stored_hash = stored.as_ref().map(|p| p.hash.as_str()).unwrap_or_default();

    if stored_winner != winner || !stored_hash.eq_ignore_ascii_case(&proof.hash) {
        return Err(IntegrityError::ConflictingResolution {
            pool_id: pool.id,
            stored: stored_winner,
            stored_hash: stored_hash.to_string(),
            attempted: winner,
            attempted_hash: proof.hash,
        }
        .into());
    }

    // A proof learned from the ledger first may gain its location later.
    match (pool.proof.as_mut(), proof.url) {
        (Some(existing), Some(url)) if existing.url.is_none() => {
            existing.url = Some(url);
            Ok(Applied::Changed)
        }
        _ => Ok(Applied::AlreadySatisfied),
    }
}
