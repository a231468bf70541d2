//! Pari-mutuel payout arithmetic.
//!
//! Winners split the combined net pool in proportion to their net stake:
//! `floor(net × (over + under) / winning_total)`. Void pools refund the gross
//! amount. Flooring means the sum of winning payouts never exceeds the pool;
//! the difference is reported as residual.

use serde::{Deserialize, Serialize};

use super::entry::{net_stake, Entry};
use super::error::DomainError;
use super::money::{Amount, Bps};
use super::pool::{Pool, Winner};

/// Fee split for a prospective entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub amount: Amount,
    pub fee: Amount,
    pub net: Amount,
}

/// Quote the fee on a gross amount.
///
/// # Errors
///
/// Fails when the amount is zero, below `min_entry`, or the fee would
/// consume it.
pub fn quote_entry(amount: Amount, fee_bps: Bps, min_entry: Amount) -> Result<FeeQuote, DomainError> {
    if amount.is_zero() {
        return Err(DomainError::NonPositiveAmount);
    }
    if amount < min_entry {
        return Err(DomainError::BelowMinimumEntry {
            amount: amount.units(),
            minimum: min_entry.units(),
        });
    }
    let fee = amount.apply_bps_floor(fee_bps)?;
    let net = net_stake(amount, fee)?;
    Ok(FeeQuote { amount, fee, net })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutKind {
    Winnings,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub amount: Amount,
    pub kind: PayoutKind,
}

/// Amount owed to `entry` once `pool` has settled as `winner`.
///
/// Returns `None` for the losing side.
pub fn payout_for(pool: &Pool, winner: Winner, entry: &Entry) -> Result<Option<Payout>, DomainError> {
    match winner.side() {
        None => Ok(Some(Payout {
            amount: entry.amount,
            kind: PayoutKind::Refund,
        })),
        Some(side) if side == entry.side => {
            let winning = pool.total_for(side);
            if winning.is_zero() {
                return Ok(None);
            }
            let amount = entry.net()?.mul_div_floor(pool.total()?, winning)?;
            Ok(Some(Payout {
                amount,
                kind: PayoutKind::Winnings,
            }))
        }
        Some(_) => Ok(None),
    }
}

/// Per-pool accounting of what is owed, paid and left over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementSummary {
    /// Net pool for resolved pools, gross stakes for void pools.
    pub distributable: Amount,
    /// Sum of every payout owed.
    pub payable: Amount,
    /// Owed but not yet claimed.
    pub claimable: Amount,
    /// Recorded as paid by the ledger.
    pub claimed: Amount,
    /// `distributable - payable`; flooring leakage or a winnerless side.
    pub residual: Amount,
    pub winners: usize,
    pub losers: usize,
}

/// Summarize settlement for a terminal pool. Returns `None` if unsettled.
pub fn summarize(pool: &Pool, entries: &[Entry]) -> Result<Option<SettlementSummary>, DomainError> {
    let Some(winner) = pool.winner else {
        return Ok(None);
    };

    let mut summary = SettlementSummary::default();
    summary.distributable = match winner {
        Winner::Void => entries
            .iter()
            .try_fold(Amount::ZERO, |acc, e| acc.checked_add(e.amount))?,
        _ => pool.total()?,
    };

    for entry in entries {
        match payout_for(pool, winner, entry)? {
            Some(payout) => {
                summary.winners += 1;
                summary.payable = summary.payable.checked_add(payout.amount)?;
                if entry.claimed {
                    let paid = entry.claim_payout.unwrap_or(payout.amount);
                    summary.claimed = summary.claimed.checked_add(paid)?;
                } else {
                    summary.claimable = summary.claimable.checked_add(payout.amount)?;
                }
            }
            None => summary.losers += 1,
        }
    }

    summary.residual = summary.distributable.checked_sub(summary.payable)?;
    Ok(Some(summary))
}
