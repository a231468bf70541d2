//! A participant's stake in a pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ParticipantId, PoolId};
use super::money::{Amount, Bps, Price};
use super::pool::Side;

/// Entries are keyed by pool and participant; one entry per participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub pool_id: PoolId,
    pub participant: ParticipantId,
}

impl EntryKey {
    #[must_use]
    pub fn new(pool_id: PoolId, participant: ParticipantId) -> Self {
        Self {
            pool_id,
            participant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub pool_id: PoolId,
    pub participant: ParticipantId,
    /// Side taken; fixed for the participant's lifetime in the pool.
    pub side: Side,
    /// Gross amount staked, fee included.
    pub amount: Amount,
    /// Fee withheld by the ledger at entry.
    pub fee: Amount,
    /// Set once the ledger confirms the claim transfer.
    pub claimed: bool,
    /// Amount the confirmed claim paid out.
    pub claim_payout: Option<Amount>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// Latest recorded price at or before confirmation.
    pub price_at_entry: Option<Price>,
    /// Pool line when the entry was confirmed.
    pub line_at_entry: Option<Bps>,
    /// Ledger confirmation time; must precede the lock instant.
    pub confirmed_at: DateTime<Utc>,
    /// Ledger transaction reference, when supplied.
    pub ledger_ref: Option<String>,
}

impl Entry {
    #[must_use]
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.pool_id, self.participant.clone())
    }

    /// Net stake carried by the pool aggregate.
    pub fn net(&self) -> Result<Amount, DomainError> {
        net_stake(self.amount, self.fee)
    }
}

/// `amount - fee`, rejecting empty stakes and fees that consume the stake.
pub fn net_stake(amount: Amount, fee: Amount) -> Result<Amount, DomainError> {
    if amount.is_zero() {
        return Err(DomainError::NonPositiveAmount);
    }
    if fee >= amount {
        return Err(DomainError::FeeExceedsAmount {
            amount: amount.units(),
            fee: fee.units(),
        });
    }
    amount.checked_sub(fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_stake_subtracts_fee() {
        let net = net_stake(Amount::new(5_000_000_000), Amount::new(37_500_000)).unwrap();
        assert_eq!(net, Amount::new(4_962_500_000));
    }

    #[test]
    fn net_stake_rejects_fee_covering_amount() {
        assert!(matches!(
            net_stake(Amount::new(10), Amount::new(10)),
            Err(DomainError::FeeExceedsAmount { .. })
        ));
        assert_eq!(
            net_stake(Amount::ZERO, Amount::ZERO),
            Err(DomainError::NonPositiveAmount)
        );
    }
}
