//! Builders for domain primitives used across tests.
//!
//! Every pool built here shares one timeline: start at [`t0`], lock 30
//! minutes later, end one hour after start, line 300 bps.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::entry::Entry;
use crate::domain::event::{ConfirmedEvent, LedgerEvent};
use crate::domain::id::{AssetId, ParticipantId, PoolId};
use crate::domain::money::{Amount, Price};
use crate::domain::pool::{NewPool, Pool, Side, Winner};
use crate::domain::price::PricePoint;
use crate::domain::proof::{Measurement, ResolutionProof, StagedResolution};

pub const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

/// Start of the shared test timeline, 2026-03-01T12:00:00Z.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn lock_ts() -> DateTime<Utc> {
    t0() + Duration::minutes(30)
}

pub fn end_ts() -> DateTime<Utc> {
    t0() + Duration::hours(1)
}

pub fn new_pool(id: u64) -> NewPool {
    NewPool {
        id: PoolId::new(id),
        asset: AssetId::new(BONK_MINT),
        symbol: "BONK".to_string(),
        start_ts: t0(),
        lock_ts: lock_ts(),
        end_ts: end_ts(),
        line_bps: Some(300),
        model: "gpt-4o-mini".to_string(),
        confidence_bps: 7_200,
    }
}

pub fn pool(id: u64) -> Pool {
    Pool::create(new_pool(id)).unwrap()
}

pub fn participant(name: &str) -> ParticipantId {
    ParticipantId::new(name)
}

/// An entry confirmed at `t0 + 5m`.
pub fn entry(pool_id: u64, who: &str, side: Side, amount: u64, fee: u64) -> Entry {
    Entry {
        pool_id: PoolId::new(pool_id),
        participant: participant(who),
        side,
        amount: Amount::new(amount),
        fee: Amount::new(fee),
        claimed: false,
        claim_payout: None,
        claimed_at: None,
        price_at_entry: None,
        line_at_entry: None,
        confirmed_at: t0() + Duration::minutes(5),
        ledger_ref: None,
    }
}

pub fn price_point(pool_id: u64, at: DateTime<Utc>, price: Price) -> PricePoint {
    PricePoint {
        pool_id: PoolId::new(pool_id),
        ts: at,
        price,
        source: "jupiter".to_string(),
    }
}

/// A staged Void resolution carrying `hash`.
pub fn staged(pool_id: u64, hash: &str) -> StagedResolution {
    let pool = pool(pool_id);
    let proof = ResolutionProof::measured(
        &pool,
        Measurement {
            start_price: Price::ONE,
            final_price: Price::ONE,
            change_bps: 0,
            winner: Winner::Void,
            price_sources: vec!["jupiter".to_string()],
        },
        end_ts(),
        "v1.0.0",
        Some("test".to_string()),
    );
    StagedResolution {
        pool_id: PoolId::new(pool_id),
        proof,
        hash: hash.to_string(),
        url: format!("mem://{hash}"),
        staged_at: end_ts(),
    }
}

pub fn entry_confirmed(
    pool_id: u64,
    who: &str,
    side: Side,
    amount: u64,
    fee: u64,
    at: DateTime<Utc>,
) -> ConfirmedEvent {
    ConfirmedEvent::new(
        LedgerEvent::EntryConfirmed {
            pool_id: PoolId::new(pool_id),
            participant: participant(who),
            side,
            amount: Amount::new(amount),
            fee: Amount::new(fee),
            ledger_ref: None,
        },
        at,
    )
}

pub fn claim_confirmed(pool_id: u64, who: &str, payout: u64, at: DateTime<Utc>) -> ConfirmedEvent {
    ConfirmedEvent::new(
        LedgerEvent::ClaimConfirmed {
            pool_id: PoolId::new(pool_id),
            participant: participant(who),
            payout: Amount::new(payout),
        },
        at,
    )
}

pub fn locked_confirmed(pool_id: u64, at: DateTime<Utc>) -> ConfirmedEvent {
    ConfirmedEvent::new(
        LedgerEvent::PoolLockedConfirmed {
            pool_id: PoolId::new(pool_id),
        },
        at,
    )
}

pub fn resolved_confirmed(
    pool_id: u64,
    winner: Winner,
    proof_hash: &str,
    at: DateTime<Utc>,
) -> ConfirmedEvent {
    ConfirmedEvent::new(
        LedgerEvent::PoolResolvedConfirmed {
            pool_id: PoolId::new(pool_id),
            winner,
            proof_hash: proof_hash.to_string(),
        },
        at,
    )
}
