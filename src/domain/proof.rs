//! Verifiable resolution records and commitment hashes.
//!
//! A [`ResolutionProof`] captures every input that decided a pool. Its
//! canonical form is the JSON serialization of the struct, whose field order
//! is fixed by declaration. The content hash is the `0x`-prefixed hex SHA-256
//! of those bytes, so anyone holding the proof can recompute and compare it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::id::{AssetId, PoolId};
use super::money::{Amount, Bps, Price};
use super::pool::{Pool, Winner};

/// Append-only audit record of a pool resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionProof {
    pub pool_id: PoolId,
    pub asset: AssetId,
    pub symbol: String,
    pub start_ts: DateTime<Utc>,
    pub lock_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub line_bps: Bps,
    pub start_price: Price,
    pub final_price: Price,
    pub change_bps: i64,
    pub winner: Winner,
    pub resolved_at: DateTime<Utc>,
    pub oracle_version: String,
    pub price_sources: Vec<String>,
    pub total_over: Amount,
    pub total_under: Amount,
    pub void_reason: Option<String>,
}

/// Measured inputs of an oracle resolution.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub start_price: Price,
    pub final_price: Price,
    pub change_bps: i64,
    pub winner: Winner,
    pub price_sources: Vec<String>,
}

impl ResolutionProof {
    /// Proof for an oracle-measured outcome.
    #[must_use]
    pub fn measured(
        pool: &Pool,
        measurement: Measurement,
        resolved_at: DateTime<Utc>,
        oracle_version: &str,
        void_reason: Option<String>,
    ) -> Self {
        Self {
            pool_id: pool.id,
            asset: pool.asset.clone(),
            symbol: pool.symbol.clone(),
            start_ts: pool.start_ts,
            lock_ts: pool.lock_ts,
            end_ts: pool.end_ts,
            line_bps: pool.line(),
            start_price: measurement.start_price,
            final_price: measurement.final_price,
            change_bps: measurement.change_bps,
            winner: measurement.winner,
            resolved_at,
            oracle_version: oracle_version.to_string(),
            price_sources: measurement.price_sources,
            total_over: pool.total_over,
            total_under: pool.total_under,
            void_reason,
        }
    }

    /// Proof for an administrative void: zeroed prices plus the reason.
    #[must_use]
    pub fn administrative_void(
        pool: &Pool,
        reason: &str,
        resolved_at: DateTime<Utc>,
        oracle_version: &str,
    ) -> Self {
        Self {
            pool_id: pool.id,
            asset: pool.asset.clone(),
            symbol: pool.symbol.clone(),
            start_ts: pool.start_ts,
            lock_ts: pool.lock_ts,
            end_ts: pool.end_ts,
            line_bps: pool.line(),
            start_price: Decimal::ZERO,
            final_price: Decimal::ZERO,
            change_bps: 0,
            winner: Winner::Void,
            resolved_at,
            oracle_version: oracle_version.to_string(),
            price_sources: Vec::new(),
            total_over: pool.total_over,
            total_under: pool.total_under,
            void_reason: Some(reason.to_string()),
        }
    }

    /// True when the proof captured the pool's current stake totals.
    #[must_use]
    pub fn covers(&self, pool: &Pool) -> bool {
        self.total_over == pool.total_over && self.total_under == pool.total_under
    }

    /// Canonical byte form used for hashing and publication.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Content hash of the canonical bytes.
    pub fn content_hash(&self) -> serde_json::Result<String> {
        Ok(hash_bytes(&self.canonical_bytes()?))
    }
}

/// `0x`-prefixed hex SHA-256 of `bytes`.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// True when `bytes` hash to `expected`, ignoring hex case.
#[must_use]
pub fn matches_hash(bytes: &[u8], expected: &str) -> bool {
    hash_bytes(bytes).eq_ignore_ascii_case(expected)
}

/// Commitment over a pool's declared prediction parameters.
#[must_use]
pub fn ai_commit(
    line: Option<Bps>,
    confidence: Bps,
    model: &str,
    start_ts: DateTime<Utc>,
    lock_ts: DateTime<Utc>,
    end_ts: DateTime<Utc>,
) -> String {
    let line = line.map_or_else(|| "market".to_string(), |l| l.to_string());
    let preimage = format!(
        "line={line}|confidence={confidence}|model={model}|start={}|lock={}|end={}",
        start_ts.timestamp(),
        lock_ts.timestamp(),
        end_ts.timestamp()
    );
    hash_bytes(preimage.as_bytes())
}

/// A published proof waiting to be applied as a status transition.
///
/// Written after the proof upload and before the transition so a retry only
/// repeats the transition. Rows are kept afterwards as the resolution audit
/// trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedResolution {
    pub pool_id: PoolId,
    pub proof: ResolutionProof,
    pub hash: String,
    pub url: String,
    pub staged_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::NewPool;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn pool() -> Pool {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Pool::create(NewPool {
            id: PoolId::new(9),
            asset: AssetId::new("mint"),
            symbol: "BONK".into(),
            start_ts: start,
            lock_ts: start + Duration::minutes(30),
            end_ts: start + Duration::hours(1),
            line_bps: Some(300),
            model: "m".into(),
            confidence_bps: 6_000,
        })
        .unwrap()
    }

    fn proof() -> ResolutionProof {
        let pool = pool();
        ResolutionProof::measured(
            &pool,
            Measurement {
                start_price: dec!(0.000021),
                final_price: dec!(0.0000220),
                change_bps: 476,
                winner: Winner::Over,
                price_sources: vec!["jupiter".into()],
            },
            pool.end_ts,
            "v1.0.0",
            None,
        )
    }

    #[test]
    fn content_hash_is_stable_and_prefixed() {
        let a = proof().content_hash().unwrap();
        let b = proof().content_hash().unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 66);
    }

    #[test]
    fn any_field_change_changes_hash() {
        let mut tampered = proof();
        tampered.final_price = dec!(0.0000221);
        assert_ne!(
            proof().content_hash().unwrap(),
            tampered.content_hash().unwrap()
        );
    }

    #[test]
    fn matches_hash_recomputes() {
        let bytes = proof().canonical_bytes().unwrap();
        let hash = proof().content_hash().unwrap();
        assert!(matches_hash(&bytes, &hash));
        assert!(matches_hash(&bytes, &hash.to_uppercase().replacen("0X", "0x", 1)));
        assert!(!matches_hash(b"{}", &hash));
    }

    #[test]
    fn credited_stake_outdates_the_proof() {
        let mut pool = pool();
        let p = proof();
        assert!(p.covers(&pool));
        pool.credit(crate::domain::pool::Side::Under, Amount::new(1)).unwrap();
        assert!(!p.covers(&pool));
    }

    #[test]
    fn administrative_void_zeroes_prices() {
        let pool = pool();
        let p = ResolutionProof::administrative_void(&pool, "feed outage", pool.lock_ts, "v1.0.0");
        assert_eq!(p.start_price, Decimal::ZERO);
        assert_eq!(p.winner, Winner::Void);
        assert_eq!(p.void_reason.as_deref(), Some("feed outage"));
    }

    #[test]
    fn ai_commit_depends_on_every_parameter() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let base = ai_commit(Some(Bps::new(300)), Bps::new(7_000), "m", t, t, t);
        assert_ne!(
            base,
            ai_commit(Some(Bps::new(301)), Bps::new(7_000), "m", t, t, t)
        );
        assert_ne!(base, ai_commit(None, Bps::new(7_000), "m", t, t, t));
        assert_ne!(
            base,
            ai_commit(Some(Bps::new(300)), Bps::new(7_000), "n", t, t, t)
        );
    }
}
