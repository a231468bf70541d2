//! Pool operations exposed to drivers (CLI, runtime, future HTTP surface).

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::curve::PredictionCurve;
use crate::domain::entry::Entry;
use crate::domain::id::{ParticipantId, PoolId};
use crate::domain::money::{Amount, Price};
use crate::domain::pool::{NewPool, Pool, PoolStatus, ProofRef, Side, Winner};
use crate::domain::price::PricePoint;
use crate::domain::settlement::{FeeQuote, Payout, SettlementSummary};
use crate::error::Result;
use crate::port::outbound::store::PoolFilter;

/// A pool as observed now.
#[derive(Debug, Clone, Serialize)]
pub struct PoolView {
    #[serde(flatten)]
    pub pool: Pool,
    /// Status with the implicit lock applied.
    pub effective_status: PoolStatus,
}

/// A prospective entry to validate and price.
#[derive(Debug, Clone)]
pub struct EntryRequest {
    pub pool_id: PoolId,
    pub participant: ParticipantId,
    pub side: Side,
    pub amount: Amount,
}

/// Accepted entry with its fee split.
#[derive(Debug, Clone, Serialize)]
pub struct EntryQuote {
    pub pool_id: PoolId,
    pub participant: ParticipantId,
    pub side: Side,
    #[serde(flatten)]
    pub fee: FeeQuote,
    /// True when the participant already holds an entry on this side.
    pub top_up: bool,
}

/// Amount a participant may claim.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimQuote {
    pub pool_id: PoolId,
    pub participant: ParticipantId,
    #[serde(flatten)]
    pub payout: Payout,
}

/// Outcome of a resolve or void request.
#[derive(Debug, Clone, Serialize)]
pub struct SettledPool {
    pub pool_id: PoolId,
    pub winner: Winner,
    pub proof: ProofRef,
    /// False when the pool was already settled with the same outcome.
    pub changed: bool,
}

/// Result of recomputing a published proof's hash.
#[derive(Debug, Clone, Serialize)]
pub struct ProofCheck {
    pub pool_id: PoolId,
    pub url: String,
    pub expected_hash: String,
    pub actual_hash: String,
    pub valid: bool,
}

/// Result of recomputing the AI commitment from the stored pool fields.
#[derive(Debug, Clone, Serialize)]
pub struct CommitmentCheck {
    pub pool_id: PoolId,
    /// Commitment recorded at creation.
    pub stored_commit: String,
    /// Commitment derived from the pool as stored now.
    pub actual_commit: String,
    pub valid: bool,
}

/// Use cases of the pool engine.
#[async_trait]
pub trait PoolApi: Send + Sync {
    async fn create_pool(&self, new: NewPool) -> Result<Pool>;

    async fn get_pool(&self, pool_id: PoolId) -> Result<PoolView>;

    /// Record an operator-supplied start price at the pool's start time.
    async fn record_start_price(&self, pool_id: PoolId, price: Price) -> Result<PricePoint>;

    async fn list_pools(&self, filter: &PoolFilter) -> Result<Vec<PoolView>>;

    /// Open and locked pools with the most stake, largest first.
    async fn top_pools(&self, limit: usize) -> Result<Vec<PoolView>>;

    async fn list_pools_due_to_lock(&self) -> Result<Vec<PoolView>>;

    async fn list_pools_due_to_resolve(&self) -> Result<Vec<PoolView>>;

    async fn get_entry(&self, pool_id: PoolId, participant: ParticipantId) -> Result<Entry>;

    /// Confirmed entries of an existing pool.
    async fn list_entries(&self, pool_id: PoolId) -> Result<Vec<Entry>>;

    /// Recorded price samples, oldest first.
    async fn price_history(&self, pool_id: PoolId) -> Result<Vec<PricePoint>>;

    /// Validate an entry and quote its fee. Nothing is stored; the entry
    /// becomes real once the ledger confirms it.
    async fn submit_entry(&self, request: EntryRequest) -> Result<EntryQuote>;

    /// Validate a claim and compute its payout. The transfer is the
    /// ledger's job.
    async fn request_claim(&self, pool_id: PoolId, participant: ParticipantId)
        -> Result<ClaimQuote>;

    /// Administrative lock.
    async fn lock_pool(&self, pool_id: PoolId) -> Result<PoolView>;

    async fn resolve_pool(&self, pool_id: PoolId) -> Result<SettledPool>;

    /// Administrative void with a reason; entries are refunded gross.
    async fn void_pool(&self, pool_id: PoolId, reason: &str) -> Result<SettledPool>;

    async fn verify_proof(&self, pool_id: PoolId) -> Result<ProofCheck>;

    /// Detect edits to the line, confidence, model or times after creation.
    async fn verify_commitment(&self, pool_id: PoolId) -> Result<CommitmentCheck>;

    async fn prediction_curve(&self, pool_id: PoolId) -> Result<PredictionCurve>;

    async fn settlement_summary(&self, pool_id: PoolId) -> Result<SettlementSummary>;

    /// Lift an integrity halt after manual review.
    async fn clear_halt(&self, pool_id: PoolId) -> Result<PoolView>;
}
