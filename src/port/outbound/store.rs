//! Persistence port for pools, entries, price history and resolutions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entry::{Entry, EntryKey};
use crate::domain::id::{AssetId, PoolId};
use crate::domain::money::Amount;
use crate::domain::pool::{Pool, PoolStatus};
use crate::domain::price::PricePoint;
use crate::domain::proof::StagedResolution;
use crate::error::Result;

/// Criteria for listing pools. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct PoolFilter {
    /// Stored status to match.
    pub status: Option<PoolStatus>,
    /// Only stored Open or Locked pools.
    pub active: bool,
    /// Asset to match.
    pub asset: Option<AssetId>,
    /// Order by combined stake, largest first, instead of by id.
    pub by_volume: bool,
    /// Maximum pools returned, applied after ordering.
    pub limit: Option<usize>,
}

/// Repository for the local projection.
///
/// Every pool write is a compare-and-swap on [`Pool::version`]: the stored
/// version must equal the version of the pool being written, and the stored
/// copy is bumped by one. A mismatch fails with
/// [`Error::StaleWrite`](crate::error::Error::StaleWrite).
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Insert a new pool. Fails with `AlreadyExists` if the id is taken.
    async fn insert_pool(&self, pool: &Pool) -> Result<()>;

    async fn pool(&self, id: PoolId) -> Result<Option<Pool>>;

    /// Pools matching `filter`, ordered by id unless `by_volume` is set.
    /// Ties in volume fall back to id.
    async fn pools(&self, filter: &PoolFilter) -> Result<Vec<Pool>>;

    /// Stored Open pools whose lock time has passed.
    async fn due_to_lock(&self, now: DateTime<Utc>) -> Result<Vec<Pool>>;

    /// Stored Open or Locked pools whose end time has passed.
    async fn due_to_resolve(&self, now: DateTime<Utc>) -> Result<Vec<Pool>>;

    /// Persist `pool` with compare-and-swap, returning the stored copy.
    async fn save_pool(&self, pool: &Pool) -> Result<Pool>;

    async fn entry(&self, key: &EntryKey) -> Result<Option<Entry>>;

    async fn entries(&self, pool_id: PoolId) -> Result<Vec<Entry>>;

    /// Upsert `entry` and persist the updated `pool` aggregate in one
    /// transaction. The pool write is compare-and-swap.
    async fn apply_entry(&self, entry: &Entry, pool: &Pool) -> Result<Pool>;

    /// Mark an entry claimed. Returns false if it was already claimed or
    /// does not exist.
    async fn mark_claimed(&self, key: &EntryKey, payout: Amount, at: DateTime<Utc>)
        -> Result<bool>;

    async fn record_price(&self, point: &PricePoint) -> Result<()>;

    /// Price history for a pool, oldest first.
    async fn price_history(&self, pool_id: PoolId) -> Result<Vec<PricePoint>>;

    /// Record a published proof. Re-staging the same hash is a no-op.
    async fn stage_resolution(&self, staged: &StagedResolution) -> Result<()>;

    /// Staged resolutions for a pool, oldest first.
    async fn staged_resolutions(&self, pool_id: PoolId) -> Result<Vec<StagedResolution>>;
}
