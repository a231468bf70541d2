//! In-memory store implementation for tests and dry runs.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::entry::{Entry, EntryKey};
use crate::domain::id::PoolId;
use crate::domain::money::Amount;
use crate::domain::pool::{Pool, PoolStatus};
use crate::domain::price::PricePoint;
use crate::domain::proof::StagedResolution;
use crate::error::{Error, Result, SettlementError};
use crate::port::outbound::store::{PoolFilter, PoolStore};

#[derive(Debug, Default)]
struct State {
    pools: BTreeMap<PoolId, Pool>,
    entries: HashMap<EntryKey, Entry>,
    prices: HashMap<PoolId, Vec<PricePoint>>,
    resolutions: HashMap<PoolId, Vec<StagedResolution>>,
}

impl State {
    fn write_pool(&mut self, pool: &Pool) -> Result<Pool> {
        let stored = self
            .pools
            .get_mut(&pool.id)
            .ok_or(SettlementError::PoolNotFound(pool.id))?;
        if stored.version != pool.version {
            return Err(Error::StaleWrite(pool.id));
        }
        let mut saved = pool.clone();
        saved.version += 1;
        *stored = saved.clone();
        Ok(saved)
    }
}

/// In-memory [`PoolStore`]. All state lives behind one lock so multi-row
/// writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryPoolStore {
    state: RwLock<State>,
}

impl MemoryPoolStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PoolStore for MemoryPoolStore {
    async fn insert_pool(&self, pool: &Pool) -> Result<()> {
        let mut state = self.state.write();
        if state.pools.contains_key(&pool.id) {
            return Err(SettlementError::AlreadyExists(pool.id).into());
        }
        state.pools.insert(pool.id, pool.clone());
        Ok(())
    }

    async fn pool(&self, id: PoolId) -> Result<Option<Pool>> {
        Ok(self.state.read().pools.get(&id).cloned())
    }

    async fn pools(&self, filter: &PoolFilter) -> Result<Vec<Pool>> {
        let state = self.state.read();
        let mut pools: Vec<Pool> = state
            .pools
            .values()
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| !filter.active || !p.is_terminal())
            .filter(|p| filter.asset.as_ref().map_or(true, |a| &p.asset == a))
            .cloned()
            .collect();
        if filter.by_volume {
            pools.sort_by(|a, b| b.volume().cmp(&a.volume()).then(a.id.cmp(&b.id)));
        }
        pools.truncate(filter.limit.unwrap_or(usize::MAX));
        Ok(pools)
    }

    async fn due_to_lock(&self, now: DateTime<Utc>) -> Result<Vec<Pool>> {
        let state = self.state.read();
        let mut due: Vec<Pool> = state
            .pools
            .values()
            .filter(|p| p.status == PoolStatus::Open && p.lock_ts <= now)
            .cloned()
            .collect();
        due.sort_by_key(|p| p.lock_ts);
        Ok(due)
    }

    async fn due_to_resolve(&self, now: DateTime<Utc>) -> Result<Vec<Pool>> {
        let state = self.state.read();
        let mut due: Vec<Pool> = state
            .pools
            .values()
            .filter(|p| !p.is_terminal() && p.end_ts <= now)
            .cloned()
            .collect();
        due.sort_by_key(|p| p.end_ts);
        Ok(due)
    }

    async fn save_pool(&self, pool: &Pool) -> Result<Pool> {
        self.state.write().write_pool(pool)
    }

    async fn entry(&self, key: &EntryKey) -> Result<Option<Entry>> {
        Ok(self.state.read().entries.get(key).cloned())
    }

    async fn entries(&self, pool_id: PoolId) -> Result<Vec<Entry>> {
        let state = self.state.read();
        let mut entries: Vec<Entry> = state
            .entries
            .values()
            .filter(|e| e.pool_id == pool_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.participant.cmp(&b.participant));
        Ok(entries)
    }

    async fn apply_entry(&self, entry: &Entry, pool: &Pool) -> Result<Pool> {
        let mut state = self.state.write();
        let saved = state.write_pool(pool)?;
        state.entries.insert(entry.key(), entry.clone());
        Ok(saved)
    }

    async fn mark_claimed(
        &self,
        key: &EntryKey,
        payout: Amount,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write();
        match state.entries.get_mut(key) {
            Some(entry) if !entry.claimed => {
                entry.claimed = true;
                entry.claim_payout = Some(payout);
                entry.claimed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_price(&self, point: &PricePoint) -> Result<()> {
        let mut state = self.state.write();
        let history = state.prices.entry(point.pool_id).or_default();
        history.push(point.clone());
        history.sort_by_key(|p| p.ts);
        Ok(())
    }

    async fn price_history(&self, pool_id: PoolId) -> Result<Vec<PricePoint>> {
        Ok(self
            .state
            .read()
            .prices
            .get(&pool_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn stage_resolution(&self, staged: &StagedResolution) -> Result<()> {
        let mut state = self.state.write();
        let staged_for_pool = state.resolutions.entry(staged.pool_id).or_default();
        if !staged_for_pool.iter().any(|s| s.hash == staged.hash) {
            staged_for_pool.push(staged.clone());
        }
        Ok(())
    }

    async fn staged_resolutions(&self, pool_id: PoolId) -> Result<Vec<StagedResolution>> {
        Ok(self
            .state
            .read()
            .resolutions
            .get(&pool_id)
            .cloned()
            .unwrap_or_default())
    }
}
