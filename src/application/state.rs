//! Shared application state.

use std::sync::Arc;

use crate::application::guard::PoolGuards;
use crate::domain::money::{Amount, Bps};
use crate::error::{Result, SettlementError};
use crate::domain::id::PoolId;
use crate::domain::pool::Pool;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::notifier::{Event, NotifierRegistry};
use crate::port::outbound::store::PoolStore;

/// Settlement policy applied by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Fee charged on each entry's gross amount.
    pub fee_bps: Bps,
    /// Changes closer than this to the line resolve Void.
    pub void_band: Bps,
    /// Smallest gross amount accepted for an entry.
    pub min_entry: Amount,
    /// Version tag written into every proof.
    pub oracle_version: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fee_bps: Bps::new(75),
            void_band: Bps::new(1),
            min_entry: Amount::new(10_000_000),
            oracle_version: "v1.0.0".to_string(),
        }
    }
}

/// Dependencies shared by every application service.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn PoolStore>,
    pub clock: Arc<dyn Clock>,
    pub notifiers: Arc<NotifierRegistry>,
    pub guards: PoolGuards,
    pub policy: Arc<Policy>,
}

impl Context {
    pub fn new(
        store: Arc<dyn PoolStore>,
        clock: Arc<dyn Clock>,
        notifiers: Arc<NotifierRegistry>,
        policy: Policy,
    ) -> Self {
        Self {
            store,
            clock,
            notifiers,
            guards: PoolGuards::new(),
            policy: Arc::new(policy),
        }
    }

    /// Load a pool or fail with `PoolNotFound`.
    pub async fn load_pool(&self, pool_id: PoolId) -> Result<Pool> {
        self.store
            .pool(pool_id)
            .await?
            .ok_or_else(|| SettlementError::PoolNotFound(pool_id).into())
    }

    pub fn notify(&self, event: Event) {
        self.notifiers.notify_all(event);
    }
}
