//! A fully wired engine over in-memory adapters.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::adapter::outbound::memory::store::MemoryPoolStore;
use crate::application::engine::{Engine, EngineSettings};
use crate::application::state::{Context, Policy};
use crate::domain::id::PoolId;
use crate::domain::money::Price;
use crate::port::outbound::notifier::{Event, Notifier, NotifierRegistry};
use crate::port::outbound::store::PoolStore;

use super::clock::ManualClock;
use super::config;
use super::domain::{price_point, t0};
use super::price::ScriptedPriceOracle;
use super::proof::MemoryProofStore;

/// Notifier that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Engine plus handles on every adapter behind it.
pub struct TestEngine {
    pub engine: Engine,
    pub store: Arc<MemoryPoolStore>,
    pub clock: Arc<ManualClock>,
    pub prices: Arc<ScriptedPriceOracle>,
    pub proofs: Arc<MemoryProofStore>,
    pub notifications: RecordingNotifier,
}

impl TestEngine {
    /// Clock at [`t0`], default policy, fast timeouts.
    pub fn new() -> Self {
        Self::with(config::policy(), config::engine_settings())
    }

    pub fn with(policy: Policy, settings: EngineSettings) -> Self {
        let store = Arc::new(MemoryPoolStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let prices = Arc::new(ScriptedPriceOracle::new("jupiter"));
        let proofs = Arc::new(MemoryProofStore::new());
        let notifications = RecordingNotifier::default();

        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(notifications.clone()));

        let ctx = Context::new(
            store.clone(),
            clock.clone(),
            Arc::new(registry),
            policy,
        );
        let engine = Engine::new(ctx, prices.clone(), proofs.clone(), settings);

        Self {
            engine,
            store,
            clock,
            prices,
            proofs,
            notifications,
        }
    }

    /// Record a start price sample at `t0`.
    pub async fn record_start_price(&self, pool_id: u64, price: Price) {
        self.store
            .record_price(&price_point(pool_id, t0(), price))
            .await
            .unwrap();
    }

    pub async fn pool(&self, pool_id: u64) -> crate::domain::pool::Pool {
        self.store.pool(PoolId::new(pool_id)).await.unwrap().unwrap()
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}
