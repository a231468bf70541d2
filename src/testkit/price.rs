//! Scripted [`PriceOracle`] for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::id::AssetId;
use crate::domain::money::Price;
use crate::error::{Error, Result};
use crate::port::outbound::price::{PriceOracle, PriceQuote};

/// Returns the scripted price, after popping any queued failure.
///
/// With no price set every call fails with `PriceUnavailable`.
pub struct ScriptedPriceOracle {
    name: String,
    price: Mutex<Option<Price>>,
    failures: Mutex<VecDeque<String>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicU32,
}

impl ScriptedPriceOracle {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            price: Mutex::new(None),
            failures: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            calls: AtomicU32::new(0),
        }
    }

    /// Oracle that always answers `price`.
    pub fn with_price(name: &str, price: Price) -> Self {
        let oracle = Self::new(name);
        oracle.set_price(price);
        oracle
    }

    pub fn set_price(&self, price: Price) {
        *self.price.lock() = Some(price);
    }

    pub fn clear_price(&self) {
        *self.price.lock() = None;
    }

    /// Fail the next call with `reason`.
    pub fn fail_next(&self, reason: &str) {
        self.failures.lock().push_back(reason.to_string());
    }

    /// Sleep before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for ScriptedPriceOracle {
    async fn fetch_price(&self, asset: &AssetId) -> Result<PriceQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().pop_front();
        if let Some(reason) = failure {
            return Err(Error::PriceUnavailable {
                asset: asset.to_string(),
                reason,
            });
        }

        let price = *self.price.lock();
        match price {
            Some(price) => Ok(PriceQuote {
                price,
                source: self.name.clone(),
            }),
            None => Err(Error::PriceUnavailable {
                asset: asset.to_string(),
                reason: "no price scripted".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
