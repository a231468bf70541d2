//! Ordered chain of price sources; the first success wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::id::AssetId;
use crate::error::{Error, Result};
use crate::port::outbound::price::{PriceOracle, PriceQuote};

pub struct FallbackPriceOracle {
    sources: Vec<Arc<dyn PriceOracle>>,
}

impl FallbackPriceOracle {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn PriceOracle>>) -> Self {
        Self { sources }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl PriceOracle for FallbackPriceOracle {
    async fn fetch_price(&self, asset: &AssetId) -> Result<PriceQuote> {
        let mut failures = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.fetch_price(asset).await {
                Ok(quote) => return Ok(quote),
                Err(e) => {
                    warn!(source = source.name(), asset = %asset, error = %e, "Price source failed");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }
        Err(Error::PriceUnavailable {
            asset: asset.to_string(),
            reason: if failures.is_empty() {
                "no price sources configured".to_string()
            } else {
                failures.join("; ")
            },
        })
    }

    fn name(&self) -> &str {
        "fallback"
    }
}
