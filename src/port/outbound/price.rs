//! Price source port.

use async_trait::async_trait;

use crate::domain::id::AssetId;
use crate::domain::money::Price;
use crate::error::Result;

/// A price observation and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub price: Price,
    pub source: String,
}

/// Current-price lookup for an asset.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Fetch the current price.
    ///
    /// Fails with [`Error::PriceUnavailable`](crate::error::Error::PriceUnavailable)
    /// when the source has no usable price.
    async fn fetch_price(&self, asset: &AssetId) -> Result<PriceQuote>;

    /// Source name recorded in proofs.
    fn name(&self) -> &str;
}
