//! JSON-over-HTTP price source.
//!
//! Works with any aggregator that answers a GET with a JSON document holding
//! the price: the asset id is substituted into a URL template and into a
//! JSON pointer that locates the price in the response.

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::domain::id::AssetId;
use crate::domain::money::Price;
use crate::error::{Error, Result};
use crate::port::outbound::price::{PriceOracle, PriceQuote};

/// Placeholder replaced with the asset id in templates.
const ASSET_PLACEHOLDER: &str = "{asset}";

#[derive(Debug)]
pub struct HttpPriceOracle {
    client: Client,
    name: String,
    url_template: String,
    price_pointer: String,
    /// Header name and value sent with every request.
    api_key: Option<(String, String)>,
}

impl HttpPriceOracle {
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        price_pointer: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            url_template: url_template.into(),
            price_pointer: price_pointer.into(),
            api_key: None,
        }
    }

    /// Send `key` in `header` with every request.
    #[must_use]
    pub fn with_api_key(mut self, header: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_key = Some((header.into(), key.into()));
        self
    }

    fn url_for(&self, asset: &AssetId) -> Result<url::Url> {
        let raw = self.url_template.replace(ASSET_PLACEHOLDER, asset.as_str());
        Ok(url::Url::parse(&raw)?)
    }

    fn unavailable(asset: &AssetId, reason: impl Into<String>) -> Error {
        Error::PriceUnavailable {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }

    /// Locate and parse the price in a response body.
    fn extract(&self, asset: &AssetId, body: &Value) -> Result<Price> {
        let pointer = self.price_pointer.replace(ASSET_PLACEHOLDER, asset.as_str());
        let value = body.pointer(&pointer).ok_or_else(|| {
            Self::unavailable(asset, format!("{}: no value at {pointer}", self.name))
        })?;
        let price = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
        .ok_or_else(|| Self::unavailable(asset, format!("{}: unusable price {value}", self.name)))?;

        if price <= Decimal::ZERO {
            return Err(Self::unavailable(
                asset,
                format!("{}: non-positive price {price}", self.name),
            ));
        }
        Ok(price)
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn fetch_price(&self, asset: &AssetId) -> Result<PriceQuote> {
        let url = self.url_for(asset)?;
        let mut request = self.client.get(url);
        if let Some((header, key)) = &self.api_key {
            request = request.header(header.as_str(), key.as_str());
        }

        let body: Value = request
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Self::unavailable(asset, format!("{}: {e}", self.name)))?
            .json()
            .await?;

        let price = self.extract(asset, &body)?;
        debug!(source = %self.name, asset = %asset, price = %price, "Price fetched");
        Ok(PriceQuote {
            price,
            source: self.name.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
