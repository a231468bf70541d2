//! Composition root: builds adapters from configuration and wires the engine.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::memory::store::MemoryPoolStore;
use crate::adapter::outbound::price::fallback::FallbackPriceOracle;
use crate::adapter::outbound::price::http::HttpPriceOracle;
use crate::adapter::outbound::proof::fs::FsProofStore;
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::sqlite::store::SqlitePoolStore;
use crate::application::engine::Engine;
use crate::application::state::Context;
use crate::error::Result;
use crate::infrastructure::config::price::PriceSourceConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::clock::{Clock, SystemClock};
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};
use crate::port::outbound::price::PriceOracle;
use crate::port::outbound::proof::ProofStore;
use crate::port::outbound::store::PoolStore;

/// Open the configured store, running migrations for SQLite.
pub fn build_store(config: &Config) -> Result<Arc<dyn PoolStore>> {
    if config.storage.is_in_memory() {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryPoolStore::new()));
    }
    let pool = create_pool(&config.storage.database)?;
    run_migrations(&pool)?;
    info!(database = %config.storage.database, "Database initialized");
    Ok(Arc::new(SqlitePoolStore::new(pool)))
}

fn build_price_source(source: &PriceSourceConfig) -> Option<HttpPriceOracle> {
    let oracle = HttpPriceOracle::new(&source.name, &source.url, &source.pointer);
    match (&source.api_key_header, &source.api_key_env) {
        (Some(header), Some(var)) => match std::env::var(var) {
            Ok(key) => Some(oracle.with_api_key(header, key)),
            Err(_) => {
                warn!(source = %source.name, env = %var, "API key not set, skipping price source");
                None
            }
        },
        _ => Some(oracle),
    }
}

/// Chain the configured price sources in order.
#[must_use]
pub fn build_price_oracle(config: &Config) -> Arc<dyn PriceOracle> {
    let sources: Vec<Arc<dyn PriceOracle>> = config
        .price
        .sources
        .iter()
        .filter_map(build_price_source)
        .map(|s| Arc::new(s) as Arc<dyn PriceOracle>)
        .collect();
    info!(sources = sources.len(), "Price sources initialized");
    Arc::new(FallbackPriceOracle::new(sources))
}

pub fn build_proof_store(config: &Config) -> Result<Arc<dyn ProofStore>> {
    let store = FsProofStore::new(&config.storage.proof_dir)?;
    info!(root = %store.root().display(), "Proof store initialized");
    Ok(Arc::new(store))
}

#[must_use]
pub fn build_notifier_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Wire an engine from explicit adapters.
pub fn build_engine_with(
    config: &Config,
    store: Arc<dyn PoolStore>,
    prices: Arc<dyn PriceOracle>,
    proofs: Arc<dyn ProofStore>,
    clock: Arc<dyn Clock>,
) -> Engine {
    let ctx = Context::new(
        store,
        clock,
        Arc::new(build_notifier_registry()),
        config.policy(),
    );
    Engine::new(ctx, prices, proofs, config.engine_settings())
}

/// Wire an engine from configuration with production adapters.
pub fn build_engine(config: &Config) -> Result<Engine> {
    let store = build_store(config)?;
    let proofs = build_proof_store(config)?;
    let prices = build_price_oracle(config);
    Ok(build_engine_with(
        config,
        store,
        prices,
        proofs,
        Arc::new(SystemClock),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_without_key_is_skipped() {
        let source = PriceSourceConfig {
            name: "keyed".into(),
            url: "https://example.com/{asset}".into(),
            pointer: "/price".into(),
            api_key_header: Some("X-API-KEY".into()),
            api_key_env: Some("LINEPOOL_TEST_KEY_THAT_IS_NEVER_SET".into()),
        };
        assert!(build_price_source(&source).is_none());

        let open = PriceSourceConfig {
            api_key_header: None,
            api_key_env: None,
            ..source
        };
        assert!(build_price_source(&open).is_some());
    }

    #[test]
    fn builds_sqlite_engine_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "[storage]\ndatabase = \"{}\"\nproof_dir = \"{}\"\n",
            dir.path().join("pools.db").display(),
            dir.path().join("proofs").display()
        );
        let config = Config::parse_toml(&toml).unwrap();
        assert!(build_engine(&config).is_ok());
        assert!(dir.path().join("proofs").is_dir());
    }
}
