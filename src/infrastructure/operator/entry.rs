//! The operator behind [`OperatorPort`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::infrastructure::bootstrap::build_engine;
use crate::port::inbound::operator::{ConfigSummary, OperatorPort, RunRequest, RunSummary};
use crate::port::inbound::pools::PoolApi;

use super::{config, runtime};

/// Stateless operator; each call works from the configuration it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operator;

#[async_trait]
impl OperatorPort for Operator {
    fn check_config(&self, config_toml: &str) -> Result<ConfigSummary> {
        Ok(config::summarize(&config::parse(config_toml)?))
    }

    fn init_logging(&self, config_toml: &str) -> Result<()> {
        config::parse(config_toml)?.init_logging();
        Ok(())
    }

    fn pools(&self, config_toml: &str) -> Result<Arc<dyn PoolApi>> {
        let config = config::parse(config_toml)?;
        Ok(Arc::new(build_engine(&config)?))
    }

    async fn run(&self, request: RunRequest) -> Result<RunSummary> {
        runtime::run(request).await
    }

    async fn replay(&self, config_toml: &str, events_path: &str) -> Result<RunSummary> {
        runtime::replay(config_toml, events_path).await
    }
}
