//! Command dispatch for the parsed command line.

use std::path::Path;

use tracing::debug;

use crate::adapter::inbound::cli::command::{ClaimCommand, Cli, Commands};
use crate::adapter::inbound::cli::{config, entry, pool, quote, replay, run};
use crate::error::{ConfigError, Result};
use crate::port::inbound::operator::OperatorPort;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Read the explicit config, else `config.toml` when present. Without
/// either the text is empty and every setting takes its default.
pub fn read_config_toml(path: Option<&Path>) -> Result<String> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Path::new(DEFAULT_CONFIG_PATH),
        None => return Ok(String::new()),
    };
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile(e).into())
}

/// Run the parsed command line against `operator`.
pub async fn execute(cli: Cli, operator: &dyn OperatorPort) -> Result<()> {
    let config_toml = read_config_toml(cli.config.as_deref())?;
    operator.init_logging(&config_toml)?;
    debug!(command = ?cli.command, "Dispatching command");

    match cli.command {
        Commands::Run(args) => run::execute(operator, config_toml, args).await,
        Commands::Config(command) => config::execute(operator, &config_toml, &command),
        Commands::Replay(args) => replay::execute(operator, &config_toml, args).await,
        Commands::Pool(command) => {
            let pools = operator.pools(&config_toml)?;
            pool::execute(pools.as_ref(), command).await
        }
        Commands::Entry(command) => {
            let pools = operator.pools(&config_toml)?;
            entry::execute(pools.as_ref(), command).await
        }
        Commands::Claim(ClaimCommand::Quote(args)) => {
            let pools = operator.pools(&config_toml)?;
            quote::execute_claim(pools.as_ref(), args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_config_is_a_read_error() {
        let err = read_config_toml(Some(Path::new("/nonexistent/linepool.toml"))).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::ReadFile(_))
        ));
    }

    #[test]
    fn explicit_config_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linepool.toml");
        std::fs::write(&path, "[policy]\nfee_bps = 50\n").unwrap();
        assert_eq!(
            read_config_toml(Some(&path)).unwrap(),
            "[policy]\nfee_bps = 50\n"
        );
    }
}
