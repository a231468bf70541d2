//! Handler for the `config` command group.

use crate::adapter::inbound::cli::command::ConfigCommand;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::port::inbound::operator::OperatorPort;

/// Execute a `config` subcommand.
pub fn execute(operator: &dyn OperatorPort, config_toml: &str, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Check => check(operator, config_toml),
    }
}

fn check(operator: &dyn OperatorPort, config_toml: &str) -> Result<()> {
    let summary = operator.check_config(config_toml)?;
    if output::record("config", &summary) {
        return Ok(());
    }

    output::success("Configuration is valid");

    output::section("Policy");
    output::field("Fee", format!("{}bps", summary.fee_bps));
    output::field("Void band", format!("{}bps", summary.void_band_bps));
    output::field("Min entry", summary.min_entry);
    output::field("Oracle", &summary.oracle_version);

    output::section("Scheduler");
    output::field("Tick", format!("{}s", summary.tick_secs));
    output::field("Concurrency", summary.max_concurrent_resolutions);
    output::field("Backoff", &summary.backoff);

    output::section("Storage");
    output::field("Database", &summary.database);
    output::field("Proofs", &summary.proof_dir);
    output::field("Ledger", summary.events_path.as_deref().unwrap_or("(none)"));
    output::field("Max parked", summary.max_parked);

    output::section("Price sources");
    for name in &summary.price_sources {
        output::note(&format!("- {name}"));
    }

    if !summary.warnings.is_empty() {
        output::section("Warnings");
        for warning in &summary.warnings {
            output::warning(warning);
        }
    }
    Ok(())
}
