//! Handler for the `run` command.

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::port::inbound::operator::{ConfigSummary, OperatorPort, RunRequest, RunSummary};

/// Execute the run command.
pub async fn execute(operator: &dyn OperatorPort, config_toml: String, args: RunArgs) -> Result<()> {
    let request = RunRequest {
        config_toml,
        events_path: args
            .events
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned()),
        tick_secs: args.tick_secs,
    };

    if !output::is_quiet() && !output::is_json() {
        let mut startup = operator.check_config(&request.config_toml)?;
        if let Some(path) = &request.events_path {
            startup.events_path = Some(path.clone());
        }
        if let Some(tick_secs) = request.tick_secs {
            startup.tick_secs = tick_secs;
        }
        print_startup(&startup);
    }

    let summary = operator.run(request).await?;
    print_summary(&summary);
    Ok(())
}

fn print_startup(startup: &ConfigSummary) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Database", &startup.database);
    output::field("Proofs", &startup.proof_dir);
    output::field("Tick", format!("{}s", startup.tick_secs));
    output::field("Ledger", startup.events_path.as_deref().unwrap_or("(none)"));
    for warning in &startup.warnings {
        output::warning(warning);
    }
    output::note("Press Ctrl-C to stop");
}

fn print_summary(summary: &RunSummary) {
    if output::record("run_summary", summary) {
        return;
    }
    output::section("Stopped");
    output::field("Ticks", summary.ticks);
    output::field("Applied", summary.applied);
    output::field("Rejected", summary.rejected);
    output::field("Parked", summary.parked);
}
