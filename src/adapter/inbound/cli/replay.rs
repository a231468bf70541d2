//! Handler for the `replay` command.

use crate::adapter::inbound::cli::command::ReplayArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::port::inbound::operator::OperatorPort;

/// Apply every event in the file once, then report the totals.
pub async fn execute(operator: &dyn OperatorPort, config_toml: &str, args: ReplayArgs) -> Result<()> {
    let path = args.file.to_string_lossy();
    let summary = operator.replay(config_toml, &path).await?;

    if output::record("replay_summary", &summary) {
        return Ok(());
    }
    output::success(&format!(
        "Replayed {} lines from {path}",
        summary.lines.unwrap_or_default()
    ));
    output::field("Applied", summary.applied);
    output::field("Duplicates", summary.duplicates);
    output::field("Rejected", summary.rejected);
    output::field("Parked", summary.parked);
    if summary.parked > 0 {
        output::hint("parked events wait for their pool or an earlier event to arrive");
    }
    Ok(())
}
