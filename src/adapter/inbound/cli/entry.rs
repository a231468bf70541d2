//! Handlers for the `entry` command group.

use tabled::Tabled;

use crate::adapter::inbound::cli::command::EntryCommand;
use crate::adapter::inbound::cli::{output, quote};
use crate::domain::entry::Entry;
use crate::domain::id::{ParticipantId, PoolId};
use crate::error::Result;
use crate::port::inbound::pools::PoolApi;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Participant")]
    participant: String,
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Amount")]
    amount: u64,
    #[tabled(rename = "Fee")]
    fee: u64,
    #[tabled(rename = "Claimed")]
    claimed: String,
    #[tabled(rename = "Confirmed")]
    confirmed: String,
}

impl From<&Entry> for EntryRow {
    fn from(entry: &Entry) -> Self {
        Self {
            participant: entry.participant.to_string(),
            side: entry.side.to_string(),
            amount: entry.amount.units(),
            fee: entry.fee.units(),
            claimed: entry
                .claim_payout
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            confirmed: entry.confirmed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Execute an `entry` subcommand.
pub async fn execute(pools: &dyn PoolApi, command: EntryCommand) -> Result<()> {
    match command {
        EntryCommand::Quote(args) => quote::execute_entry(pools, args).await,
        EntryCommand::Show(args) => {
            let entry = pools
                .get_entry(PoolId::new(args.pool), ParticipantId::new(args.participant))
                .await?;
            print_entry(&entry);
            Ok(())
        }
        EntryCommand::List(args) => {
            let entries = pools.list_entries(PoolId::new(args.pool)).await?;
            if output::record("entries", &entries) {
                return Ok(());
            }
            if entries.is_empty() {
                output::note("(none)");
                return Ok(());
            }
            output::table(entries.iter().map(EntryRow::from));
            Ok(())
        }
    }
}

fn print_entry(entry: &Entry) {
    if output::record("entry", entry) {
        return;
    }
    output::field("Pool", entry.pool_id);
    output::field("Participant", &entry.participant);
    output::field("Side", entry.side);
    output::field("Amount", entry.amount);
    output::field("Fee", entry.fee);
    output::field("Confirmed", entry.confirmed_at.to_rfc3339());
    if let Some(price) = entry.price_at_entry {
        output::field("Price at entry", price);
    }
    if let Some(line) = entry.line_at_entry {
        output::field("Line at entry", format!("{line}bps"));
    }
    match (entry.claim_payout, entry.claimed_at) {
        (Some(payout), Some(at)) => {
            output::field("Claimed", format!("{payout} at {}", at.to_rfc3339()));
        }
        _ => output::field("Claimed", "no"),
    }
    if let Some(reference) = &entry.ledger_ref {
        output::field("Ledger ref", output::muted(reference));
    }
}
