//! Handlers for `entry quote` and `claim quote`.

use crate::adapter::inbound::cli::command::{ClaimQuoteArgs, EntryQuoteArgs};
use crate::adapter::inbound::cli::output;
use crate::domain::id::{ParticipantId, PoolId};
use crate::domain::money::Amount;
use crate::domain::settlement::PayoutKind;
use crate::error::Result;
use crate::port::inbound::pools::{EntryRequest, PoolApi};

pub async fn execute_entry(pools: &dyn PoolApi, args: EntryQuoteArgs) -> Result<()> {
    let quote = pools
        .submit_entry(EntryRequest {
            pool_id: PoolId::new(args.pool),
            participant: ParticipantId::new(args.participant),
            side: args.side,
            amount: Amount::new(args.amount),
        })
        .await?;

    if output::record("entry_quote", &quote) {
        return Ok(());
    }
    output::success(&format!(
        "Entry accepted on {} in pool {}",
        quote.side, quote.pool_id
    ));
    output::field("Amount", quote.fee.amount);
    output::field("Fee", quote.fee.fee);
    output::field("Net stake", quote.fee.net);
    if quote.top_up {
        output::note("Adds to the participant's existing entry");
    }
    Ok(())
}

pub async fn execute_claim(pools: &dyn PoolApi, args: ClaimQuoteArgs) -> Result<()> {
    let quote = pools
        .request_claim(PoolId::new(args.pool), ParticipantId::new(args.participant))
        .await?;

    if output::record("claim_quote", &quote) {
        return Ok(());
    }
    let kind = match quote.payout.kind {
        PayoutKind::Winnings => "winnings",
        PayoutKind::Refund => "refund",
    };
    output::success(&format!(
        "{} may claim {} ({kind}) from pool {}",
        quote.participant, quote.payout.amount, quote.pool_id
    ));
    Ok(())
}
