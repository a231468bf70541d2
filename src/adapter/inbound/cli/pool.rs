//! Handlers for the `pool` command group.

use rust_decimal::Decimal;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{
    PoolCommand, PoolCreateArgs, PoolListArgs, PoolVerifyArgs,
};
use crate::adapter::inbound::cli::output;
use crate::domain::error::DomainError;
use crate::domain::id::{AssetId, PoolId};
use crate::domain::pool::NewPool;
use crate::error::{IntegrityError, Result};
use crate::port::inbound::pools::{PoolApi, PoolView, SettledPool};
use crate::port::outbound::store::PoolFilter;

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Over")]
    over: u64,
    #[tabled(rename = "Under")]
    under: u64,
    #[tabled(rename = "Winner")]
    winner: String,
    #[tabled(rename = "Ends")]
    ends: String,
}

impl From<&PoolView> for PoolRow {
    fn from(view: &PoolView) -> Self {
        let pool = &view.pool;
        let status = if pool.is_halted() {
            format!("{} (halted)", view.effective_status)
        } else {
            view.effective_status.to_string()
        };
        Self {
            id: pool.id.value(),
            symbol: pool.symbol.clone(),
            status,
            line: format!("{}bps", pool.line()),
            over: pool.total_over.units(),
            under: pool.total_under.units(),
            winner: pool.winner.map_or_else(|| "-".to_string(), |w| w.to_string()),
            ends: pool.end_ts.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute a `pool` subcommand.
pub async fn execute(pools: &dyn PoolApi, command: PoolCommand) -> Result<()> {
    match command {
        PoolCommand::Create(args) => create(pools, args).await,
        PoolCommand::Show(arg) => {
            let view = pools.get_pool(PoolId::new(arg.id)).await?;
            print_pool(&view);
            Ok(())
        }
        PoolCommand::List(args) => list(pools, args).await,
        PoolCommand::Top(args) => {
            let top = pools.top_pools(args.limit).await?;
            print_pools(&top);
            Ok(())
        }
        PoolCommand::Due => due(pools).await,
        PoolCommand::Lock(arg) => {
            let view = pools.lock_pool(PoolId::new(arg.id)).await?;
            output::success(&format!("Pool {} locked", arg.id));
            print_pool(&view);
            Ok(())
        }
        PoolCommand::Resolve(arg) => {
            let settled = pools.resolve_pool(PoolId::new(arg.id)).await?;
            print_settled(&settled);
            Ok(())
        }
        PoolCommand::Void(args) => {
            let settled = pools.void_pool(PoolId::new(args.id), &args.reason).await?;
            print_settled(&settled);
            Ok(())
        }
        PoolCommand::Verify(args) => verify(pools, args).await,
        PoolCommand::Prices(arg) => prices(pools, arg.id).await,
        PoolCommand::Curve(arg) => curve(pools, arg.id).await,
        PoolCommand::Summary(arg) => summary(pools, arg.id).await,
        PoolCommand::ClearHalt(arg) => {
            let view = pools.clear_halt(PoolId::new(arg.id)).await?;
            output::success(&format!("Halt cleared on pool {}", arg.id));
            print_pool(&view);
            Ok(())
        }
    }
}

async fn create(pools: &dyn PoolApi, args: PoolCreateArgs) -> Result<()> {
    let pool_id = PoolId::new(args.id);
    if let Some(price) = args.start_price {
        if price <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(price.to_string()).into());
        }
    }

    let pool = pools
        .create_pool(NewPool {
            id: pool_id,
            asset: AssetId::new(args.asset),
            symbol: args.symbol,
            start_ts: args.start,
            lock_ts: args.lock,
            end_ts: args.end,
            line_bps: args.line_bps,
            model: args.model,
            confidence_bps: args.confidence_bps,
        })
        .await?;

    if let Some(price) = args.start_price {
        pools.record_start_price(pool_id, price).await?;
    }

    output::success(&format!("Pool {} created", pool.id));
    let view = pools.get_pool(pool_id).await?;
    print_pool(&view);
    Ok(())
}

async fn list(pools: &dyn PoolApi, args: PoolListArgs) -> Result<()> {
    let filter = PoolFilter {
        status: args.status,
        active: args.active,
        asset: args.asset.map(AssetId::new),
        by_volume: args.by_volume,
        limit: args.limit,
    };
    let pools = pools.list_pools(&filter).await?;
    print_pools(&pools);
    Ok(())
}

async fn due(pools: &dyn PoolApi) -> Result<()> {
    let to_lock = pools.list_pools_due_to_lock().await?;
    let to_resolve = pools.list_pools_due_to_resolve().await?;

    if output::is_json() {
        let ids = |views: &[PoolView]| views.iter().map(|v| v.pool.id).collect::<Vec<_>>();
        output::record(
            "due",
            &serde_json::json!({
                "lock": ids(&to_lock),
                "resolve": ids(&to_resolve),
            }),
        );
        return Ok(());
    }

    output::section("Due to lock");
    print_pools(&to_lock);
    output::section("Due to resolve");
    print_pools(&to_resolve);
    Ok(())
}

async fn verify(pools: &dyn PoolApi, args: PoolVerifyArgs) -> Result<()> {
    let pool_id = PoolId::new(args.id);
    if args.commitment {
        return verify_commitment(pools, pool_id).await;
    }
    let check = pools.verify_proof(pool_id).await?;
    if !output::record("proof_check", &check) {
        output::field("Proof URL", &check.url);
        output::field("Expected", &check.expected_hash);
        output::field("Actual", &check.actual_hash);
    }
    if !check.valid {
        return Err(IntegrityError::ProofMismatch { pool_id }.into());
    }
    output::success("Proof matches its hash");
    Ok(())
}

async fn verify_commitment(pools: &dyn PoolApi, pool_id: PoolId) -> Result<()> {
    let check = pools.verify_commitment(pool_id).await?;
    if !output::record("commitment_check", &check) {
        output::field("Stored", &check.stored_commit);
        output::field("Actual", &check.actual_commit);
    }
    if !check.valid {
        return Err(IntegrityError::CommitmentMismatch { pool_id }.into());
    }
    output::success("Pool matches its AI commitment");
    Ok(())
}

async fn prices(pools: &dyn PoolApi, id: u64) -> Result<()> {
    #[derive(Tabled)]
    struct PriceRow {
        #[tabled(rename = "Time")]
        ts: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let history = pools.price_history(PoolId::new(id)).await?;
    if output::record("prices", &history) {
        return Ok(());
    }
    if history.is_empty() {
        output::note("(no samples)");
        return Ok(());
    }
    output::table(history.iter().map(|p| PriceRow {
        ts: p.ts.to_rfc3339(),
        price: p.price.to_string(),
        source: p.source.clone(),
    }));
    Ok(())
}

async fn curve(pools: &dyn PoolApi, id: u64) -> Result<()> {
    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "Time")]
        ts: String,
        #[tabled(rename = "Price")]
        price: String,
    }

    let curve = pools.prediction_curve(PoolId::new(id)).await?;
    if output::record("curve", &curve) {
        return Ok(());
    }

    output::field("Bias", format!("{:+.3}", curve.bias));
    output::field("Target", format!("{:.10}", curve.target));
    output::field("Neutral", curve.neutral);
    output::field("Commitment", output::muted(&curve.commitment));
    output::table(curve.points.iter().map(|p| PointRow {
        ts: p.ts.format("%H:%M:%S").to_string(),
        price: format!("{:.10}", p.price),
    }));
    Ok(())
}

async fn summary(pools: &dyn PoolApi, id: u64) -> Result<()> {
    let summary = pools.settlement_summary(PoolId::new(id)).await?;
    if output::record("summary", &summary) {
        return Ok(());
    }
    output::field("Distributable", summary.distributable);
    output::field("Payable", summary.payable);
    output::field("Claimable", summary.claimable);
    output::field("Claimed", summary.claimed);
    output::field("Residual", summary.residual);
    output::field("Winners", summary.winners);
    output::field("Losers", summary.losers);
    Ok(())
}

fn print_pools(pools: &[PoolView]) {
    if output::record("pools", &pools) {
        return;
    }
    if pools.is_empty() {
        output::note("(none)");
        return;
    }
    output::table(pools.iter().map(PoolRow::from));
}

fn print_pool(view: &PoolView) {
    if output::record("pool", view) {
        return;
    }
    let pool = &view.pool;
    output::field("Pool", pool.id);
    output::field("Asset", format!("{} ({})", pool.symbol, pool.asset));
    output::field("Status", output::status(view.effective_status));
    if view.effective_status != pool.status {
        output::field("Stored status", pool.status);
    }
    output::field("Start", pool.start_ts.to_rfc3339());
    output::field("Lock", pool.lock_ts.to_rfc3339());
    output::field("End", pool.end_ts.to_rfc3339());
    output::field("Line", format!("{}bps", pool.line()));
    output::field("Over", pool.total_over);
    output::field("Under", pool.total_under);
    if let Some(winner) = pool.winner {
        output::field("Winner", output::status(winner));
    }
    if let Some(proof) = &pool.proof {
        output::field("Proof hash", &proof.hash);
        if let Some(url) = &proof.url {
            output::field("Proof URL", url);
        }
    }
    if let Some(reason) = &pool.void_reason {
        output::field("Void reason", reason);
    }
    output::field(
        "AI",
        format!("{} @ {}bps", pool.ai.model, pool.ai.confidence),
    );
    output::field("Commitment", output::muted(&pool.ai.commit));
    if let Some(halted) = &pool.halted {
        output::warning(&format!("Halted: {halted}"));
        output::hint(&format!("linepool pool clear-halt {} after review", pool.id));
    }
}

fn print_settled(settled: &SettledPool) {
    if output::record("settled", settled) {
        return;
    }
    if settled.changed {
        output::success(&format!(
            "Pool {} settled as {}",
            settled.pool_id,
            output::status(settled.winner)
        ));
    } else {
        output::note(&format!(
            "Pool {} was already settled as {}",
            settled.pool_id, settled.winner
        ));
    }
    output::field("Proof hash", &settled.proof.hash);
    if let Some(url) = &settled.proof.url {
        output::field("Proof URL", url);
    }
}
