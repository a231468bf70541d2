//! Command-line interface definitions.
//!
//! Defines the `linepool` CLI using `clap` derive: the long-running `run`
//! loop, administrative pool commands, entry and claim quotes, ledger
//! replay and configuration checks.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::pool::{PoolStatus, Side};

/// Over/under price-line prediction pool engine
#[derive(Parser, Debug)]
#[command(name = "linepool")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file [default: config.toml if present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler and ledger reconciler until Ctrl-C
    Run(RunArgs),

    /// Administer pools
    #[command(subcommand)]
    Pool(PoolCommand),

    /// Validate and price a prospective entry
    #[command(subcommand)]
    Entry(EntryCommand),

    /// Validate and price a claim
    #[command(subcommand)]
    Claim(ClaimCommand),

    /// Apply a JSON-lines file of confirmed ledger events
    Replay(ReplayArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `linepool run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON-lines ledger events to consume (overrides ledger.events_path)
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Seconds between scheduler ticks (overrides scheduler.tick_secs)
    #[arg(long)]
    pub tick_secs: Option<u64>,
}

/// Subcommands for `linepool pool`.
#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// Create a pool
    Create(PoolCreateArgs),
    /// Show one pool
    Show(PoolIdArg),
    /// List pools
    List(PoolListArgs),
    /// Open and locked pools with the most stake
    Top(PoolTopArgs),
    /// List pools due to lock or resolve now
    Due,
    /// Lock a pool ahead of its lock time
    Lock(PoolIdArg),
    /// Measure the final price and settle the pool
    Resolve(PoolIdArg),
    /// Void a pool; every entry is refunded in full
    Void(PoolVoidArgs),
    /// Recompute the hash of the published proof, or the AI commitment
    Verify(PoolVerifyArgs),
    /// Show recorded price samples
    Prices(PoolIdArg),
    /// Render the prediction curve
    Curve(PoolIdArg),
    /// Show what is owed, paid and left over for a settled pool
    Summary(PoolIdArg),
    /// Lift an integrity halt after manual review
    ClearHalt(PoolIdArg),
}

#[derive(Args, Debug)]
pub struct PoolIdArg {
    /// Pool id
    pub id: u64,
}

/// Arguments for `linepool pool create`.
#[derive(Args, Debug)]
pub struct PoolCreateArgs {
    /// Pool id, matching the ledger's pool id
    #[arg(long)]
    pub id: u64,

    /// Asset id (token mint) priced by the oracle
    #[arg(long)]
    pub asset: String,

    /// Display symbol
    #[arg(long)]
    pub symbol: String,

    /// Start time (RFC 3339)
    #[arg(long)]
    pub start: DateTime<Utc>,

    /// Lock time (RFC 3339)
    #[arg(long)]
    pub lock: DateTime<Utc>,

    /// End time (RFC 3339)
    #[arg(long)]
    pub end: DateTime<Utc>,

    /// Target line in basis points of price change; omitted means 0
    #[arg(long, allow_hyphen_values = true)]
    pub line_bps: Option<i64>,

    /// Model that produced the line
    #[arg(long, default_value = "manual")]
    pub model: String,

    /// Model confidence in basis points
    #[arg(long, default_value_t = 5_000)]
    pub confidence_bps: i64,

    /// Record this as the start price instead of waiting for a sample
    #[arg(long)]
    pub start_price: Option<Decimal>,
}

/// Arguments for `linepool pool list`.
#[derive(Args, Debug)]
pub struct PoolListArgs {
    /// Stored status [open, locked, resolved, void]
    #[arg(long)]
    pub status: Option<PoolStatus>,

    /// Asset id
    #[arg(long)]
    pub asset: Option<String>,

    /// Only open and locked pools
    #[arg(long)]
    pub active: bool,

    /// Order by total stake, largest first
    #[arg(long)]
    pub by_volume: bool,

    /// Maximum pools to list
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PoolTopArgs {
    /// Maximum pools to list
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct PoolVerifyArgs {
    /// Pool id
    pub id: u64,

    /// Check the AI commitment instead of the published proof
    #[arg(long)]
    pub commitment: bool,
}

#[derive(Args, Debug)]
pub struct PoolVoidArgs {
    /// Pool id
    pub id: u64,

    /// Reason recorded in the proof
    #[arg(long)]
    pub reason: String,
}

/// Subcommands for `linepool entry`.
#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    /// Quote the fee and net stake of an entry
    Quote(EntryQuoteArgs),
    /// Show a participant's confirmed entry
    Show(EntryShowArgs),
    /// List confirmed entries of a pool
    List(EntryListArgs),
}

#[derive(Args, Debug)]
pub struct EntryShowArgs {
    /// Pool id
    pub pool: u64,

    #[arg(long)]
    pub participant: String,
}

#[derive(Args, Debug)]
pub struct EntryListArgs {
    /// Pool id
    pub pool: u64,
}

#[derive(Args, Debug)]
pub struct EntryQuoteArgs {
    /// Pool id
    pub pool: u64,

    #[arg(long)]
    pub participant: String,

    /// over or under
    #[arg(long)]
    pub side: Side,

    /// Gross amount in base units
    #[arg(long)]
    pub amount: u64,
}

/// Subcommands for `linepool claim`.
#[derive(Subcommand, Debug)]
pub enum ClaimCommand {
    /// Compute the payout a participant may claim
    Quote(ClaimQuoteArgs),
}

#[derive(Args, Debug)]
pub struct ClaimQuoteArgs {
    /// Pool id
    pub pool: u64,

    #[arg(long)]
    pub participant: String,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// File of confirmed events, one JSON object per line
    pub file: PathBuf,
}

/// Subcommands for `linepool config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration and print the effective values
    Check,
}
