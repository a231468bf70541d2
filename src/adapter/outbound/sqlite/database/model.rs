//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{entries, pools, price_points, resolutions};

/// Database row for a pool.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = pools)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PoolRow {
    pub id: i64,
    pub asset: String,
    pub symbol: String,
    pub start_ts: String,
    pub lock_ts: String,
    pub end_ts: String,
    pub line_bps: Option<i64>,
    pub total_over: i64,
    pub total_under: i64,
    pub status: String,
    pub locked_at: Option<String>,
    pub winner: Option<String>,
    pub proof_hash: Option<String>,
    pub proof_url: Option<String>,
    pub ai_model: String,
    pub ai_confidence_bps: i64,
    pub ai_commit: String,
    pub void_reason: Option<String>,
    pub halted: Option<String>,
    pub version: i64,
}

/// Database row for an entry.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntryRow {
    pub pool_id: i64,
    pub participant: String,
    pub side: String,
    pub amount: i64,
    pub fee: i64,
    pub claimed: bool,
    pub claim_payout: Option<i64>,
    pub claimed_at: Option<String>,
    pub price_at_entry: Option<String>,
    pub line_at_entry: Option<i64>,
    pub confirmed_at: String,
    pub ledger_ref: Option<String>,
}

/// Database row for a price point (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = price_points)]
pub struct NewPricePointRow {
    pub pool_id: i64,
    pub ts: String,
    pub price: String,
    pub source: String,
}

/// Database row for a price point (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = price_points)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PricePointRow {
    pub id: Option<i32>,
    pub pool_id: i64,
    pub ts: String,
    pub price: String,
    pub source: String,
}

/// Database row for a staged resolution.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = resolutions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResolutionRow {
    pub pool_id: i64,
    pub hash: String,
    pub url: String,
    pub proof_json: String,
    pub staged_at: String,
}
