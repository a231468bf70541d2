//! SQLite pool store implementation.
//!
//! Timestamps are stored as fixed-width RFC 3339 text so that string order
//! matches time order, amounts as `BIGINT`, prices as decimal text.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::DatabaseErrorKind;
use rust_decimal::Decimal;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    EntryRow, NewPricePointRow, PoolRow, PricePointRow, ResolutionRow,
};
use crate::adapter::outbound::sqlite::database::schema::{entries, pools, price_points, resolutions};
use crate::domain::entry::{Entry, EntryKey};
use crate::domain::id::{AssetId, ParticipantId, PoolId};
use crate::domain::money::{Amount, Bps};
use crate::domain::pool::{AiCommitment, Pool, PoolStatus, ProofRef};
use crate::domain::price::PricePoint;
use crate::domain::proof::StagedResolution;
use crate::error::{Error, Result, SettlementError};
use crate::port::outbound::store::{PoolFilter, PoolStore};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed [`PoolStore`].
pub struct SqlitePoolStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqlitePoolStore {
    /// Create a store over a migrated connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check out a connection from the pool.
    fn conn(&self) -> Result<Conn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn pool_to_row(pool: &Pool) -> Result<PoolRow> {
        Ok(PoolRow {
            id: to_db(pool.id.value(), "pool id")?,
            asset: pool.asset.to_string(),
            symbol: pool.symbol.clone(),
            start_ts: fmt_ts(pool.start_ts),
            lock_ts: fmt_ts(pool.lock_ts),
            end_ts: fmt_ts(pool.end_ts),
            line_bps: pool.line_bps.map(Bps::value),
            total_over: to_db(pool.total_over.units(), "total_over")?,
            total_under: to_db(pool.total_under.units(), "total_under")?,
            status: pool.status.as_str().to_string(),
            locked_at: pool.locked_at.map(fmt_ts),
            winner: pool.winner.map(|w| w.as_str().to_string()),
            proof_hash: pool.proof.as_ref().map(|p| p.hash.clone()),
            proof_url: pool.proof.as_ref().and_then(|p| p.url.clone()),
            ai_model: pool.ai.model.clone(),
            ai_confidence_bps: pool.ai.confidence.value(),
            ai_commit: pool.ai.commit.clone(),
            void_reason: pool.void_reason.clone(),
            halted: pool.halted.clone(),
            version: to_db(pool.version, "version")?,
        })
    }

    fn pool_from_row(row: PoolRow) -> Result<Pool> {
        Ok(Pool {
            id: PoolId::new(from_db(row.id, "pool id")?),
            asset: AssetId::new(row.asset),
            symbol: row.symbol,
            start_ts: parse_ts(&row.start_ts)?,
            lock_ts: parse_ts(&row.lock_ts)?,
            end_ts: parse_ts(&row.end_ts)?,
            line_bps: row.line_bps.map(Bps::new),
            total_over: Amount::new(from_db(row.total_over, "total_over")?),
            total_under: Amount::new(from_db(row.total_under, "total_under")?),
            status: PoolStatus::from_str(&row.status).map_err(Error::Parse)?,
            locked_at: row.locked_at.as_deref().map(parse_ts).transpose()?,
            winner: row
                .winner
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(Error::Parse)?,
            proof: row.proof_hash.map(|hash| ProofRef::new(hash, row.proof_url)),
            ai: AiCommitment {
                model: row.ai_model,
                confidence: Bps::new(row.ai_confidence_bps),
                commit: row.ai_commit,
            },
            void_reason: row.void_reason,
            halted: row.halted,
            version: from_db(row.version, "version")?,
        })
    }

    fn entry_to_row(entry: &Entry) -> Result<EntryRow> {
        Ok(EntryRow {
            pool_id: to_db(entry.pool_id.value(), "pool id")?,
            participant: entry.participant.to_string(),
            side: entry.side.as_str().to_string(),
            amount: to_db(entry.amount.units(), "amount")?,
            fee: to_db(entry.fee.units(), "fee")?,
            claimed: entry.claimed,
            claim_payout: entry
                .claim_payout
                .map(|p| to_db(p.units(), "claim_payout"))
                .transpose()?,
            claimed_at: entry.claimed_at.map(fmt_ts),
            price_at_entry: entry.price_at_entry.map(|p| p.to_string()),
            line_at_entry: entry.line_at_entry.map(Bps::value),
            confirmed_at: fmt_ts(entry.confirmed_at),
            ledger_ref: entry.ledger_ref.clone(),
        })
    }

    fn entry_from_row(row: EntryRow) -> Result<Entry> {
        Ok(Entry {
            pool_id: PoolId::new(from_db(row.pool_id, "pool id")?),
            participant: ParticipantId::new(row.participant),
            side: row.side.parse().map_err(Error::Parse)?,
            amount: Amount::new(from_db(row.amount, "amount")?),
            fee: Amount::new(from_db(row.fee, "fee")?),
            claimed: row.claimed,
            claim_payout: row
                .claim_payout
                .map(|p| from_db(p, "claim_payout").map(Amount::new))
                .transpose()?,
            claimed_at: row.claimed_at.as_deref().map(parse_ts).transpose()?,
            price_at_entry: row.price_at_entry.as_deref().map(parse_price).transpose()?,
            line_at_entry: row.line_at_entry.map(Bps::new),
            confirmed_at: parse_ts(&row.confirmed_at)?,
            ledger_ref: row.ledger_ref,
        })
    }

    fn price_from_row(row: PricePointRow) -> Result<PricePoint> {
        Ok(PricePoint {
            pool_id: PoolId::new(from_db(row.pool_id, "pool id")?),
            ts: parse_ts(&row.ts)?,
            price: parse_price(&row.price)?,
            source: row.source,
        })
    }

    fn resolution_from_row(row: ResolutionRow) -> Result<StagedResolution> {
        Ok(StagedResolution {
            pool_id: PoolId::new(from_db(row.pool_id, "pool id")?),
            proof: serde_json::from_str(&row.proof_json)?,
            hash: row.hash,
            url: row.url,
            staged_at: parse_ts(&row.staged_at)?,
        })
    }

    /// Compare-and-swap write of a pool row inside the caller's transaction.
    fn write_pool(conn: &mut SqliteConnection, pool: &Pool) -> Result<Pool> {
        let mut row = Self::pool_to_row(pool)?;
        let expected = row.version;
        row.version = expected + 1;

        let updated = diesel::update(
            pools::table
                .filter(pools::id.eq(row.id))
                .filter(pools::version.eq(expected)),
        )
        .set(&row)
        .execute(conn)?;

        if updated == 0 {
            let exists: i64 = pools::table
                .filter(pools::id.eq(row.id))
                .count()
                .get_result(conn)?;
            return Err(if exists == 0 {
                SettlementError::PoolNotFound(pool.id).into()
            } else {
                Error::StaleWrite(pool.id)
            });
        }

        let mut saved = pool.clone();
        saved.version += 1;
        Ok(saved)
    }

    fn pools_from_rows(rows: Vec<PoolRow>) -> Result<Vec<Pool>> {
        rows.into_iter().map(Self::pool_from_row).collect()
    }
}

#[async_trait]
impl PoolStore for SqlitePoolStore {
    async fn insert_pool(&self, pool: &Pool) -> Result<()> {
        let row = Self::pool_to_row(pool)?;
        let mut conn = self.conn()?;
        match diesel::insert_into(pools::table).values(&row).execute(&mut conn) {
            Ok(_) => Ok(()),
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(SettlementError::AlreadyExists(pool.id).into())
            }
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    async fn pool(&self, id: PoolId) -> Result<Option<Pool>> {
        let mut conn = self.conn()?;
        let row: Option<PoolRow> = pools::table
            .find(to_db(id.value(), "pool id")?)
            .select(PoolRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(Self::pool_from_row).transpose()
    }

    async fn pools(&self, filter: &PoolFilter) -> Result<Vec<Pool>> {
        let mut conn = self.conn()?;
        let mut query = pools::table.select(PoolRow::as_select()).into_boxed();
        query = if filter.by_volume {
            query.order(((pools::total_over + pools::total_under).desc(), pools::id.asc()))
        } else {
            query.order(pools::id.asc())
        };
        if let Some(status) = filter.status {
            query = query.filter(pools::status.eq(status.as_str()));
        }
        if filter.active {
            query = query.filter(
                pools::status.eq_any(vec![PoolStatus::Open.as_str(), PoolStatus::Locked.as_str()]),
            );
        }
        if let Some(asset) = &filter.asset {
            query = query.filter(pools::asset.eq(asset.as_str()));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        Self::pools_from_rows(query.load(&mut conn)?)
    }

    async fn due_to_lock(&self, now: DateTime<Utc>) -> Result<Vec<Pool>> {
        let mut conn = self.conn()?;
        let rows = pools::table
            .select(PoolRow::as_select())
            .filter(pools::status.eq(PoolStatus::Open.as_str()))
            .filter(pools::lock_ts.le(fmt_ts(now)))
            .order(pools::lock_ts.asc())
            .load(&mut conn)?;
        Self::pools_from_rows(rows)
    }

    async fn due_to_resolve(&self, now: DateTime<Utc>) -> Result<Vec<Pool>> {
        let mut conn = self.conn()?;
        let rows = pools::table
            .select(PoolRow::as_select())
            .filter(pools::status.eq_any(vec![PoolStatus::Open.as_str(), PoolStatus::Locked.as_str()]))
            .filter(pools::end_ts.le(fmt_ts(now)))
            .order(pools::end_ts.asc())
            .load(&mut conn)?;
        Self::pools_from_rows(rows)
    }

    async fn save_pool(&self, pool: &Pool) -> Result<Pool> {
        let mut conn = self.conn()?;
        conn.transaction::<_, Error, _>(|conn| Self::write_pool(conn, pool))
    }

    async fn entry(&self, key: &EntryKey) -> Result<Option<Entry>> {
        let mut conn = self.conn()?;
        let row: Option<EntryRow> = entries::table
            .find((to_db(key.pool_id.value(), "pool id")?, key.participant.as_str()))
            .select(EntryRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(Self::entry_from_row).transpose()
    }

    async fn entries(&self, pool_id: PoolId) -> Result<Vec<Entry>> {
        let mut conn = self.conn()?;
        let rows: Vec<EntryRow> = entries::table
            .filter(entries::pool_id.eq(to_db(pool_id.value(), "pool id")?))
            .select(EntryRow::as_select())
            .order(entries::participant.asc())
            .load(&mut conn)?;
        rows.into_iter().map(Self::entry_from_row).collect()
    }

    async fn apply_entry(&self, entry: &Entry, pool: &Pool) -> Result<Pool> {
        let row = Self::entry_to_row(entry)?;
        let mut conn = self.conn()?;
        conn.transaction::<_, Error, _>(|conn| {
            let saved = Self::write_pool(conn, pool)?;
            diesel::replace_into(entries::table)
                .values(&row)
                .execute(conn)?;
            Ok(saved)
        })
    }

    async fn mark_claimed(
        &self,
        key: &EntryKey,
        payout: Amount,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            entries::table
                .filter(entries::pool_id.eq(to_db(key.pool_id.value(), "pool id")?))
                .filter(entries::participant.eq(key.participant.as_str()))
                .filter(entries::claimed.eq(false)),
        )
        .set((
            entries::claimed.eq(true),
            entries::claim_payout.eq(Some(to_db(payout.units(), "payout")?)),
            entries::claimed_at.eq(Some(fmt_ts(at))),
        ))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }

    async fn record_price(&self, point: &PricePoint) -> Result<()> {
        let row = NewPricePointRow {
            pool_id: to_db(point.pool_id.value(), "pool id")?,
            ts: fmt_ts(point.ts),
            price: point.price.to_string(),
            source: point.source.clone(),
        };
        let mut conn = self.conn()?;
        diesel::insert_into(price_points::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn price_history(&self, pool_id: PoolId) -> Result<Vec<PricePoint>> {
        let mut conn = self.conn()?;
        let rows: Vec<PricePointRow> = price_points::table
            .filter(price_points::pool_id.eq(to_db(pool_id.value(), "pool id")?))
            .select(PricePointRow::as_select())
            .order((price_points::ts.asc(), price_points::id.asc()))
            .load(&mut conn)?;
        rows.into_iter().map(Self::price_from_row).collect()
    }

    async fn stage_resolution(&self, staged: &StagedResolution) -> Result<()> {
        let row = ResolutionRow {
            pool_id: to_db(staged.pool_id.value(), "pool id")?,
            hash: staged.hash.clone(),
            url: staged.url.clone(),
            proof_json: serde_json::to_string(&staged.proof)?,
            staged_at: fmt_ts(staged.staged_at),
        };
        let mut conn = self.conn()?;
        diesel::insert_or_ignore_into(resolutions::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn staged_resolutions(&self, pool_id: PoolId) -> Result<Vec<StagedResolution>> {
        let mut conn = self.conn()?;
        let rows: Vec<ResolutionRow> = resolutions::table
            .filter(resolutions::pool_id.eq(to_db(pool_id.value(), "pool id")?))
            .select(ResolutionRow::as_select())
            .order(resolutions::staged_at.asc())
            .load(&mut conn)?;
        rows.into_iter().map(Self::resolution_from_row).collect()
    }
}

fn fmt_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

fn parse_price(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::Parse(format!("invalid price '{s}': {e}")))
}

fn to_db(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::Parse(format!("{field} {value} exceeds storage range")))
}

fn from_db(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::Parse(format!("negative {field} {value} in storage")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::pool::{NewPool, Side, Winner};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn store() -> SqlitePoolStore {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        SqlitePoolStore::new(pool)
    }

    fn new_pool(id: u64) -> Pool {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Pool::create(NewPool {
            id: PoolId::new(id),
            asset: AssetId::new("mint"),
            symbol: "BONK".into(),
            start_ts: start,
            lock_ts: start + Duration::minutes(30),
            end_ts: start + Duration::hours(1),
            line_bps: Some(300),
            model: "m".into(),
            confidence_bps: 7_200,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn pool_round_trips_through_storage() {
        let store = store();
        let mut pool = new_pool(1);
        pool.proof = Some(ProofRef::new("0xab", None));
        pool.winner = Some(Winner::Void);
        store.insert_pool(&pool).await.unwrap();
        assert_eq!(store.pool(PoolId::new(1)).await.unwrap(), Some(pool));
    }

    #[tokio::test]
    async fn duplicate_insert_is_already_exists() {
        let store = store();
        store.insert_pool(&new_pool(1)).await.unwrap();
        let err = store.insert_pool(&new_pool(1)).await.unwrap_err();
        assert!(matches!(err, Error::Settlement(SettlementError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = store();
        let pool = new_pool(1);
        store.insert_pool(&pool).await.unwrap();
        let saved = store.save_pool(&pool).await.unwrap();
        assert_eq!(saved.version, 1);
        let err = store.save_pool(&pool).await.unwrap_err();
        assert!(matches!(err, Error::StaleWrite(_)));
    }

    #[tokio::test]
    async fn due_queries_compare_times() {
        let store = store();
        let pool = new_pool(1);
        store.insert_pool(&pool).await.unwrap();
        let before = pool.lock_ts - Duration::microseconds(1);
        assert!(store.due_to_lock(before).await.unwrap().is_empty());
        assert_eq!(store.due_to_lock(pool.lock_ts).await.unwrap().len(), 1);
        assert!(store.due_to_resolve(pool.lock_ts).await.unwrap().is_empty());
        assert_eq!(store.due_to_resolve(pool.end_ts).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn apply_entry_and_claim_once() {
        let store = store();
        let mut pool = new_pool(1);
        store.insert_pool(&pool).await.unwrap();
        let entry = Entry {
            pool_id: pool.id,
            participant: ParticipantId::new("alice"),
            side: Side::Over,
            amount: Amount::new(5_000_000_000),
            fee: Amount::new(37_500_000),
            claimed: false,
            claim_payout: None,
            claimed_at: None,
            price_at_entry: Some(dec!(0.000021)),
            line_at_entry: pool.line_bps,
            confirmed_at: pool.start_ts,
            ledger_ref: Some("sig".into()),
        };
        pool.credit(Side::Over, entry.net().unwrap()).unwrap();
        let saved = store.apply_entry(&entry, &pool).await.unwrap();
        assert_eq!(saved.total_over, Amount::new(4_962_500_000));

        let key = entry.key();
        assert_eq!(store.entry(&key).await.unwrap(), Some(entry));
        let at = pool.end_ts;
        assert!(store.mark_claimed(&key, Amount::new(1), at).await.unwrap());
        assert!(!store.mark_claimed(&key, Amount::new(1), at).await.unwrap());
        assert!(store.entry(&key).await.unwrap().unwrap().claimed);
    }

    #[tokio::test]
    async fn price_history_is_oldest_first() {
        let store = store();
        let pool = new_pool(1);
        store.insert_pool(&pool).await.unwrap();
        for (offset, price) in [(10, dec!(2)), (0, dec!(1))] {
            store
                .record_price(&PricePoint {
                    pool_id: pool.id,
                    ts: pool.start_ts + Duration::seconds(offset),
                    price,
                    source: "test".into(),
                })
                .await
                .unwrap();
        }
        let history = store.price_history(pool.id).await.unwrap();
        assert_eq!(history[0].price, dec!(1));
        assert_eq!(history[1].price, dec!(2));
    }

    #[tokio::test]
    async fn volume_order_breaks_ties_by_id() {
        let store = store();
        for (id, over, under) in [(1, 10, 0), (2, 5, 30), (3, 0, 10), (4, 40, 0)] {
            let mut pool = new_pool(id);
            pool.total_over = Amount::new(over);
            pool.total_under = Amount::new(under);
            if id == 4 {
                pool.status = PoolStatus::Void;
            }
            store.insert_pool(&pool).await.unwrap();
        }
        let filter = PoolFilter {
            active: true,
            by_volume: true,
            ..PoolFilter::default()
        };
        let ids: Vec<u64> = store
            .pools(&filter)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id.value())
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
