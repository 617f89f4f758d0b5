//! Persistence for ticker snapshots
//!
//! Point read by symbol plus one atomic insert-or-update keyed on the unique
//! symbol column. `SeaOrmTickerStore` is the PostgreSQL implementation;
//! `MemoryTickerStore` keeps rows in process and is used by tests and local
//! tooling.

use async_trait::async_trait;
use parking_lot::Mutex;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::entities::{prelude::Tickers, tickers};
use crate::services::snapshot_mapping::SnapshotUpdate;

#[async_trait]
pub trait TickerStore: Send + Sync {
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<tickers::Model>, DbErr>;

    /// Insert the snapshot, or overwrite every mapped field of the existing
    /// row for the same symbol. Returns the row as persisted.
    async fn upsert(&self, update: SnapshotUpdate) -> Result<tickers::Model, DbErr>;
}

/// Columns rewritten when the symbol already exists
const UPSERT_COLUMNS: [tickers::Column; 27] = [
    tickers::Column::Name,
    tickers::Column::Exchange,
    tickers::Column::Currency,
    tickers::Column::MarketCap,
    tickers::Column::Sector,
    tickers::Column::Industry,
    tickers::Column::FullTimeEmployees,
    tickers::Column::Website,
    tickers::Column::LongBusinessSummary,
    tickers::Column::CurrentPrice,
    tickers::Column::PreviousClose,
    tickers::Column::OpenPrice,
    tickers::Column::DayHigh,
    tickers::Column::DayLow,
    tickers::Column::Volume,
    tickers::Column::AvgVolume,
    tickers::Column::FiftyTwoWeekHigh,
    tickers::Column::FiftyTwoWeekLow,
    tickers::Column::TrailingPe,
    tickers::Column::ForwardPe,
    tickers::Column::EpsTtm,
    tickers::Column::PriceToBook,
    tickers::Column::Beta,
    tickers::Column::DividendRate,
    tickers::Column::DividendYield,
    tickers::Column::RawInfo,
    tickers::Column::UpdatedAt,
];

#[derive(Clone)]
pub struct SeaOrmTickerStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTickerStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TickerStore for SeaOrmTickerStore {
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<tickers::Model>, DbErr> {
        Tickers::find()
            .filter(tickers::Column::Symbol.eq(symbol))
            .one(self.db.as_ref())
            .await
    }

    async fn upsert(&self, update: SnapshotUpdate) -> Result<tickers::Model, DbErr> {
        let symbol = update.symbol.clone();

        // last_fetched_at only moves forward, even if a slower writer lands last
        let on_conflict = OnConflict::column(tickers::Column::Symbol)
            .update_columns(UPSERT_COLUMNS)
            .value(
                tickers::Column::LastFetchedAt,
                Expr::cust("GREATEST(tickers.last_fetched_at, EXCLUDED.last_fetched_at)"),
            )
            .to_owned();

        let row = Tickers::insert(update.into_active_model())
            .on_conflict(on_conflict)
            .exec_with_returning(self.db.as_ref())
            .await?;

        tracing::debug!(symbol = %symbol, id = row.id, "Upserted ticker snapshot");
        Ok(row)
    }
}

#[derive(Default)]
struct MemoryRows {
    rows: HashMap<String, tickers::Model>,
    next_id: i32,
}

/// Process-local store with the same upsert semantics as the database
#[derive(Clone, Default)]
pub struct MemoryTickerStore {
    inner: Arc<Mutex<MemoryRows>>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryTickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a row in place as-is (ids are reassigned to stay unique)
    pub fn seed(&self, mut row: tickers::Model) -> tickers::Model {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        row.id = inner.next_id;
        inner.rows.insert(row.symbol.clone(), row.clone());
        row
    }

    pub fn get(&self, symbol: &str) -> Option<tickers::Model> {
        self.inner.lock().rows.get(symbol).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of upserts applied so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DbErr> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DbErr::Conn(sea_orm::RuntimeErr::Internal(
                "connection refused".to_string(),
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TickerStore for MemoryTickerStore {
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<tickers::Model>, DbErr> {
        self.check_available()?;
        Ok(self.get(symbol))
    }

    async fn upsert(&self, update: SnapshotUpdate) -> Result<tickers::Model, DbErr> {
        self.check_available()?;

        let mut inner = self.inner.lock();
        let existing = inner.rows.get(&update.symbol).cloned();
        let next_id = inner.next_id + 1;
        let row = update.apply_to(existing.clone(), next_id);
        if existing.is_none() {
            inner.next_id = next_id;
        }
        inner.rows.insert(row.symbol.clone(), row.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn update(symbol: &str, price: f64, at: chrono::DateTime<Utc>) -> SnapshotUpdate {
        let payload = match json!({"longName": "Test Corp", "regularMarketPrice": price}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        SnapshotUpdate::from_payload(symbol, payload, at)
    }

    #[tokio::test]
    async fn test_memory_upsert_inserts_then_overwrites() {
        let store = MemoryTickerStore::new();
        let t0 = Utc::now();

        let first = store.upsert(update("AAPL", 100.0, t0)).await.unwrap();
        let second = store
            .upsert(update("AAPL", 101.5, t0 + Duration::minutes(6)))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.current_price, Some(dec!(101.5)));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_fetched_at > first.last_fetched_at);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_memory_upsert_idempotent() {
        let store = MemoryTickerStore::new();
        let t0 = Utc::now();

        let a = store.upsert(update("MSFT", 420.0, t0)).await.unwrap();
        let b = store
            .upsert(update("MSFT", 420.0, t0 + Duration::seconds(1)))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(a.name, b.name);
        assert_eq!(a.current_price, b.current_price);
        assert_eq!(a.raw_info, b.raw_info);
        assert!(b.updated_at >= a.updated_at);
    }

    #[tokio::test]
    async fn test_memory_store_unavailable() {
        let store = MemoryTickerStore::new();
        store.set_unavailable(true);

        assert!(store.find_by_symbol("AAPL").await.is_err());
        assert!(store.upsert(update("AAPL", 1.0, Utc::now())).await.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_columns_exclude_identity_and_creation() {
        use sea_orm::IdenStatic;

        let names: Vec<&str> = UPSERT_COLUMNS.iter().map(|c| c.as_str()).collect();
        for excluded in ["id", "symbol", "created_at", "last_fetched_at"] {
            assert!(!names.contains(&excluded), "{} must not be overwritten", excluded);
        }
        assert!(names.contains(&"raw_info"));
        assert!(names.contains(&"updated_at"));
    }

    #[tokio::test]
    async fn test_sea_orm_upsert_single_statement() {
        use sea_orm::{DatabaseBackend, MockDatabase};

        let at = Utc::now();
        let persisted = MemoryTickerStore::new()
            .upsert(update("AAPL", 189.84, at))
            .await
            .unwrap();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![persisted.clone()]])
                .into_connection(),
        );
        let store = SeaOrmTickerStore::new(db.clone());

        let row = store.upsert(update("AAPL", 189.84, at)).await.unwrap();
        assert_eq!(row.symbol, "AAPL");
        assert_eq!(row.current_price, persisted.current_price);
        drop(store);

        let log = Arc::try_unwrap(db)
            .ok()
            .expect("store dropped")
            .into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with(r#"INSERT INTO "tickers""#), "{}", sql);
        assert!(sql.contains(r#"ON CONFLICT ("symbol") DO UPDATE"#), "{}", sql);
        assert!(
            sql.contains("GREATEST(tickers.last_fetched_at, EXCLUDED.last_fetched_at)"),
            "{}",
            sql
        );
        assert!(sql.contains("RETURNING"), "{}", sql);

        let start = sql.find("DO UPDATE SET").unwrap();
        let end = sql.find("RETURNING").unwrap();
        let set_list = &sql[start..end];
        assert!(!set_list.contains(r#""created_at""#), "{}", set_list);
        assert!(!set_list.contains(r#""symbol""#), "{}", set_list);
        assert!(!set_list.contains(r#""id""#), "{}", set_list);
        assert!(set_list.contains(r#""raw_info""#), "{}", set_list);
        assert!(set_list.contains(r#""updated_at""#), "{}", set_list);
    }
}
