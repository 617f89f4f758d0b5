#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use marketdesk_backend::{
    auth::AuthSecret,
    build_router,
    config::TickerCacheConfig,
    entities::tickers,
    services::{
        market_data::{DailyBar, MarketDataProvider, NewsItem, RawPayload, UpstreamError},
        ticker_cache::TickerCacheService,
        ticker_store::MemoryTickerStore,
    },
    AppState,
};
use axum::Router;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::json;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Set up test database connection
/// Uses TEST_DATABASE_URL environment variable or falls back to default
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("TEST_DATABASE_URL").unwrap_or_else(|_| {
        "postgresql://marketdesk_user@localhost:5432/marketdesk_test".to_string()
    });

    Database::connect(&database_url).await
}

pub fn mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Healthy,
    Unknown,
    Down,
}

/// Provider answering from canned data
pub struct FakeProvider {
    pub upstream: Upstream,
    pub bars: usize,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(upstream: Upstream) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            bars: 60,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_bars(upstream: Upstream, bars: usize) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            bars,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, symbol: &str) -> Result<(), UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.upstream {
            Upstream::Healthy => Ok(()),
            Upstream::Unknown => Err(UpstreamError::NotFound(symbol.to_string())),
            Upstream::Down => Err(UpstreamError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<RawPayload, UpstreamError> {
        self.check(symbol)?;
        match json!({
            "longName": "Apple Inc.",
            "exchange": "NMS",
            "currency": "USD",
            "marketCap": 2_950_000_000_000_i64,
            "regularMarketPrice": 189.84,
            "trailingPE": 29.5,
            "sector": "Technology",
        }) {
            serde_json::Value::Object(map) => Ok(map),
            _ => unreachable!(),
        }
    }

    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, UpstreamError> {
        self.check(symbol)?;
        Ok((0..limit + 5)
            .map(|i| NewsItem {
                title: format!("{} headline {}", symbol, i),
                publisher: Some("Newswire".to_string()),
                link: Some(format!("https://news.example.com/{}", i)),
                published_at: Some(Utc::now()),
                related_tickers: vec![symbol.to_string()],
            })
            .take(limit)
            .collect())
    }

    async fn fetch_daily_bars(&self, symbol: &str, _days: u32) -> Result<Vec<DailyBar>, UpstreamError> {
        self.check(symbol)?;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Ok((0..self.bars)
            .map(|i| {
                // gentle uptrend with a zig-zag so RSI stays inside (0, 100)
                let close = 100.0 + i as f64 * 0.5 + if i % 2 == 0 { 1.0 } else { -1.0 };
                DailyBar {
                    date: start + ChronoDuration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000 + i as u64,
                }
            })
            .collect())
    }
}

pub fn ticker_row(symbol: &str, fetched_minutes_ago: Option<i64>) -> tickers::Model {
    let fetched = fetched_minutes_ago.map(|m| (Utc::now() - ChronoDuration::minutes(m)).fixed_offset());
    let created = (Utc::now() - ChronoDuration::days(3)).fixed_offset();
    tickers::Model {
        id: 0,
        symbol: symbol.to_string(),
        name: Some("Stored Corp".to_string()),
        exchange: Some("NYQ".to_string()),
        currency: Some("USD".to_string()),
        market_cap: Some(1_000_000),
        sector: None,
        industry: None,
        full_time_employees: None,
        website: None,
        long_business_summary: None,
        current_price: Some(dec!(42.10)),
        previous_close: None,
        open_price: None,
        day_high: None,
        day_low: None,
        volume: None,
        avg_volume: None,
        fifty_two_week_high: None,
        fifty_two_week_low: None,
        trailing_pe: None,
        forward_pe: None,
        eps_ttm: None,
        price_to_book: None,
        beta: None,
        dividend_rate: None,
        dividend_yield: None,
        raw_info: None,
        created_at: created,
        updated_at: fetched.unwrap_or(created),
        last_fetched_at: fetched,
    }
}

/// Router over an in-memory ticker store, a fake provider and the given db
pub fn test_app(
    db: DatabaseConnection,
    store: &MemoryTickerStore,
    provider: Arc<FakeProvider>,
) -> Router {
    let ticker_cache = TickerCacheService::new(
        Arc::new(store.clone()),
        provider.clone(),
        TickerCacheConfig {
            ttl: Duration::from_secs(300),
            upstream_timeout: Duration::from_secs(2),
        },
    );

    build_router(AppState {
        db: Arc::new(db),
        ticker_cache,
        market_data: provider,
        auth: AuthSecret::new(Some(TEST_SECRET.to_string())),
    })
}

pub fn bearer_for(user_id: i64) -> String {
    let claims = json!({
        "sub": user_id,
        "exp": Utc::now().timestamp() + 3600,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}
