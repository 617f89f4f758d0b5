//! Read-through cache for ticker basic data
//!
//! `get_basic` serves the stored snapshot while it is fresh and otherwise
//! refreshes it from the market data provider, persisting the result with a
//! single upsert. Refreshes are serialized per symbol so that concurrent stale
//! reads trigger one upstream call. Each lock remembers when it last completed
//! a refresh; whoever takes it within the TTL of that refresh re-reads the
//! store and picks up the row the previous holder wrote.
//!
//! When the provider fails and a previous snapshot exists, that snapshot is
//! returned flagged as stale instead of failing the request.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use sea_orm::DbErr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::TickerCacheConfig;
use crate::entities::tickers;
use crate::services::market_data::{MarketDataProvider, UpstreamError};
use crate::services::refresh_policy::{Decision, RefreshPolicy};
use crate::services::snapshot_mapping::SnapshotUpdate;
use crate::services::symbol::normalize_symbol;
use crate::services::ticker_store::TickerStore;

/// Idle refresh locks are dropped after this long
const LOCK_IDLE_SECS: u64 = 600;

/// Upper bound on symbols tracked for refresh locking
const MAX_LOCKS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    #[error("Invalid ticker symbol '{0}'")]
    InvalidSymbol(String),

    #[error("Symbol '{0}' not found")]
    NotFound(String),

    #[error("Market data provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Ticker store unavailable: {0}")]
    StoreUnavailable(#[from] DbErr),
}

/// How the returned snapshot was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Fresh row served from the store
    Cache,
    /// Fetched from upstream and persisted by this call
    Refreshed,
    /// Refresh failed; the previous row is served as-is
    StaleFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedTicker {
    pub snapshot: tickers::Model,
    pub source: SnapshotSource,
}

impl CachedTicker {
    pub fn is_stale(&self) -> bool {
        self.source == SnapshotSource::StaleFallback
    }
}

#[derive(Clone)]
pub struct TickerCacheService {
    store: Arc<dyn TickerStore>,
    provider: Arc<dyn MarketDataProvider>,
    policy: RefreshPolicy,
    upstream_timeout: Duration,
    /// Per-symbol refresh lock holding the time of its last successful refresh
    refresh_locks: Cache<String, Arc<Mutex<Option<DateTime<Utc>>>>>,
}

impl TickerCacheService {
    pub fn new(
        store: Arc<dyn TickerStore>,
        provider: Arc<dyn MarketDataProvider>,
        config: TickerCacheConfig,
    ) -> Self {
        let refresh_locks = Cache::builder()
            .max_capacity(MAX_LOCKS)
            .time_to_idle(Duration::from_secs(LOCK_IDLE_SECS))
            .build();

        Self {
            store,
            provider,
            policy: RefreshPolicy::new(config.ttl),
            upstream_timeout: config.upstream_timeout,
            refresh_locks,
        }
    }

    /// Basic data for one symbol, refreshed from upstream when stale
    pub async fn get_basic(&self, raw_symbol: &str) -> Result<CachedTicker, TickerError> {
        let symbol = normalize_symbol(raw_symbol)
            .ok_or_else(|| TickerError::InvalidSymbol(raw_symbol.trim().to_string()))?;

        let existing = self.store.find_by_symbol(&symbol).await?;

        match (self.decide(existing.as_ref()), existing) {
            (Decision::ServeCached, Some(row)) => {
                debug!(symbol = %symbol, "Serving cached ticker snapshot");
                Ok(CachedTicker {
                    snapshot: row,
                    source: SnapshotSource::Cache,
                })
            }
            (_, existing) => self.refresh(&symbol, existing).await,
        }
    }

    fn decide(&self, row: Option<&tickers::Model>) -> Decision {
        self.policy.decide(
            row.is_some(),
            row.and_then(|r| r.last_fetched_at.as_ref()),
            Utc::now(),
        )
    }

    async fn refresh(
        &self,
        symbol: &str,
        seen: Option<tickers::Model>,
    ) -> Result<CachedTicker, TickerError> {
        let lock = self
            .refresh_locks
            .get_with(symbol.to_string(), async { Arc::new(Mutex::new(None)) })
            .await;

        if lock.try_lock().is_err() {
            debug!(symbol = %symbol, "Refresh in flight, waiting");
        }
        let mut last_refresh = lock.lock().await;

        // A refresh finished after our read; the store already has its row
        let current = match self.policy.decide(true, last_refresh.as_ref(), Utc::now()) {
            Decision::ServeCached => {
                let current = self.store.find_by_symbol(symbol).await?;
                if let (Decision::ServeCached, Some(row)) = (self.decide(current.as_ref()), &current)
                {
                    return Ok(CachedTicker {
                        snapshot: row.clone(),
                        source: SnapshotSource::Cache,
                    });
                }
                current
            }
            Decision::Refresh => seen,
        };

        let payload = match tokio::time::timeout(
            self.upstream_timeout,
            self.provider.fetch_snapshot(symbol),
        )
        .await
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(UpstreamError::NotFound(_))) if current.is_none() => {
                info!(symbol = %symbol, "Symbol unknown upstream");
                return Err(TickerError::NotFound(symbol.to_string()));
            }
            Ok(Err(e)) => return Self::fallback(symbol, current, e.to_string()),
            Err(_) => {
                let reason = format!(
                    "no response within {}ms",
                    self.upstream_timeout.as_millis()
                );
                return Self::fallback(symbol, current, reason);
            }
        };

        let fetched_at = Utc::now();
        let update = SnapshotUpdate::from_payload(symbol, payload, fetched_at);
        let persisted = self.store.upsert(update).await?;
        *last_refresh = Some(fetched_at);

        info!(
            symbol = %symbol,
            id = persisted.id,
            created = current.is_none(),
            "Refreshed ticker snapshot"
        );

        Ok(CachedTicker {
            snapshot: persisted,
            source: SnapshotSource::Refreshed,
        })
    }

    fn fallback(
        symbol: &str,
        current: Option<tickers::Model>,
        reason: String,
    ) -> Result<CachedTicker, TickerError> {
        match current {
            Some(row) => {
                warn!(
                    symbol = %symbol,
                    reason = %reason,
                    last_fetched_at = ?row.last_fetched_at,
                    "Upstream refresh failed, serving stale snapshot"
                );
                Ok(CachedTicker {
                    snapshot: row,
                    source: SnapshotSource::StaleFallback,
                })
            }
            None => {
                warn!(symbol = %symbol, reason = %reason, "Upstream refresh failed, nothing cached");
                Err(TickerError::UpstreamUnavailable(reason))
            }
        }
    }
}
