//! Staleness rule for cached ticker snapshots
//!
//! A snapshot is served from the store while its last successful fetch is
//! younger than the TTL; anything else (no row, never fetched, too old) is
//! refreshed from upstream. All arithmetic happens in UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use std::time::Duration;

/// Where a stored row sits relative to the TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Missing,
    Fresh,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    ServeCached,
    Refresh,
}

/// Timestamps as they come out of different storage layers
pub trait AsUtc {
    fn as_utc(&self) -> DateTime<Utc>;
}

impl AsUtc for DateTime<Utc> {
    fn as_utc(&self) -> DateTime<Utc> {
        *self
    }
}

impl AsUtc for DateTime<FixedOffset> {
    fn as_utc(&self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

// Naive values are taken to already be UTC, never local time
impl AsUtc for NaiveDateTime {
    fn as_utc(&self) -> DateTime<Utc> {
        self.and_utc()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    ttl: chrono::Duration,
}

impl RefreshPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl)
                .unwrap_or_else(|_| chrono::Duration::days(36_500)),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Classify a row. `row_exists = false` means there is no row at all.
    pub fn classify<T: AsUtc>(
        &self,
        row_exists: bool,
        last_fetched_at: Option<&T>,
        now: DateTime<Utc>,
    ) -> Freshness {
        if !row_exists {
            return Freshness::Missing;
        }
        match last_fetched_at {
            None => Freshness::Stale,
            Some(ts) => {
                let age = now.signed_duration_since(ts.as_utc());
                if age < self.ttl {
                    Freshness::Fresh
                } else {
                    Freshness::Stale
                }
            }
        }
    }

    pub fn decide<T: AsUtc>(
        &self,
        row_exists: bool,
        last_fetched_at: Option<&T>,
        now: DateTime<Utc>,
    ) -> Decision {
        match self.classify(row_exists, last_fetched_at, now) {
            Freshness::Fresh => Decision::ServeCached,
            Freshness::Missing | Freshness::Stale => Decision::Refresh,
        }
    }
}
