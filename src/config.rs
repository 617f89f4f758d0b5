//! Application configuration
//!
//! Read once at startup from the process environment (after `.env` is loaded)
//! and passed explicitly into the services that need it.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable for the PostgreSQL connection string
const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable for the HTTP listen address
const ENV_BIND_ADDR: &str = "BIND_ADDR";

/// Environment variable for the ticker snapshot time-to-live
const ENV_TICKER_CACHE_TTL: &str = "TICKER_CACHE_TTL_SECS";

/// Environment variable for the upstream request timeout
const ENV_UPSTREAM_TIMEOUT: &str = "UPSTREAM_TIMEOUT_SECS";

/// Environment variable for the market data base URL
const ENV_MARKET_DATA_BASE_URL: &str = "MARKET_DATA_BASE_URL";

/// Environment variable for the access token verification secret
const ENV_JWT_SECRET: &str = "JWT_SECRET";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default snapshot TTL in seconds (5 minutes)
const DEFAULT_TICKER_CACHE_TTL_SECS: u64 = 300;

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;

const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Refresh policy settings for the ticker cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerCacheConfig {
    /// A snapshot older than this is refreshed on the next read
    pub ttl: Duration,
    /// Upper bound on a single upstream round trip
    pub upstream_timeout: Duration,
}

impl Default for TickerCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TICKER_CACHE_TTL_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub market_data_base_url: String,
    pub ticker_cache: TickerCacheConfig,
    /// `None` disables every authenticated route (requests get 401)
    pub jwt_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(ENV_DATABASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;

        let bind_raw = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: ENV_BIND_ADDR,
            value: bind_raw.clone(),
        })?;

        let ttl_secs = parse_secs(&lookup, ENV_TICKER_CACHE_TTL, DEFAULT_TICKER_CACHE_TTL_SECS)?;
        let timeout_secs =
            parse_secs(&lookup, ENV_UPSTREAM_TIMEOUT, DEFAULT_UPSTREAM_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_UPSTREAM_TIMEOUT,
                value: "0".to_string(),
            });
        }

        let market_data_base_url = lookup(ENV_MARKET_DATA_BASE_URL)
            .unwrap_or_else(|| DEFAULT_MARKET_DATA_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = lookup(ENV_JWT_SECRET).filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            bind_addr,
            market_data_base_url,
            ticker_cache: TickerCacheConfig {
                ttl: Duration::from_secs(ttl_secs),
                upstream_timeout: Duration::from_secs(timeout_secs),
            },
            jwt_secret,
        })
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
