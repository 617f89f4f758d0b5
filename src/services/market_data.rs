//! Upstream market data provider
//!
//! `MarketDataProvider` is the seam the ticker cache and the news/chart
//! handlers depend on. `YahooFinanceClient` implements it against the public
//! Yahoo Finance JSON endpoints:
//!
//! - `/v10/finance/quoteSummary/{symbol}` for the snapshot fields
//! - `/v8/finance/chart/{symbol}` for daily bars
//! - `/v1/finance/search` for news

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Flat key/value payload as returned for one symbol
pub type RawPayload = Map<String, Value>;

/// quoteSummary modules merged into the snapshot payload, highest priority first
const SNAPSHOT_MODULES: [&str; 5] = [
    "price",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
    "assetProfile",
];

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Symbol '{0}' not found upstream")]
    NotFound(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream request failed: {0}")]
    Http(reqwest::Error),

    #[error("Upstream API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Http(e)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_tickers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the full snapshot payload for one symbol
    async fn fetch_snapshot(&self, symbol: &str) -> Result<RawPayload, UpstreamError>;

    /// Most recent news items mentioning the symbol
    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, UpstreamError>;

    /// Daily bars covering at least the last `days` calendar days, oldest first
    async fn fetch_daily_bars(&self, symbol: &str, days: u32)
    -> Result<Vec<DailyBar>, UpstreamError>;
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; marketdesk-backend/0.1)")
            .build()
            .map_err(UpstreamError::Http)?;

        Ok(Self { client, base_url })
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        symbol: &str,
    ) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(symbol.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<RawPayload, UpstreamError> {
        tracing::info!(symbol = %symbol, "Fetching ticker snapshot from Yahoo Finance");

        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let body = self
            .get_json(&url, &[("modules", SNAPSHOT_MODULES.join(","))], symbol)
            .await?;

        let payload = flatten_quote_summary(&body, symbol)?;
        tracing::debug!(symbol = %symbol, fields = payload.len(), "Snapshot payload received");
        Ok(payload)
    }

    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, UpstreamError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let body = self
            .get_json(
                &url,
                &[
                    ("q", symbol.to_string()),
                    ("quotesCount", "0".to_string()),
                    ("newsCount", limit.to_string()),
                ],
                symbol,
            )
            .await?;

        let mut news = parse_news(&body)?;
        news.truncate(limit);
        tracing::debug!(symbol = %symbol, count = news.len(), "Fetched news");
        Ok(news)
    }

    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<DailyBar>, UpstreamError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let body = self
            .get_json(
                &url,
                &[
                    ("range", chart_range(days).to_string()),
                    ("interval", "1d".to_string()),
                ],
                symbol,
            )
            .await?;

        let bars = parse_chart(&body)?;
        tracing::debug!(symbol = %symbol, days = days, bars = bars.len(), "Fetched daily bars");
        Ok(bars)
    }
}

/// Smallest chart range that covers `days`
fn chart_range(days: u32) -> &'static str {
    match days {
        0..=5 => "5d",
        6..=31 => "1mo",
        32..=93 => "3mo",
        94..=186 => "6mo",
        187..=366 => "1y",
        _ => "2y",
    }
}

/// Merge all quoteSummary modules into one flat map.
///
/// Formatted numbers arrive as `{"raw": 1.23, "fmt": "1.23"}` and are reduced
/// to their raw value; empty objects (`{}`) mean "no data" and are dropped.
/// When several modules carry the same key, the one listed first in
/// `SNAPSHOT_MODULES` wins.
pub fn flatten_quote_summary(body: &Value, symbol: &str) -> Result<RawPayload, UpstreamError> {
    let summary = body
        .get("quoteSummary")
        .ok_or_else(|| UpstreamError::Malformed("missing quoteSummary".to_string()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_str).unwrap_or("");
        if code.eq_ignore_ascii_case("not found") {
            return Err(UpstreamError::NotFound(symbol.to_string()));
        }
        return Err(UpstreamError::Malformed(error.to_string()));
    }

    let modules = match summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
    {
        Some(Value::Object(modules)) => modules,
        _ => return Err(UpstreamError::NotFound(symbol.to_string())),
    };

    let mut payload = RawPayload::new();
    for name in SNAPSHOT_MODULES {
        let Some(fields) = modules.get(name).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in fields {
            if payload.contains_key(key) {
                continue;
            }
            let value = match value {
                Value::Object(obj) if obj.contains_key("raw") => obj["raw"].clone(),
                Value::Object(obj) if obj.is_empty() => continue,
                other => other.clone(),
            };
            payload.insert(key.clone(), value);
        }
    }

    if payload.is_empty() {
        return Err(UpstreamError::NotFound(symbol.to_string()));
    }

    Ok(payload)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    title: String,
    publisher: Option<String>,
    link: Option<String>,
    provider_publish_time: Option<i64>,
    #[serde(default)]
    related_tickers: Vec<String>,
}

pub fn parse_news(body: &Value) -> Result<Vec<NewsItem>, UpstreamError> {
    let response: SearchResponse = serde_json::from_value(body.clone())
        .map_err(|e| UpstreamError::Malformed(format!("news: {}", e)))?;

    Ok(response
        .news
        .into_iter()
        .map(|n| NewsItem {
            title: n.title,
            publisher: n.publisher,
            link: n.link,
            published_at: n
                .provider_publish_time
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            related_tickers: n.related_tickers,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

// Yahoo emits null for sessions without trades
#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Daily bars from a chart response; sessions without a close are skipped
pub fn parse_chart(body: &Value) -> Result<Vec<DailyBar>, UpstreamError> {
    let envelope: ChartEnvelope = serde_json::from_value(body.clone())
        .map_err(|e| UpstreamError::Malformed(format!("chart: {}", e)))?;

    if let Some(error) = envelope.chart.error.filter(|e| !e.is_null()) {
        return Err(UpstreamError::Malformed(error.to_string()));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let pick = |series: &[Option<f64>]| series.get(i).copied().flatten().unwrap_or(close);

        bars.push(DailyBar {
            date,
            open: pick(&quote.open),
            high: pick(&quote.high),
            low: pick(&quote.low),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    Ok(bars)
}
