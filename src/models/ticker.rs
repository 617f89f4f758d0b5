use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::entities::{master_tickers, tickers};
use crate::services::indicators::Macd;
use crate::services::market_data::DailyBar;
use crate::services::ticker_cache::CachedTicker;

/// Response for GET /tickers/{symbol}/basic
///
/// Flat snapshot fields; the raw upstream payload stays in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerBasicResponse {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub market_cap: Option<i64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub full_time_employees: Option<i64>,
    pub website: Option<String>,
    pub long_business_summary: Option<String>,
    pub current_price: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub open_price: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub volume: Option<i64>,
    pub avg_volume: Option<i64>,
    pub fifty_two_week_high: Option<Decimal>,
    pub fifty_two_week_low: Option<Decimal>,
    pub trailing_pe: Option<Decimal>,
    pub forward_pe: Option<Decimal>,
    pub eps_ttm: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub beta: Option<Decimal>,
    pub dividend_rate: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub last_fetched_at: Option<DateTimeWithTimeZone>,
    /// True only when a refresh failed and an older snapshot is served
    pub stale: bool,
}

impl From<CachedTicker> for TickerBasicResponse {
    fn from(cached: CachedTicker) -> Self {
        let stale = cached.is_stale();
        let tickers::Model {
            symbol,
            name,
            exchange,
            currency,
            market_cap,
            sector,
            industry,
            full_time_employees,
            website,
            long_business_summary,
            current_price,
            previous_close,
            open_price,
            day_high,
            day_low,
            volume,
            avg_volume,
            fifty_two_week_high,
            fifty_two_week_low,
            trailing_pe,
            forward_pe,
            eps_ttm,
            price_to_book,
            beta,
            dividend_rate,
            dividend_yield,
            last_fetched_at,
            ..
        } = cached.snapshot;

        Self {
            symbol,
            name,
            exchange,
            currency,
            market_cap,
            sector,
            industry,
            full_time_employees,
            website,
            long_business_summary,
            current_price,
            previous_close,
            open_price,
            day_high,
            day_low,
            volume,
            avg_volume,
            fifty_two_week_high,
            fifty_two_week_low,
            trailing_pe,
            forward_pe,
            eps_ttm,
            price_to_book,
            beta,
            dividend_rate,
            dividend_yield,
            last_fetched_at,
            stale,
        }
    }
}

/// Query parameters for GET /tickers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchEntry {
    pub symbol: String,
    pub name: String,
}

impl From<master_tickers::Model> for SearchEntry {
    fn from(model: master_tickers::Model) -> Self {
        Self {
            symbol: model.symbol,
            name: model.name,
        }
    }
}

/// OHLCV as parallel arrays, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartResponse {
    pub dates: Vec<NaiveDate>,
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<u64>,
}

impl From<Vec<DailyBar>> for ChartResponse {
    fn from(bars: Vec<DailyBar>) -> Self {
        let mut chart = ChartResponse::default();
        for bar in bars {
            chart.dates.push(bar.date);
            chart.opens.push(bar.open);
            chart.highs.push(bar.high);
            chart.lows.push(bar.low);
            chart.closes.push(bar.close);
            chart.volumes.push(bar.volume);
        }
        chart
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacdResponse {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl From<Macd> for MacdResponse {
    fn from(m: Macd) -> Self {
        Self {
            macd: m.macd,
            signal: m.signal,
            histogram: m.histogram,
        }
    }
}

/// Response for GET /tickers/{symbol}/indicators; unavailable values are null
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorsResponse {
    pub rsi: Option<f64>,
    pub macd: Option<MacdResponse>,
    pub piotroski_score: Option<u8>,
}
