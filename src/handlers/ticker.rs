use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppError,
    models::ticker::{
        ChartResponse, IndicatorsResponse, SearchEntry, SearchQuery, TickerBasicResponse,
    },
    services::{
        indicators::{calculate_macd, calculate_rsi, MACD_FAST, MACD_SIGNAL, MACD_SLOW, RSI_PERIOD},
        market_data::{NewsItem, UpstreamError},
        symbol::normalize_symbol,
        ticker_search::search_master_tickers,
    },
    AppState,
};

pub const NEWS_LIMIT: usize = 20;
pub const CHART_DAYS: u32 = 30;
/// About three months of sessions, enough for MACD's 34-close warmup
pub const INDICATOR_DAYS: u32 = 90;

fn require_symbol(raw: &str) -> Result<String, AppError> {
    normalize_symbol(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid ticker symbol '{}'", raw.trim())))
}

/// Handler for GET /tickers?search=<prefix>
pub async fn search_tickers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchEntry>>, AppError> {
    let rows = search_master_tickers(&state.db, &query.search).await?;
    Ok(Json(rows.into_iter().map(SearchEntry::from).collect()))
}

/// Handler for GET /tickers/{symbol}/basic
/// Serves the cached snapshot, refreshing it from upstream when stale
pub async fn get_ticker_basic(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<TickerBasicResponse>, AppError> {
    let cached = state.ticker_cache.get_basic(&symbol).await?;
    Ok(Json(cached.into()))
}

/// Handler for GET /tickers/{symbol}/news
pub async fn get_ticker_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<NewsItem>>, AppError> {
    let symbol = require_symbol(&symbol)?;
    let news = state.market_data.fetch_news(&symbol, NEWS_LIMIT).await?;
    Ok(Json(news))
}

/// Handler for GET /tickers/{symbol}/chart
/// Last 30 days of daily bars; empty arrays when the provider has nothing
pub async fn get_ticker_chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ChartResponse>, AppError> {
    let symbol = require_symbol(&symbol)?;

    let bars = match state.market_data.fetch_daily_bars(&symbol, CHART_DAYS).await {
        Ok(bars) => bars,
        Err(UpstreamError::NotFound(_)) => {
            tracing::debug!(symbol = %symbol, "No chart data upstream");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(ChartResponse::from(bars)))
}

/// Handler for GET /tickers/{symbol}/indicators
pub async fn get_ticker_indicators(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<IndicatorsResponse>, AppError> {
    let symbol = require_symbol(&symbol)?;

    let closes: Vec<f64> = match state
        .market_data
        .fetch_daily_bars(&symbol, INDICATOR_DAYS)
        .await
    {
        Ok(bars) => bars.into_iter().map(|b| b.close).collect(),
        Err(UpstreamError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(symbol = %symbol, closes = closes.len(), "Computing indicators");

    Ok(Json(IndicatorsResponse {
        rsi: calculate_rsi(&closes, RSI_PERIOD),
        macd: calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).map(Into::into),
        // Needs financial statements, which the daily chart does not carry
        piotroski_score: None,
    }))
}
