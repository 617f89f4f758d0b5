// src/lib.rs

use axum::{
    extract::FromRef,
    routing::{delete, get, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::AuthSecret;
use services::{market_data::MarketDataProvider, ticker_cache::TickerCacheService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub ticker_cache: TickerCacheService,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub auth: AuthSecret,
}

impl FromRef<AppState> for AuthSecret {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

pub mod entities {
    pub mod prelude;
    pub mod master_tickers;
    pub mod tickers;
    pub mod watchlist_items;
    pub mod watchlists;
}

pub mod services {
    pub mod indicators;
    pub mod market_data;
    pub mod refresh_policy;
    pub mod snapshot_mapping;
    pub mod symbol;
    pub mod ticker_cache;
    pub mod ticker_search;
    pub mod ticker_store;
    pub mod watchlist;
}

pub mod models {
    pub mod ticker;
    pub mod watchlist;
}

pub mod handlers {
    pub mod health;
    pub mod ticker;
    pub mod watchlist;
}

pub mod auth;
pub mod config;
pub mod error;

pub fn build_router(state: AppState) -> Router {
    use handlers::{health, ticker, watchlist};

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/tickers", get(ticker::search_tickers))
        .route("/tickers/{symbol}/basic", get(ticker::get_ticker_basic))
        .route("/tickers/{symbol}/news", get(ticker::get_ticker_news))
        .route("/tickers/{symbol}/chart", get(ticker::get_ticker_chart))
        .route("/tickers/{symbol}/indicators", get(ticker::get_ticker_indicators))
        .route(
            "/watchlists",
            get(watchlist::list_watchlists).post(watchlist::create_watchlist),
        )
        .route(
            "/watchlists/{id}",
            put(watchlist::rename_watchlist).delete(watchlist::delete_watchlist),
        )
        .route(
            "/watchlists/{id}/tickers",
            get(watchlist::list_watchlist_tickers).post(watchlist::add_watchlist_ticker),
        )
        .route(
            "/watchlists/{id}/tickers/{symbol}",
            delete(watchlist::remove_watchlist_ticker),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
