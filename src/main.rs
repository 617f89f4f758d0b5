use marketdesk_backend::{
    auth::AuthSecret,
    build_router,
    config::AppConfig,
    services::{
        market_data::{MarketDataProvider, YahooFinanceClient},
        ticker_cache::TickerCacheService,
        ticker_store::SeaOrmTickerStore,
    },
    AppState,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,marketdesk_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");
    if config.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not set; watchlist routes will reject every request");
    }

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    let db = Arc::new(db);

    let market_data: Arc<dyn MarketDataProvider> = Arc::new(
        YahooFinanceClient::new(
            config.market_data_base_url.clone(),
            config.ticker_cache.upstream_timeout,
        )
        .expect("Failed to build market data client"),
    );

    let ticker_cache = TickerCacheService::new(
        Arc::new(SeaOrmTickerStore::new(db.clone())),
        market_data.clone(),
        config.ticker_cache,
    );

    tracing::info!(
        ttl_secs = config.ticker_cache.ttl.as_secs(),
        upstream = %config.market_data_base_url,
        "Ticker cache ready"
    );

    let state = AppState {
        db,
        ticker_cache,
        market_data,
        auth: AuthSecret::new(config.jwt_secret.clone()),
    };

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
