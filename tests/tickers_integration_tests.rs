mod common;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use marketdesk_backend::{entities::watchlists, services::ticker_store::MemoryTickerStore};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::Value;
use tower::ServiceExt;

use crate::common::{bearer_for, mock_db, test_app, ticker_row, FakeProvider, Upstream};

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn tech_list() -> watchlists::Model {
    watchlists::Model {
        id: 3,
        user_id: 7,
        name: "Tech".to_string(),
        created_at: chrono::Utc::now().fixed_offset(),
    }
}

fn affected(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

fn add_ticker_request(symbol: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/watchlists/3/tickers")
        .header(AUTHORIZATION, bearer_for(7))
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"symbol": "{}"}}"#, symbol)))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_basic_fetches_and_caches_missing_symbol() {
    let store = MemoryTickerStore::new();
    let provider = FakeProvider::new(Upstream::Healthy);
    let app = test_app(mock_db(), &store, provider.clone());

    let (status, body) = send(app.clone(), get("/tickers/aapl/basic")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["name"], "Apple Inc.");
    assert_eq!(body["current_price"], 189.84);
    assert_eq!(body["market_cap"], 2_950_000_000_000_i64);
    assert_eq!(body["stale"], false);
    assert!(body["last_fetched_at"].is_string());
    assert!(body.get("raw_info").is_none());
    assert_eq!(store.len(), 1);

    // second read inside the TTL is served from the store
    let (status, _) = send(app, get("/tickers/AAPL/basic")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_basic_serves_stale_row_when_upstream_down() {
    let store = MemoryTickerStore::new();
    store.seed(ticker_row("IBM", Some(60)));
    let app = test_app(mock_db(), &store, FakeProvider::new(Upstream::Down));

    let (status, body) = send(app, get("/tickers/IBM/basic")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stale"], true);
    assert_eq!(body["name"], "Stored Corp");
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_basic_upstream_down_without_row_is_bad_gateway() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Down));

    let (status, body) = send(app, get("/tickers/IBM/basic")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_basic_unknown_symbol_is_not_found() {
    let store = MemoryTickerStore::new();
    let app = test_app(mock_db(), &store, FakeProvider::new(Upstream::Unknown));

    let (status, body) = send(app, get("/tickers/ZZZZ/basic")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No such symbol 'ZZZZ'");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_basic_rejects_malformed_symbol() {
    let provider = FakeProvider::new(Upstream::Healthy);
    let app = test_app(mock_db(), &MemoryTickerStore::new(), provider.clone());

    let (status, _) = send(app, get("/tickers/BAD$SYMBOL/basic")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_basic_store_down_is_server_error() {
    let store = MemoryTickerStore::new();
    store.set_unavailable(true);
    let app = test_app(mock_db(), &store, FakeProvider::new(Upstream::Healthy));

    let (status, _) = send(app, get("/tickers/AAPL/basic")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_news_limited_to_twenty() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let (status, body) = send(app, get("/tickers/msft/news")).await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 20);
    assert_eq!(items[0]["related_tickers"][0], "MSFT");
}

#[tokio::test]
async fn test_chart_parallel_arrays() {
    let app = test_app(
        mock_db(),
        &MemoryTickerStore::new(),
        FakeProvider::with_bars(Upstream::Healthy, 21),
    );

    let (status, body) = send(app, get("/tickers/GOOGL/chart")).await;

    assert_eq!(status, StatusCode::OK);
    for key in ["dates", "opens", "highs", "lows", "closes", "volumes"] {
        assert_eq!(body[key].as_array().unwrap().len(), 21, "{}", key);
    }
    assert_eq!(body["dates"][0], "2024-01-01");
}

#[tokio::test]
async fn test_chart_unknown_symbol_is_empty() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Unknown));

    let (status, body) = send(app, get("/tickers/ZZZZ/chart")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dates"], serde_json::json!([]));
    assert_eq!(body["volumes"], serde_json::json!([]));
}

#[tokio::test]
async fn test_indicators_computed_from_history() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let (status, body) = send(app, get("/tickers/AAPL/indicators")).await;

    assert_eq!(status, StatusCode::OK);
    let rsi = body["rsi"].as_f64().unwrap();
    assert!(rsi > 50.0 && rsi < 100.0, "rsi was {}", rsi);
    assert!(body["macd"]["macd"].as_f64().unwrap() > 0.0);
    assert!(body["macd"]["histogram"].is_number());
    assert!(body["piotroski_score"].is_null());
}

#[tokio::test]
async fn test_indicators_null_with_short_history() {
    let app = test_app(
        mock_db(),
        &MemoryTickerStore::new(),
        FakeProvider::with_bars(Upstream::Healthy, 10),
    );

    let (status, body) = send(app, get("/tickers/AAPL/indicators")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["rsi"].is_null());
    assert!(body["macd"].is_null());
}

#[tokio::test]
async fn test_watchlists_require_token() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let (status, body) = send(app.clone(), get("/watchlists")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let forged = Request::builder()
        .uri("/watchlists")
        .header(AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_watchlists_for_user() {
    let created_at = chrono::Utc::now().fixed_offset();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            watchlists::Model {
                id: 1,
                user_id: 7,
                name: "Tech".to_string(),
                created_at,
            },
            watchlists::Model {
                id: 4,
                user_id: 7,
                name: "Dividends".to_string(),
                created_at,
            },
        ]])
        .into_connection();
    let app = test_app(db, &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let request = Request::builder()
        .uri("/watchlists")
        .header(AUTHORIZATION, bearer_for(7))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let lists = body.as_array().unwrap();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1]["name"], "Dividends");
    assert!(lists[0].get("user_id").is_none());
}

#[tokio::test]
async fn test_create_watchlist_blank_name() {
    let app = test_app(mock_db(), &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let request = Request::builder()
        .method("POST")
        .uri("/watchlists")
        .header(AUTHORIZATION, bearer_for(7))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "  "}"#))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "`name` required");
}

#[tokio::test]
async fn test_add_ticker_to_foreign_watchlist_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<watchlists::Model>::new()])
        .into_connection();
    let provider = FakeProvider::new(Upstream::Healthy);
    let store = MemoryTickerStore::new();
    let app = test_app(db, &store, provider.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/watchlists/3/tickers")
        .header(AUTHORIZATION, bearer_for(7))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"symbol": "AAPL"}"#))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(provider.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_add_ticker_twice_is_no_content() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tech_list()], vec![tech_list()]])
        .append_exec_results([affected(1), affected(0)])
        .into_connection();
    let provider = FakeProvider::new(Upstream::Healthy);
    let store = MemoryTickerStore::new();
    let app = test_app(db, &store, provider.clone());

    let (status, _) = send(app.clone(), add_ticker_request("aapl")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.get("AAPL").unwrap().name.as_deref(), Some("Apple Inc."));

    let (status, _) = send(app, add_ticker_request("AAPL")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_remove_listed_ticker_is_no_content() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tech_list()]])
        .append_query_results([vec![ticker_row("AAPL", Some(1))]])
        .append_exec_results([affected(1)])
        .into_connection();
    let app = test_app(db, &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let request = Request::builder()
        .method("DELETE")
        .uri("/watchlists/3/tickers/aapl")
        .header(AUTHORIZATION, bearer_for(7))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_remove_unlisted_ticker_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tech_list()]])
        .append_query_results([vec![ticker_row("AAPL", Some(1))]])
        .append_exec_results([affected(0)])
        .into_connection();
    let app = test_app(db, &MemoryTickerStore::new(), FakeProvider::new(Upstream::Healthy));

    let request = Request::builder()
        .method("DELETE")
        .uri("/watchlists/3/tickers/AAPL")
        .header(AUTHORIZATION, bearer_for(7))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
