use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::AuthUser,
    error::AppError,
    models::watchlist::{AddTickerRequest, WatchlistNameRequest, WatchlistResponse, WatchlistTicker},
    services::watchlist,
    AppState,
};

/// Handler for GET /watchlists
pub async fn list_watchlists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<WatchlistResponse>>, AppError> {
    let lists = watchlist::list_watchlists(&state.db, user_id).await?;
    Ok(Json(lists.into_iter().map(Into::into).collect()))
}

/// Handler for POST /watchlists
pub async fn create_watchlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WatchlistNameRequest>,
) -> Result<(StatusCode, Json<WatchlistResponse>), AppError> {
    let created = watchlist::create_watchlist(&state.db, user_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Handler for PUT /watchlists/{id}
pub async fn rename_watchlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<WatchlistNameRequest>,
) -> Result<Json<WatchlistResponse>, AppError> {
    let updated = watchlist::rename_watchlist(&state.db, user_id, id, &body.name).await?;
    Ok(Json(updated.into()))
}

/// Handler for DELETE /watchlists/{id}
pub async fn delete_watchlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    watchlist::delete_watchlist(&state.db, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /watchlists/{id}/tickers
pub async fn list_watchlist_tickers(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<WatchlistTicker>>, AppError> {
    let items = watchlist::list_tickers(&state.db, user_id, id).await?;
    Ok(Json(items))
}

/// Handler for POST /watchlists/{id}/tickers
pub async fn add_watchlist_ticker(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<AddTickerRequest>,
) -> Result<StatusCode, AppError> {
    watchlist::add_ticker(&state.db, &state.ticker_cache, user_id, id, &body.symbol).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /watchlists/{id}/tickers/{symbol}
pub async fn remove_watchlist_ticker(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, symbol)): Path<(i32, String)>,
) -> Result<StatusCode, AppError> {
    watchlist::remove_ticker(&state.db, user_id, id, &symbol).await?;
    Ok(StatusCode::NO_CONTENT)
}
