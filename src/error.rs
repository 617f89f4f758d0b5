//! HTTP-facing error type
//!
//! Every handler returns `Result<_, AppError>`; the response body is always
//! `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};

use crate::services::market_data::UpstreamError;
use crate::services::ticker_cache::TickerError;
use crate::services::watchlist::WatchlistError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Market data provider unavailable: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TickerError> for AppError {
    fn from(err: TickerError) -> Self {
        match err {
            TickerError::InvalidSymbol(raw) => {
                AppError::BadRequest(format!("Invalid ticker symbol '{}'", raw))
            }
            TickerError::NotFound(symbol) => {
                AppError::NotFound(format!("No such symbol '{}'", symbol))
            }
            TickerError::UpstreamUnavailable(msg) => AppError::Upstream(msg),
            TickerError::StoreUnavailable(e) => AppError::Database(e),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound(symbol) => {
                AppError::NotFound(format!("No such symbol '{}'", symbol))
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<WatchlistError> for AppError {
    fn from(err: WatchlistError) -> Self {
        match err {
            WatchlistError::Ticker(e) => e.into(),
            WatchlistError::Database(e) => AppError::Database(e),
            other @ WatchlistError::BlankName => AppError::BadRequest(other.to_string()),
            other @ (WatchlistError::NotFound | WatchlistError::TickerNotListed) => {
                AppError::NotFound(other.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
