use rust_decimal::Decimal;
use sea_orm::{prelude::DateTimeWithTimeZone, FromQueryResult};
use serde::{Deserialize, Serialize};

use crate::entities::watchlists;

/// Body for POST /watchlists and PUT /watchlists/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistNameRequest {
    #[serde(default)]
    pub name: String,
}

/// Body for POST /watchlists/{id}/tickers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddTickerRequest {
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
}

impl From<watchlists::Model> for WatchlistResponse {
    fn from(model: watchlists::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

/// One entry of GET /watchlists/{id}/tickers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromQueryResult)]
pub struct WatchlistTicker {
    pub symbol: String,
    pub name: Option<String>,
    pub current_price: Option<Decimal>,
}
