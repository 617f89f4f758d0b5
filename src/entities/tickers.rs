//! `SeaORM` Entity for the tickers table
//!
//! Each row is the cached snapshot of one symbol's metadata and quote fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Uppercase ticker symbol (e.g., "AAPL")
    #[sea_orm(unique)]
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub market_cap: Option<i64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub full_time_employees: Option<i64>,
    pub website: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
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
    /// Full upstream payload as received on the last refresh
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub raw_info: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    /// Time of the last successful upstream fetch; drives the staleness check
    pub last_fetched_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::watchlist_items::Entity")]
    WatchlistItems,
}

impl Related<super::watchlist_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchlistItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
