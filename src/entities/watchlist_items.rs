//! `SeaORM` Entity for watchlist_items table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watchlist_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub watchlist_id: i32,
    pub ticker_id: i32,
    pub added_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::watchlists::Entity",
        from = "Column::WatchlistId",
        to = "super::watchlists::Column::Id",
        on_delete = "Cascade"
    )]
    Watchlists,
    #[sea_orm(
        belongs_to = "super::tickers::Entity",
        from = "Column::TickerId",
        to = "super::tickers::Column::Id"
    )]
    Tickers,
}

impl Related<super::watchlists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Watchlists.def()
    }
}

impl Related<super::tickers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
