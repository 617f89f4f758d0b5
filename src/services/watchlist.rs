//! Per-user watchlists
//!
//! Every operation is scoped by the owner's user id; a watchlist that exists
//! but belongs to someone else is reported exactly like a missing one.

use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{prelude::*, tickers, watchlist_items, watchlists};
use crate::models::watchlist::WatchlistTicker;
use crate::services::symbol::normalize_symbol;
use crate::services::ticker_cache::{TickerCacheService, TickerError};

#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("`name` required")]
    BlankName,

    #[error("Watchlist not found")]
    NotFound,

    #[error("Ticker not in watchlist")]
    TickerNotListed,

    #[error(transparent)]
    Ticker(#[from] TickerError),

    #[error(transparent)]
    Database(#[from] DbErr),
}

fn clean_name(name: &str) -> Result<String, WatchlistError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WatchlistError::BlankName);
    }
    Ok(name.to_string())
}

async fn find_owned(
    db: &DatabaseConnection,
    user_id: i32,
    watchlist_id: i32,
) -> Result<watchlists::Model, WatchlistError> {
    Watchlists::find_by_id(watchlist_id)
        .filter(watchlists::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(WatchlistError::NotFound)
}

pub async fn list_watchlists(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<watchlists::Model>, WatchlistError> {
    Ok(Watchlists::find()
        .filter(watchlists::Column::UserId.eq(user_id))
        .order_by_asc(watchlists::Column::Id)
        .all(db)
        .await?)
}

pub async fn create_watchlist(
    db: &DatabaseConnection,
    user_id: i32,
    name: &str,
) -> Result<watchlists::Model, WatchlistError> {
    let name = clean_name(name)?;

    let created = watchlists::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(user_id, watchlist_id = created.id, "Created watchlist");
    Ok(created)
}

pub async fn rename_watchlist(
    db: &DatabaseConnection,
    user_id: i32,
    watchlist_id: i32,
    name: &str,
) -> Result<watchlists::Model, WatchlistError> {
    let name = clean_name(name)?;
    let existing = find_owned(db, user_id, watchlist_id).await?;

    let mut active: watchlists::ActiveModel = existing.into();
    active.name = Set(name);
    Ok(active.update(db).await?)
}

pub async fn delete_watchlist(
    db: &DatabaseConnection,
    user_id: i32,
    watchlist_id: i32,
) -> Result<(), WatchlistError> {
    let result = Watchlists::delete_many()
        .filter(watchlists::Column::Id.eq(watchlist_id))
        .filter(watchlists::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(WatchlistError::NotFound);
    }

    tracing::info!(user_id, watchlist_id, "Deleted watchlist");
    Ok(())
}

/// Symbols in a watchlist with their cached name and price, oldest entry first
pub async fn list_tickers(
    db: &DatabaseConnection,
    user_id: i32,
    watchlist_id: i32,
) -> Result<Vec<WatchlistTicker>, WatchlistError> {
    find_owned(db, user_id, watchlist_id).await?;

    Ok(Tickers::find()
        .select_only()
        .column(tickers::Column::Symbol)
        .column(tickers::Column::Name)
        .column(tickers::Column::CurrentPrice)
        .join(JoinType::InnerJoin, tickers::Relation::WatchlistItems.def())
        .filter(watchlist_items::Column::WatchlistId.eq(watchlist_id))
        .order_by_asc(watchlist_items::Column::AddedAt)
        .into_model::<WatchlistTicker>()
        .all(db)
        .await?)
}

/// Link a symbol into a watchlist. The snapshot is created or refreshed
/// through the ticker cache first, so unknown symbols are rejected before
/// anything is written. Adding a symbol twice is a no-op.
pub async fn add_ticker(
    db: &DatabaseConnection,
    ticker_cache: &TickerCacheService,
    user_id: i32,
    watchlist_id: i32,
    raw_symbol: &str,
) -> Result<(), WatchlistError> {
    find_owned(db, user_id, watchlist_id).await?;

    let ticker = ticker_cache.get_basic(raw_symbol).await?;

    let item = watchlist_items::ActiveModel {
        watchlist_id: Set(watchlist_id),
        ticker_id: Set(ticker.snapshot.id),
        ..Default::default()
    };

    let inserted = WatchlistItems::insert(item)
        .on_conflict(
            OnConflict::columns([
                watchlist_items::Column::WatchlistId,
                watchlist_items::Column::TickerId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    tracing::debug!(
        watchlist_id,
        symbol = %ticker.snapshot.symbol,
        inserted,
        "Added ticker to watchlist"
    );
    Ok(())
}

pub async fn remove_ticker(
    db: &DatabaseConnection,
    user_id: i32,
    watchlist_id: i32,
    raw_symbol: &str,
) -> Result<(), WatchlistError> {
    find_owned(db, user_id, watchlist_id).await?;

    let symbol = normalize_symbol(raw_symbol).ok_or(WatchlistError::TickerNotListed)?;
    let ticker = Tickers::find()
        .filter(tickers::Column::Symbol.eq(&symbol))
        .one(db)
        .await?
        .ok_or(WatchlistError::TickerNotListed)?;

    let result = WatchlistItems::delete_many()
        .filter(watchlist_items::Column::WatchlistId.eq(watchlist_id))
        .filter(watchlist_items::Column::TickerId.eq(ticker.id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(WatchlistError::TickerNotListed);
    }
    Ok(())
}
