use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_tickers::Tickers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Watchlists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Watchlists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Watchlists::UserId).integer().not_null())
                    .col(ColumnDef::new(Watchlists::Name).string().not_null())
                    .col(
                        ColumnDef::new(Watchlists::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watchlists_user_id")
                    .table(Watchlists::Table)
                    .col(Watchlists::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchlistItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WatchlistItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WatchlistItems::WatchlistId).integer().not_null())
                    .col(ColumnDef::new(WatchlistItems::TickerId).integer().not_null())
                    .col(
                        ColumnDef::new(WatchlistItems::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_items_watchlist_id")
                            .from(WatchlistItems::Table, WatchlistItems::WatchlistId)
                            .to(Watchlists::Table, Watchlists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_items_ticker_id")
                            .from(WatchlistItems::Table, WatchlistItems::TickerId)
                            .to(Tickers::Table, Tickers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // ON CONFLICT target for duplicate-free adds
        manager
            .create_index(
                Index::create()
                    .name("idx_watchlist_items_unique")
                    .table(WatchlistItems::Table)
                    .col(WatchlistItems::WatchlistId)
                    .col(WatchlistItems::TickerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WatchlistItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Watchlists::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Watchlists {
    Table,
    Id,
    UserId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WatchlistItems {
    Table,
    Id,
    WatchlistId,
    TickerId,
    AddedAt,
}
