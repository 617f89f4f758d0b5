use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One cached snapshot row per symbol
        manager
            .create_table(
                Table::create()
                    .table(Tickers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Tickers::Symbol)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Tickers::Name).string().null())
                    .col(ColumnDef::new(Tickers::Exchange).string().null())
                    .col(ColumnDef::new(Tickers::Currency).string_len(8).null())
                    .col(ColumnDef::new(Tickers::MarketCap).big_integer().null())
                    .col(ColumnDef::new(Tickers::Sector).string().null())
                    .col(ColumnDef::new(Tickers::Industry).string().null())
                    .col(ColumnDef::new(Tickers::FullTimeEmployees).big_integer().null())
                    .col(ColumnDef::new(Tickers::Website).string().null())
                    .col(ColumnDef::new(Tickers::LongBusinessSummary).text().null())
                    .col(ColumnDef::new(Tickers::CurrentPrice).decimal().null())
                    .col(ColumnDef::new(Tickers::PreviousClose).decimal().null())
                    .col(ColumnDef::new(Tickers::OpenPrice).decimal().null())
                    .col(ColumnDef::new(Tickers::DayHigh).decimal().null())
                    .col(ColumnDef::new(Tickers::DayLow).decimal().null())
                    .col(ColumnDef::new(Tickers::Volume).big_integer().null())
                    .col(ColumnDef::new(Tickers::AvgVolume).big_integer().null())
                    .col(ColumnDef::new(Tickers::FiftyTwoWeekHigh).decimal().null())
                    .col(ColumnDef::new(Tickers::FiftyTwoWeekLow).decimal().null())
                    .col(ColumnDef::new(Tickers::TrailingPe).decimal().null())
                    .col(ColumnDef::new(Tickers::ForwardPe).decimal().null())
                    .col(ColumnDef::new(Tickers::EpsTtm).decimal().null())
                    .col(ColumnDef::new(Tickers::PriceToBook).decimal().null())
                    .col(ColumnDef::new(Tickers::Beta).decimal().null())
                    .col(ColumnDef::new(Tickers::DividendRate).decimal().null())
                    .col(ColumnDef::new(Tickers::DividendYield).decimal().null())
                    .col(ColumnDef::new(Tickers::RawInfo).json_binary().null())
                    .col(
                        ColumnDef::new(Tickers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Tickers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Tickers::LastFetchedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Tickers {
    Table,
    Id,
    Symbol,
    Name,
    Exchange,
    Currency,
    MarketCap,
    Sector,
    Industry,
    FullTimeEmployees,
    Website,
    LongBusinessSummary,
    CurrentPrice,
    PreviousClose,
    OpenPrice,
    DayHigh,
    DayLow,
    Volume,
    AvgVolume,
    FiftyTwoWeekHigh,
    FiftyTwoWeekLow,
    TrailingPe,
    ForwardPe,
    EpsTtm,
    PriceToBook,
    Beta,
    DividendRate,
    DividendYield,
    RawInfo,
    CreatedAt,
    UpdatedAt,
    LastFetchedAt,
}
