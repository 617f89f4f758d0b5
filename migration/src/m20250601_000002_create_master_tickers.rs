use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing universe used by the search endpoint, filled by an external importer
        manager
            .create_table(
                Table::create()
                    .table(MasterTickers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MasterTickers::Symbol)
                            .string_len(16)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MasterTickers::Name).string().not_null())
                    .col(ColumnDef::new(MasterTickers::Exchange).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_master_tickers_name")
                    .table(MasterTickers::Table)
                    .col(MasterTickers::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MasterTickers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MasterTickers {
    Table,
    Symbol,
    Name,
    Exchange,
}
