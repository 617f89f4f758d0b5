pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_tickers;
mod m20250601_000002_create_master_tickers;
mod m20250602_000001_create_watchlists;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_tickers::Migration),
            Box::new(m20250601_000002_create_master_tickers::Migration),
            Box::new(m20250602_000001_create_watchlists::Migration),
        ]
    }
}
