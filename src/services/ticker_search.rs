use sea_orm::{
    sea_query::{Expr, Func},
    Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{master_tickers, prelude::*};

pub const SEARCH_LIMIT: u64 = 10;

/// Escape LIKE wildcards so user input only ever matches literally
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.trim().to_uppercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Master tickers whose symbol or name starts with `prefix`, case-insensitive,
/// ordered by symbol. An empty prefix returns the first page of the list.
pub async fn search_master_tickers(
    db: &DatabaseConnection,
    prefix: &str,
) -> Result<Vec<master_tickers::Model>, DbErr> {
    let pattern = like_prefix(prefix);

    tracing::debug!(pattern = %pattern, "Searching master tickers");

    MasterTickers::find()
        .filter(
            Condition::any()
                .add(Expr::expr(Func::upper(Expr::col(master_tickers::Column::Symbol))).like(&pattern))
                .add(Expr::expr(Func::upper(Expr::col(master_tickers::Column::Name))).like(&pattern)),
        )
        .order_by_asc(master_tickers::Column::Symbol)
        .limit(SEARCH_LIMIT)
        .all(db)
        .await
}
