pub use super::master_tickers::Entity as MasterTickers;
pub use super::tickers::Entity as Tickers;
pub use super::watchlist_items::Entity as WatchlistItems;
pub use super::watchlists::Entity as Watchlists;
