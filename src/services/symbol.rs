//! Ticker symbol normalization

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Covers plain tickers plus class shares (BRK.B), indices (^GSPC),
    // futures (ES=F) and crypto pairs (BTC-USD)
    static ref SYMBOL_RE: Regex = Regex::new(r"^[A-Z0-9^][A-Z0-9.\-^=]{0,15}$").unwrap();
}

/// Trim and uppercase a raw symbol; `None` if the result is not a plausible ticker
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    if SYMBOL_RE.is_match(&symbol) {
        Some(symbol)
    } else {
        None
    }
}
