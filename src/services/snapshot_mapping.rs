//! Upstream payload → typed snapshot fields
//!
//! The mapping is a single table: each snapshot field lists the upstream keys
//! it may be read from, in priority order. A key that is absent, null, empty
//! or of the wrong type yields `None`; mapping never fails.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::Set;
use serde_json::Value;
use std::str::FromStr;

use crate::entities::tickers;
use crate::services::market_data::RawPayload;

macro_rules! snapshot_fields {
    ($( $field:ident : $kind:ident <= [$($key:literal),+ $(,)?] ),* $(,)?) => {
        /// Every mapped column of a ticker snapshot
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct SnapshotFields {
            $( pub $field: Option<snapshot_fields!(@ty $kind)>, )*
        }

        impl SnapshotFields {
            pub fn from_payload(payload: &RawPayload) -> Self {
                Self {
                    $( $field: $kind(payload, &[$($key),+]), )*
                }
            }
        }

        /// (column, upstream keys) pairs, for diagnostics and tests
        pub const FIELD_TABLE: &[(&str, &[&str])] = &[
            $( (stringify!($field), &[$($key),+]), )*
        ];
    };
    (@ty text) => { String };
    (@ty integer) => { i64 };
    (@ty number) => { Decimal };
}

snapshot_fields! {
    name:                  text    <= ["longName", "shortName"],
    exchange:              text    <= ["exchange", "exchangeName"],
    currency:              text    <= ["currency", "financialCurrency"],
    market_cap:            integer <= ["marketCap"],
    sector:                text    <= ["sector"],
    industry:              text    <= ["industry"],
    full_time_employees:   integer <= ["fullTimeEmployees"],
    website:               text    <= ["website"],
    long_business_summary: text    <= ["longBusinessSummary"],
    current_price:         number  <= ["regularMarketPrice", "currentPrice"],
    previous_close:        number  <= ["regularMarketPreviousClose", "previousClose"],
    open_price:            number  <= ["regularMarketOpen", "open"],
    day_high:              number  <= ["dayHigh", "regularMarketDayHigh"],
    day_low:               number  <= ["dayLow", "regularMarketDayLow"],
    volume:                integer <= ["volume", "regularMarketVolume"],
    avg_volume:            integer <= ["averageVolume", "averageDailyVolume3Month"],
    fifty_two_week_high:   number  <= ["fiftyTwoWeekHigh"],
    fifty_two_week_low:    number  <= ["fiftyTwoWeekLow"],
    trailing_pe:           number  <= ["trailingPE"],
    forward_pe:            number  <= ["forwardPE"],
    eps_ttm:               number  <= ["epsTrailingTwelveMonths", "trailingEps"],
    price_to_book:         number  <= ["priceToBook"],
    beta:                  number  <= ["beta"],
    dividend_rate:         number  <= ["dividendRate"],
    dividend_yield:        number  <= ["dividendYield"],
}

fn present<'a>(payload: &'a RawPayload, keys: &'a [&'a str]) -> impl Iterator<Item = &'a Value> + 'a {
    keys.iter()
        .filter_map(move |k| payload.get(*k))
        .filter(|v| !v.is_null())
}

fn text(payload: &RawPayload, keys: &[&str]) -> Option<String> {
    present(payload, keys).find_map(|v| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn integer(payload: &RawPayload, keys: &[&str]) -> Option<i64> {
    present(payload, keys).find_map(|v| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.round() as i64)
        })
    })
}

fn number(payload: &RawPayload, keys: &[&str]) -> Option<Decimal> {
    present(payload, keys).find_map(|v| match v {
        Value::Number(n) => {
            let repr = n.to_string();
            Decimal::from_str(&repr)
                .or_else(|_| Decimal::from_scientific(&repr))
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        _ => None,
    })
}

/// One refresh result, ready to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotUpdate {
    pub symbol: String,
    pub fields: SnapshotFields,
    pub raw_info: Value,
    pub fetched_at: DateTime<Utc>,
}

impl SnapshotUpdate {
    /// Map a payload for `symbol`; the name falls back to the symbol itself
    pub fn from_payload(symbol: &str, payload: RawPayload, fetched_at: DateTime<Utc>) -> Self {
        let mut fields = SnapshotFields::from_payload(&payload);
        if fields.name.is_none() {
            fields.name = Some(symbol.to_string());
        }

        Self {
            symbol: symbol.to_string(),
            fields,
            raw_info: Value::Object(payload),
            fetched_at,
        }
    }

    /// Full-overwrite active model; `created_at` is left to the column default
    pub fn into_active_model(self) -> tickers::ActiveModel {
        let f = self.fields;
        let fetched_at = self.fetched_at.fixed_offset();

        tickers::ActiveModel {
            symbol: Set(self.symbol),
            name: Set(f.name),
            exchange: Set(f.exchange),
            currency: Set(f.currency),
            market_cap: Set(f.market_cap),
            sector: Set(f.sector),
            industry: Set(f.industry),
            full_time_employees: Set(f.full_time_employees),
            website: Set(f.website),
            long_business_summary: Set(f.long_business_summary),
            current_price: Set(f.current_price),
            previous_close: Set(f.previous_close),
            open_price: Set(f.open_price),
            day_high: Set(f.day_high),
            day_low: Set(f.day_low),
            volume: Set(f.volume),
            avg_volume: Set(f.avg_volume),
            fifty_two_week_high: Set(f.fifty_two_week_high),
            fifty_two_week_low: Set(f.fifty_two_week_low),
            trailing_pe: Set(f.trailing_pe),
            forward_pe: Set(f.forward_pe),
            eps_ttm: Set(f.eps_ttm),
            price_to_book: Set(f.price_to_book),
            beta: Set(f.beta),
            dividend_rate: Set(f.dividend_rate),
            dividend_yield: Set(f.dividend_yield),
            raw_info: Set(Some(self.raw_info)),
            updated_at: Set(fetched_at),
            last_fetched_at: Set(Some(fetched_at)),
            ..Default::default()
        }
    }

    /// Apply onto an existing row (or a fresh one) the way the store upsert does
    pub fn apply_to(self, existing: Option<tickers::Model>, id: i32) -> tickers::Model {
        let fetched_at = self.fetched_at.fixed_offset();
        let created_at = existing.as_ref().map(|m| m.created_at).unwrap_or(fetched_at);
        let last_fetched_at = existing
            .as_ref()
            .and_then(|m| m.last_fetched_at)
            .map(|prev| prev.max(fetched_at))
            .unwrap_or(fetched_at);
        let f = self.fields;

        tickers::Model {
            id: existing.as_ref().map(|m| m.id).unwrap_or(id),
            symbol: self.symbol,
            name: f.name,
            exchange: f.exchange,
            currency: f.currency,
            market_cap: f.market_cap,
            sector: f.sector,
            industry: f.industry,
            full_time_employees: f.full_time_employees,
            website: f.website,
            long_business_summary: f.long_business_summary,
            current_price: f.current_price,
            previous_close: f.previous_close,
            open_price: f.open_price,
            day_high: f.day_high,
            day_low: f.day_low,
            volume: f.volume,
            avg_volume: f.avg_volume,
            fifty_two_week_high: f.fifty_two_week_high,
            fifty_two_week_low: f.fifty_two_week_low,
            trailing_pe: f.trailing_pe,
            forward_pe: f.forward_pe,
            eps_ttm: f.eps_ttm,
            price_to_book: f.price_to_book,
            beta: f.beta,
            dividend_rate: f.dividend_rate,
            dividend_yield: f.dividend_yield,
            raw_info: Some(self.raw_info),
            created_at,
            updated_at: fetched_at,
            last_fetched_at: Some(last_fetched_at),
        }
    }
}
