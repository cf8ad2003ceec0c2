//! Market domain — tickers, depth, balances and positions.

mod convert;
pub mod wire;

use crate::shared::CurrencyUnit;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use convert::{depth_from_levels, positions_from_rows, ticker_from_instrument};

/// Latest top-of-book and 24h statistics for an instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticker {
    pub time: DateTime<Utc>,
    pub high: Decimal,
    pub low: Decimal,
    /// Best ask.
    pub sell: Decimal,
    /// Best bid.
    pub buy: Decimal,
    pub last: Decimal,
    pub vol: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Order book snapshot: asks best-first, bids best-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Depth {
    pub asks: Vec<PriceLevel>,
    pub bids: Vec<PriceLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub currency: CurrencyUnit,
    pub total: Decimal,
    pub available: Decimal,
}

/// One side of an account's exposure on an instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub amount: Decimal,
    pub avg_price: Decimal,
    pub unrealised_pnl: Decimal,
}
