//! Wire types for market data and account REST responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// BitMEX `/instrument` row (only the fields the adapter reads).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BitmexInstrument {
    pub symbol: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub high_price: Option<Decimal>,
    #[serde(default)]
    pub low_price: Option<Decimal>,
    #[serde(default)]
    pub bid_price: Option<Decimal>,
    #[serde(default)]
    pub ask_price: Option<Decimal>,
    #[serde(default)]
    pub last_price: Option<Decimal>,
    #[serde(default)]
    pub volume24h: Option<Decimal>,
    #[serde(default)]
    pub indicative_settle_price: Option<Decimal>,
}

/// BitMEX `/orderBook/L2` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BitmexL2Level {
    pub symbol: String,
    pub id: u64,
    pub side: String,
    pub size: Decimal,
    pub price: Decimal,
}

/// BitMEX `/user/margin` response. Amounts are in satoshis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BitmexMargin {
    pub currency: String,
    #[serde(default)]
    pub wallet_balance: Decimal,
    #[serde(default)]
    pub available_margin: Decimal,
}

/// BitMEX `/position` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BitmexPosition {
    pub symbol: String,
    #[serde(default)]
    pub current_qty: Decimal,
    #[serde(default)]
    pub avg_entry_price: Option<Decimal>,
    #[serde(default)]
    pub unrealised_pnl: Decimal,
}
