//! Wire types for order responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// BitMEX `/order` response row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BitmexOrder {
    #[serde(rename = "orderID")]
    pub order_id: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub ord_type: Option<String>,
    #[serde(default)]
    pub ord_status: Option<String>,
    #[serde(default)]
    pub order_qty: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub cum_qty: Option<Decimal>,
    #[serde(default)]
    pub avg_px: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// `order_info` response from the notional-quoted spot API.
///
/// `type == 3` marks a market buy placed by notional: `order_amount` then
/// holds the quote amount spent and `processed_amount` the quote filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotionalOrderInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub order_type: i64,
    pub order_amount: Decimal,
    pub order_price: Decimal,
    pub processed_amount: Decimal,
    pub processed_price: Decimal,
}

/// `order_info` type code for a market buy placed by notional.
pub const NOTIONAL_MARKET_BUY: i64 = 3;
