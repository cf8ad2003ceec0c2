//! Wire types for trade prints (WS `trade` table).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the BitMEX `trade` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BitmexTrade {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub side: String,
    pub size: Decimal,
    pub price: Decimal,
    #[serde(rename = "trdMatchID")]
    pub trd_match_id: String,
}
