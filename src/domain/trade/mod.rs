//! Trade domain — normalized trade prints and the bounded history buffer.

mod convert;
pub mod state;
pub mod wire;

use crate::shared::TradeAction;
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use convert::{normalize_batch, TradeDecodeError};
pub use state::TradeBuffer;

/// A normalized trade print.
///
/// `id` is qualified with the exchange name (`"bitmex/<match id>"`) so it is
/// unique across adapters. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: String,
    pub create_time: DateTime<Local>,
    pub price: Decimal,
    pub amount: Decimal,
    pub action: TradeAction,
}
