//! Normalization of raw trade prints into [`Trade`].

use super::wire::BitmexTrade;
use super::Trade;
use crate::shared::{PriceQuote, TradeAction};
use chrono::Local;
use thiserror::Error;

/// Why a single raw trade could not be normalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeDecodeError {
    #[error("unknown trade side: {0}")]
    UnknownSide(String),

    #[error("cannot invert zero price for trade {0}")]
    ZeroPrice(String),
}

fn action_for_side(side: &str) -> Option<TradeAction> {
    match side {
        "Buy" | "buy" => Some(TradeAction::OpenLong),
        "Sell" | "sell" => Some(TradeAction::OpenShort),
        _ => None,
    }
}

impl BitmexTrade {
    /// Normalize a single print.
    pub fn normalize(self, exchange: &str, quote: PriceQuote) -> Result<Trade, TradeDecodeError> {
        let action = action_for_side(&self.side)
            .ok_or_else(|| TradeDecodeError::UnknownSide(self.side.clone()))?;
        let price = quote
            .apply(self.price)
            .ok_or_else(|| TradeDecodeError::ZeroPrice(self.trd_match_id.clone()))?;

        Ok(Trade {
            id: format!("{}/{}", exchange, self.trd_match_id),
            create_time: self.timestamp.with_timezone(&Local),
            price,
            amount: self.size,
            action,
        })
    }
}

/// Normalize a batch delivered newest-first into oldest-first trades.
///
/// Records that fail to normalize are skipped with a warning; the rest of
/// the batch is kept.
pub fn normalize_batch(exchange: &str, raw: Vec<BitmexTrade>, quote: PriceQuote) -> Vec<Trade> {
    raw.into_iter()
        .rev()
        .filter_map(|t| match t.normalize(exchange, quote) {
            Ok(trade) => Some(trade),
            Err(e) => {
                tracing::warn!(exchange, "dropping trade: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn raw(id: &str, secs: i64, side: &str, price: &str) -> BitmexTrade {
        BitmexTrade {
            timestamp: Utc.timestamp_opt(secs, 0).single().unwrap(),
            symbol: Some("XBTUSD".to_string()),
            side: side.to_string(),
            size: Decimal::from(10),
            price: Decimal::from_str(price).unwrap(),
            trd_match_id: id.to_string(),
        }
    }

    #[test]
    fn test_inverse_price_normalization() {
        let trade = raw("m1", 1_000, "Buy", "4").normalize("bitmex", PriceQuote::Inverse).unwrap();
        assert_eq!(trade.price, Decimal::from_str("0.25").unwrap());
        assert_eq!(trade.id, "bitmex/m1");
        assert_eq!(trade.action, TradeAction::OpenLong);
        assert_eq!(trade.amount, Decimal::from(10));
    }

    #[test]
    fn test_direct_price_untouched() {
        let trade = raw("m1", 1_000, "Sell", "6500.5").normalize("bitmex", PriceQuote::Direct).unwrap();
        assert_eq!(trade.price, Decimal::from_str("6500.5").unwrap());
        assert_eq!(trade.action, TradeAction::OpenShort);
    }

    #[test]
    fn test_timestamp_converted_to_local() {
        let trade = raw("m1", 1_000, "Buy", "1").normalize("bitmex", PriceQuote::Direct).unwrap();
        assert_eq!(trade.create_time.timestamp(), 1_000);
    }

    #[test]
    fn test_zero_inverse_price_rejected() {
        let err = raw("m0", 1, "Buy", "0").normalize("bitmex", PriceQuote::Inverse).unwrap_err();
        assert_eq!(err, TradeDecodeError::ZeroPrice("m0".to_string()));
    }

    #[test]
    fn test_unknown_side_rejected() {
        let err = raw("m1", 1, "Hold", "1").normalize("bitmex", PriceQuote::Direct).unwrap_err();
        assert_eq!(err, TradeDecodeError::UnknownSide("Hold".to_string()));
    }

    #[test]
    fn test_batch_reversed_to_oldest_first() {
        let batch = vec![raw("c", 3, "Buy", "1"), raw("b", 2, "Buy", "1"), raw("a", 1, "Buy", "1")];
        let trades = normalize_batch("bitmex", batch, PriceQuote::Direct);
        let ids: Vec<_> = trades.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["bitmex/a", "bitmex/b", "bitmex/c"]);
    }

    #[test]
    fn test_batch_skips_bad_records() {
        let batch = vec![raw("b", 2, "Buy", "0"), raw("a", 1, "Buy", "2")];
        let trades = normalize_batch("bitmex", batch, PriceQuote::Inverse);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, "bitmex/a");
    }
}
