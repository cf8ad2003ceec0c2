//! Conversions: market wire types → domain types.

use super::wire::{BitmexInstrument, BitmexL2Level, BitmexMargin, BitmexPosition};
use super::{Balance, Depth, Position, PriceLevel, Ticker};
use crate::shared::{CurrencyUnit, PriceQuote};
use chrono::Utc;
use rust_decimal::Decimal;

/// Satoshis per bitcoin; BitMEX margin endpoints report XBt.
const SATOSHIS_PER_BTC: i64 = 100_000_000;

fn quoted(raw: Option<Decimal>, quote: PriceQuote) -> Decimal {
    raw.and_then(|p| quote.apply(p)).unwrap_or_default()
}

/// Build a ticker from an instrument row.
///
/// Inverse instruments swap which side is the best bid and ask once the
/// price is inverted.
pub fn ticker_from_instrument(inst: BitmexInstrument, quote: PriceQuote) -> Ticker {
    let (sell, buy) = match quote {
        PriceQuote::Direct => (inst.ask_price, inst.bid_price),
        PriceQuote::Inverse => (inst.bid_price, inst.ask_price),
    };
    let (high, low) = match quote {
        PriceQuote::Direct => (inst.high_price, inst.low_price),
        PriceQuote::Inverse => (inst.low_price, inst.high_price),
    };

    Ticker {
        time: inst.timestamp.unwrap_or_else(Utc::now),
        high: quoted(high, quote),
        low: quoted(low, quote),
        sell: quoted(sell, quote),
        buy: quoted(buy, quote),
        last: quoted(inst.last_price, quote),
        vol: inst.volume24h.unwrap_or_default(),
    }
}

/// Split L2 rows into best-first asks and bids.
///
/// Levels whose price cannot be normalized are skipped.
pub fn depth_from_levels(levels: Vec<BitmexL2Level>, quote: PriceQuote) -> Depth {
    let mut depth = Depth::default();
    for level in levels {
        let Some(price) = quote.apply(level.price) else {
            tracing::warn!(id = level.id, "skipping depth level with zero price");
            continue;
        };
        let entry = PriceLevel {
            price,
            amount: level.size,
        };
        // Inverting the price swaps the economic side of the book.
        let is_ask = match (level.side.as_str(), quote) {
            ("Sell", PriceQuote::Direct) | ("Buy", PriceQuote::Inverse) => true,
            ("Buy", PriceQuote::Direct) | ("Sell", PriceQuote::Inverse) => false,
            (other, _) => {
                tracing::warn!(side = other, "skipping depth level with unknown side");
                continue;
            }
        };
        if is_ask {
            depth.asks.push(entry);
        } else {
            depth.bids.push(entry);
        }
    }

    depth.asks.sort_by(|a, b| a.price.cmp(&b.price));
    depth.bids.sort_by(|a, b| b.price.cmp(&a.price));
    depth
}

impl From<BitmexMargin> for Balance {
    fn from(m: BitmexMargin) -> Self {
        let sats = Decimal::from(SATOSHIS_PER_BTC);
        Balance {
            currency: CurrencyUnit::Btc,
            total: m.wallet_balance / sats,
            available: m.available_margin / sats,
        }
    }
}

/// Collapse position rows for `symbol` into `(long, short)` exposure.
pub fn positions_from_rows(
    rows: Vec<BitmexPosition>,
    symbol: &str,
    quote: PriceQuote,
) -> (Position, Position) {
    let mut long = Position::default();
    let mut short = Position::default();

    for row in rows.into_iter().filter(|r| r.symbol == symbol) {
        let side = if row.current_qty > Decimal::ZERO {
            &mut long
        } else if row.current_qty < Decimal::ZERO {
            &mut short
        } else {
            continue;
        };
        side.amount = row.current_qty.abs();
        side.avg_price = quoted(row.avg_entry_price, quote);
        side.unrealised_pnl = row.unrealised_pnl / Decimal::from(SATOSHIS_PER_BTC);
    }

    (long, short)
}
