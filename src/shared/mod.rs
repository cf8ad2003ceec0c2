//! Shared newtypes and enums used across all domain modules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ─── TradeAction ─────────────────────────────────────────────────────────────

/// What a trade or order does to the account's position.
///
/// Closed set: every adapter maps all four variants onto its own
/// side + flag vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenLong => "open_long",
            Self::OpenShort => "open_short",
            Self::CloseLong => "close_long",
            Self::CloseShort => "close_short",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string names no known [`TradeAction`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported trade action: {0}")]
pub struct ParseTradeActionError(pub String);

impl FromStr for TradeAction {
    type Err = ParseTradeActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open_long" | "openlong" => Ok(Self::OpenLong),
            "open_short" | "openshort" => Ok(Self::OpenShort),
            "close_long" | "closelong" => Ok(Self::CloseLong),
            "close_short" | "closeshort" => Ok(Self::CloseShort),
            _ => Err(ParseTradeActionError(s.to_string())),
        }
    }
}

// ─── CurrencyUnit ────────────────────────────────────────────────────────────

/// Currency that balances and P&L are denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyUnit {
    Btc,
    Usd,
    Cny,
}

impl CurrencyUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Usd => "USD",
            Self::Cny => "CNY",
        }
    }
}

impl std::fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── PriceQuote ──────────────────────────────────────────────────────────────

/// How an instrument quotes its price on the wire.
///
/// `Inverse` instruments publish the reciprocal of the economic price, so
/// normalization computes `1 / raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceQuote {
    Direct,
    #[default]
    Inverse,
}

impl PriceQuote {
    /// Convert a raw wire price into the economic price.
    ///
    /// Returns `None` when an inverse quote is zero.
    pub fn apply(&self, raw: Decimal) -> Option<Decimal> {
        match self {
            PriceQuote::Direct => Some(raw),
            PriceQuote::Inverse => Decimal::ONE.checked_div(raw),
        }
    }
}

// ─── Symbol ──────────────────────────────────────────────────────────────────

/// Exchange instrument symbol (e.g. `"XBTUSD"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}
