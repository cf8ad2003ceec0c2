//! Order domain — normalized orders and order placement requests.

mod convert;
pub mod wire;

use crate::shared::{Symbol, TradeAction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── OrderType ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl OrderType {
    /// A positive price means a limit order; anything else goes to market.
    pub fn for_price(price: Decimal) -> Self {
        if price > Decimal::ZERO {
            OrderType::Limit
        } else {
            OrderType::Market
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "limit",
            OrderType::Market => "market",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── OrderSide ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

// ─── Order ───────────────────────────────────────────────────────────────────

/// A normalized order as reported by an exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub deal_amount: Decimal,
    pub avg_price: Decimal,
    pub created: DateTime<Utc>,
}

// ─── OrderRequest ────────────────────────────────────────────────────────────

/// Exchange-ready parameters for a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: OrderSide,
    pub ord_type: OrderType,
    pub order_qty: Decimal,
    pub price: Option<Decimal>,
    pub exec_inst: Option<&'static str>,
}

impl OrderRequest {
    /// Map a [`TradeAction`] onto side + close flag and pick the order type
    /// from the price.
    pub fn new(symbol: Symbol, action: TradeAction, amount: Decimal, price: Decimal) -> Self {
        let (side, exec_inst) = match action {
            TradeAction::OpenLong => (OrderSide::Buy, None),
            TradeAction::OpenShort => (OrderSide::Sell, None),
            TradeAction::CloseShort => (OrderSide::Sell, Some("close")),
            TradeAction::CloseLong => (OrderSide::Buy, Some("close")),
        };
        let ord_type = OrderType::for_price(price);

        Self {
            symbol,
            side,
            ord_type,
            order_qty: amount,
            price: (ord_type == OrderType::Limit).then_some(price),
            exec_inst,
        }
    }

    /// Form parameters in the exchange's field names.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), self.symbol.to_string());
        params.insert("side".to_string(), self.side.as_str().to_string());
        params.insert("ordType".to_string(), self.ord_type.as_str().to_string());
        params.insert("orderQty".to_string(), self.order_qty.to_string());
        if let Some(price) = self.price {
            params.insert("price".to_string(), price.to_string());
        }
        if let Some(exec_inst) = self.exec_inst {
            params.insert("execInst".to_string(), exec_inst.to_string());
        }
        params
    }
}
