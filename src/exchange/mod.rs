//! Exchange adapters — the normalized market/order contract.
//!
//! Each adapter owns its trade buffer and stream transport. Callers only see
//! the [`Exchange`] trait and domain types; wire formats stay inside the
//! adapter module.

pub mod bitmex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::market::{Balance, Depth, Position, Ticker};
use crate::domain::order::Order;
use crate::domain::trade::Trade;
use crate::error::AdapterResult;
use crate::shared::{CurrencyUnit, TradeAction};

pub use bitmex::{BitmexConfig, BitmexExchange};

/// Lifecycle of an adapter's stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    /// Open, authentication and subscriptions not yet sent.
    Connected = 2,
    /// Authentication (if any) and every subscription sent.
    Subscribed = 3,
}

impl From<u8> for ConnectionState {
    fn from(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Subscribed,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Public surface every adapter exposes.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// `"<exchange>/<symbol>"`.
    fn name(&self) -> String;

    fn currency_unit(&self) -> CurrencyUnit;

    /// Point-in-time copy of recent trades, oldest first.
    fn trades(&self) -> Vec<Trade>;

    async fn make_order(
        &self,
        action: TradeAction,
        amount: Decimal,
        price: Decimal,
    ) -> AdapterResult<Order>;

    async fn cancel_order(&self, ids: &[String]) -> AdapterResult<()>;

    async fn get_order(&self, id: &str) -> AdapterResult<Order>;

    async fn get_orders(&self, ids: &[String]) -> AdapterResult<Vec<Order>>;

    async fn ticker(&self) -> AdapterResult<Ticker>;

    async fn depth(&self) -> AdapterResult<Depth>;

    async fn index(&self) -> AdapterResult<Decimal>;

    async fn balance(&self) -> AdapterResult<Balance>;

    /// `(long, short)` exposure on the adapter's symbol.
    async fn position(&self) -> AdapterResult<(Position, Position)>;
}
