//! Conversions: order wire types → [`Order`].

use super::wire::{BitmexOrder, NotionalOrderInfo, NOTIONAL_MARKET_BUY};
use super::Order;
use chrono::Utc;
use rust_decimal::Decimal;

impl From<BitmexOrder> for Order {
    fn from(o: BitmexOrder) -> Self {
        Order {
            id: o.order_id,
            amount: o.order_qty.unwrap_or_default(),
            price: o.price.unwrap_or_default(),
            deal_amount: o.cum_qty.unwrap_or_default(),
            avg_price: o.avg_px.unwrap_or_default(),
            created: o.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

impl From<NotionalOrderInfo> for Order {
    fn from(info: NotionalOrderInfo) -> Self {
        let mut order = Order {
            id: info.id.to_string(),
            amount: info.order_amount,
            price: info.order_price,
            deal_amount: info.processed_amount,
            avg_price: info.processed_price,
            created: Utc::now(),
        };

        // Notional market buys report quote currency in the amount fields.
        if info.order_type == NOTIONAL_MARKET_BUY {
            order.price = order.amount;
            order.amount = Decimal::ZERO;
            if order.deal_amount > Decimal::ZERO && order.avg_price > Decimal::ZERO {
                order.deal_amount /= order.avg_price;
            }
        }
        order
    }
}
