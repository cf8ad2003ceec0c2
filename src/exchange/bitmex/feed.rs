//! Stream side of the BitMEX adapter: connect handshake and frame routing.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::auth::RequestSigner;
use crate::domain::trade::wire::BitmexTrade;
use crate::domain::trade::{normalize_batch, TradeBuffer};
use crate::exchange::ConnectionState;
use crate::shared::PriceQuote;
use crate::ws::{classify, DataFrame, Frame, MessageOut, MessageSink, StreamHandler, Subscription, Topic};

/// Prefix for trade ids produced by this adapter.
pub const EXCHANGE_NAME: &str = "bitmex";

/// [`StreamHandler`] the adapter hands to its transport.
///
/// Holds only shared handles, so every clone sees the same buffer and state.
#[derive(Clone)]
pub struct BitmexFeed {
    pub(crate) trades: Arc<TradeBuffer>,
    pub(crate) signer: Option<Arc<RequestSigner>>,
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) quote: PriceQuote,
    pub(crate) state: Arc<AtomicU8>,
}

impl BitmexFeed {
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn authenticate(&self, sink: &dyn MessageSink) {
        let Some(signer) = &self.signer else {
            return;
        };
        match signer.stream_auth() {
            Ok(auth) => {
                let msg = MessageOut::auth_key(&auth.key, auth.nonce, &auth.signature);
                if let Err(e) = sink.send(msg) {
                    tracing::error!("bitmex: failed to send authKey: {}", e);
                }
            }
            Err(e) => tracing::error!("bitmex: cannot sign stream auth: {}", e),
        }
    }

    fn route(&self, frame: DataFrame) {
        match frame.topic {
            Topic::Trade => self.on_trades(frame.data),
            Topic::OrderBookL2 => self.on_order_book(&frame.action),
            Topic::Unrecognized(table) => {
                tracing::warn!(table = %table, action = %frame.action, "bitmex: topic not handled");
            }
        }
    }

    fn on_trades(&self, data: Value) {
        let raw: Vec<BitmexTrade> = match serde_json::from_value(data) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("bitmex: cannot decode trade batch: {}", e);
                return;
            }
        };
        let batch = normalize_batch(EXCHANGE_NAME, raw, self.quote);
        tracing::debug!(count = batch.len(), "bitmex: trades");
        self.trades.append(batch);
    }

    /// `orderBookL2` frames are intentionally ignored; depth is read over REST.
    fn on_order_book(&self, action: &str) {
        tracing::trace!(action, "bitmex: orderBookL2 frame ignored");
    }
}

impl StreamHandler for BitmexFeed {
    fn on_connect(&self, sink: &dyn MessageSink) {
        self.set_state(ConnectionState::Connected);
        self.authenticate(sink);

        if !self.subscriptions.is_empty() {
            if let Err(e) = sink.send(MessageOut::subscribe(&self.subscriptions)) {
                tracing::error!("bitmex: failed to send subscribe: {}", e);
                return;
            }
        }
        self.set_state(ConnectionState::Subscribed);
    }

    fn on_message(&self, raw: &[u8]) {
        match classify(raw) {
            Ok(Frame::Error(error)) => tracing::error!("bitmex: stream error: {}", error),
            Ok(Frame::Ack(subscribe)) => tracing::debug!("bitmex: subscribed {}", subscribe),
            Ok(Frame::Info(info)) => tracing::debug!("bitmex: {}", info),
            Ok(Frame::Data(frame)) => self.route(frame),
            Err(e) => tracing::warn!("bitmex: dropping frame: {}", e),
        }
    }

    fn on_disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);
    }

    fn on_reconnecting(&self) {
        self.set_state(ConnectionState::Connecting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::error::WsError;
    use crate::shared::Symbol;
    use crate::ws::Op;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<MessageOut>>,
    }

    impl MessageSink for RecordingSink {
        fn send(&self, msg: MessageOut) -> Result<(), WsError> {
            self.sent.lock().push(msg);
            Ok(())
        }
    }

    fn feed(signed: bool) -> BitmexFeed {
        BitmexFeed {
            trades: Arc::new(TradeBuffer::new(3)),
            signer: signed.then(|| Arc::new(RequestSigner::new(Credentials::new("k", "s")))),
            subscriptions: vec![Subscription::new(Topic::Trade, Some(Symbol::from("XBTUSD")))],
            quote: PriceQuote::Inverse,
            state: Arc::new(AtomicU8::new(ConnectionState::Connecting as u8)),
        }
    }

    fn trade_frame(id: &str, ts: &str, price: &str) -> Vec<u8> {
        format!(
            r#"{{"table":"trade","action":"insert","data":[{{"timestamp":"{ts}","symbol":"XBTUSD","side":"Buy","size":10,"price":{price},"trdMatchID":"{id}"}}]}}"#
        )
        .into_bytes()
    }

    #[test]
    fn test_on_connect_auths_then_subscribes() {
        let feed = feed(true);
        let sink = RecordingSink::default();
        feed.on_connect(&sink);

        let sent = sink.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].op, Op::AuthKey);
        assert_eq!(sent[0].args[0], "k");
        assert_eq!(sent[1].op, Op::Subscribe);
        assert_eq!(sent[1].args, vec![Value::from("trade:XBTUSD")]);
        assert_eq!(feed.connection_state(), ConnectionState::Subscribed);
    }

    #[test]
    fn test_on_connect_without_credentials_skips_auth() {
        let feed = feed(false);
        let sink = RecordingSink::default();
        feed.on_connect(&sink);

        let sent = sink.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].op, Op::Subscribe);
    }

    #[test]
    fn test_trade_frame_fills_buffer() {
        let feed = feed(false);
        feed.on_message(&trade_frame("a", "2024-01-01T00:00:00.000Z", "4"));
        let trades = feed.trades.snapshot();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, "bitmex/a");
        assert_eq!(trades[0].price, rust_decimal::Decimal::new(25, 2));
    }

    #[test]
    fn test_bad_frames_are_dropped() {
        let feed = feed(false);
        let sink = RecordingSink::default();
        feed.on_connect(&sink);

        feed.on_message(b"{not json");
        feed.on_message(br#"{"table":"funding","action":"insert","data":[]}"#);
        feed.on_message(br#"{"error":"Signature not valid."}"#);
        feed.on_message(br#"{"table":"trade","action":"insert","data":{"oops":1}}"#);
        feed.on_message(br#"{"table":"orderBookL2","action":"partial","data":[]}"#);

        assert!(feed.trades.is_empty());
        assert_eq!(feed.connection_state(), ConnectionState::Subscribed);
    }

    #[test]
    fn test_disconnect_resets_state() {
        let feed = feed(false);
        feed.on_connect(&RecordingSink::default());
        feed.on_disconnect();
        assert_eq!(feed.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_reconnect_cycle_states() {
        let feed = feed(true);
        let sink = RecordingSink::default();
        feed.on_connect(&sink);
        assert_eq!(feed.connection_state(), ConnectionState::Subscribed);

        feed.on_disconnect();
        feed.on_reconnecting();
        assert_eq!(feed.connection_state(), ConnectionState::Connecting);

        feed.on_connect(&sink);
        assert_eq!(feed.connection_state(), ConnectionState::Subscribed);
        assert_eq!(sink.sent.lock().len(), 4);
    }
}
