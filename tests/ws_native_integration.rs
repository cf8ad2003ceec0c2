//! Live tests against the BitMEX testnet.
//!
//! All tests are `#[ignore]` because they require network access.
//!
//! Run with:
//! ```bash
//! cargo test --test ws_native_integration -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, timeout, Instant};

use market_adapter::exchange::{BitmexConfig, BitmexExchange, ConnectionState, Exchange};
use market_adapter::network::{BITMEX_TESTNET_API_URL, BITMEX_TESTNET_WS_URL};
use market_adapter::ws::native::WsClient;
use market_adapter::ws::{classify, Frame, MessageOut, MessageSink, ReadyState, StreamHandler, Subscription, Topic, WsConfig};

const TEST_TIMEOUT: Duration = Duration::from_secs(20);

fn testnet_config() -> BitmexConfig {
    BitmexConfig {
        http_host: BITMEX_TESTNET_API_URL.into(),
        ws_url: BITMEX_TESTNET_WS_URL.into(),
        ws: WsConfig {
            reconnect: false,
            ..WsConfig::default()
        },
        ..BitmexConfig::default()
    }
}

/// Collects every classified frame.
#[derive(Default)]
struct Collector {
    frames: Mutex<Vec<Frame>>,
    connects: Mutex<u32>,
}

impl StreamHandler for Collector {
    fn on_connect(&self, sink: &dyn MessageSink) {
        *self.connects.lock() += 1;
        let subs = [Subscription::new(Topic::Trade, Some("XBTUSD".into()))];
        sink.send(MessageOut::subscribe(&subs)).unwrap();
    }

    fn on_message(&self, raw: &[u8]) {
        if let Ok(frame) = classify(raw) {
            self.frames.lock().push(frame);
        }
    }
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + TEST_TIMEOUT;
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
#[ignore]
async fn test_connect_subscribe_ack() {
    let handler = Arc::new(Collector::default());
    let mut client = WsClient::new(testnet_config().ws_config());
    client.start(handler.clone()).unwrap();

    wait_until(|| {
        handler
            .frames
            .lock()
            .iter()
            .any(|f| matches!(f, Frame::Ack(_)))
    })
    .await;

    assert_eq!(*handler.connects.lock(), 1);
    assert_eq!(client.ready_state(), ReadyState::Open);
    client.disconnect().await.unwrap();
    assert_eq!(client.ready_state(), ReadyState::Closed);
}

#[tokio::test]
#[ignore]
async fn test_adapter_stream_reaches_subscribed() {
    let ex = BitmexExchange::from_config(testnet_config()).unwrap();
    ex.start().await.unwrap();

    wait_until(|| ex.connection_state() == ConnectionState::Subscribed).await;

    ex.shutdown().await.unwrap();
    assert_eq!(ex.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
#[ignore]
async fn test_public_rest_endpoints() {
    let ex = BitmexExchange::from_config(testnet_config()).unwrap();

    let ticker = timeout(TEST_TIMEOUT, ex.ticker()).await.unwrap().unwrap();
    assert!(ticker.last > rust_decimal::Decimal::ZERO);

    let depth = timeout(TEST_TIMEOUT, ex.depth()).await.unwrap().unwrap();
    assert!(!depth.asks.is_empty());
    assert!(!depth.bids.is_empty());
}
