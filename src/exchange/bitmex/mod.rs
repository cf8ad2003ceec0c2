//! BitMEX adapter.
//!
//! Prices on inverse contracts (XBTUSD) are quoted as USD per BTC; the
//! adapter reports them as BTC per USD (`1 / raw`) unless `price_quote` is
//! set to `direct`. This applies to trades, ticker, depth, index and
//! position entry prices. Order requests and responses stay in raw units.
//! Balances are reported in BTC (the margin API answers in satoshis).

pub mod config;
pub mod feed;
mod rest;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::auth::RequestSigner;
use crate::domain::trade::TradeBuffer;
use crate::error::{AdapterResult, WsError};
use crate::exchange::ConnectionState;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::ws::WsClient;

pub use config::BitmexConfig;
pub use feed::{BitmexFeed, EXCHANGE_NAME};

/// BitMEX perpetual adapter for one symbol.
pub struct BitmexExchange {
    config: BitmexConfig,
    http: Arc<dyn HttpTransport>,
    signer: Option<Arc<RequestSigner>>,
    trades: Arc<TradeBuffer>,
    state: Arc<AtomicU8>,
    ws: tokio::sync::Mutex<Option<WsClient>>,
}

impl BitmexExchange {
    /// Build an adapter over a custom transport. Does not connect.
    pub fn new(config: BitmexConfig, http: Arc<dyn HttpTransport>) -> AdapterResult<Self> {
        config.validate()?;
        let signer = config.credentials().map(|c| Arc::new(RequestSigner::new(c)));
        tracing::info!(
            symbol = %config.symbol,
            authenticated = signer.is_some(),
            "bitmex adapter created"
        );

        Ok(Self {
            trades: Arc::new(TradeBuffer::new(config.max_trades)),
            state: Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)),
            ws: tokio::sync::Mutex::new(None),
            config,
            http,
            signer,
        })
    }

    /// Build an adapter on the default `reqwest` transport.
    pub fn from_config(config: BitmexConfig) -> AdapterResult<Self> {
        let http = ReqwestTransport::new()?;
        Self::new(config, Arc::new(http))
    }

    pub fn config(&self) -> &BitmexConfig {
        &self.config
    }

    /// Stream handler sharing this adapter's buffer and state.
    pub fn feed(&self) -> BitmexFeed {
        BitmexFeed {
            trades: Arc::clone(&self.trades),
            signer: self.signer.clone(),
            subscriptions: self.config.subscriptions(),
            quote: self.config.price_quote,
            state: Arc::clone(&self.state),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    /// Open the stream. Authentication and subscriptions follow on every
    /// connect; failures surface as error frames in the log.
    pub async fn start(&self) -> AdapterResult<()> {
        let mut guard = self.ws.lock().await;
        if guard.is_some() {
            return Err(WsError::AlreadyStarted.into());
        }

        let mut client = WsClient::new(self.config.ws_config());
        self.state
            .store(ConnectionState::Connecting as u8, Ordering::SeqCst);
        if let Err(e) = client.start(Arc::new(self.feed())) {
            self.state
                .store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
            return Err(e.into());
        }
        *guard = Some(client);
        Ok(())
    }

    /// Close the stream and stop its task. Safe to call when not started.
    pub async fn shutdown(&self) -> AdapterResult<()> {
        if let Some(mut client) = self.ws.lock().await.take() {
            client.disconnect().await?;
            tracing::info!(symbol = %self.config.symbol, "bitmex stream stopped");
        }
        self.state
            .store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AdapterError, HttpError};
    use crate::exchange::Exchange;
    use crate::http::HttpRequest;
    use crate::shared::CurrencyUnit;
    use crate::ws::StreamHandler;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn call(&self, _request: HttpRequest) -> Result<String, HttpError> {
            Err(HttpError::InvalidUrl("offline".into()))
        }
    }

    fn adapter(config: BitmexConfig) -> BitmexExchange {
        BitmexExchange::new(config, Arc::new(Unreachable)).unwrap()
    }

    #[test]
    fn test_name_and_unit() {
        let ex = adapter(BitmexConfig::default());
        assert_eq!(ex.name(), "bitmex/XBTUSD");
        assert_eq!(ex.currency_unit(), CurrencyUnit::Btc);
        assert_eq!(ex.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BitmexConfig {
            max_trades: 0,
            ..BitmexConfig::default()
        };
        let result = BitmexExchange::new(config, Arc::new(Unreachable));
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[test]
    fn test_feed_shares_buffer() {
        let ex = adapter(BitmexConfig::default());
        let feed = ex.feed();
        assert!(Arc::ptr_eq(&feed.trades, &ex.trades));
        assert_eq!(ex.trades.capacity(), 100);
    }

    #[test]
    fn test_shutdown_without_start() {
        let ex = adapter(BitmexConfig::default());
        tokio_test::assert_ok!(tokio_test::block_on(ex.shutdown()));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let config = BitmexConfig {
            ws_url: "ws://127.0.0.1:9".into(),
            ws: crate::ws::WsConfig {
                reconnect: false,
                ..crate::ws::WsConfig::default()
            },
            ..BitmexConfig::default()
        };
        let ex = adapter(config);
        ex.start().await.unwrap();
        assert!(matches!(
            ex.start().await,
            Err(AdapterError::Ws(WsError::AlreadyStarted))
        ));
        ex.shutdown().await.unwrap();
        assert_eq!(ex.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_state_disconnected_when_transport_gives_up() {
        let config = BitmexConfig {
            ws_url: "ws://127.0.0.1:9".into(),
            ws: crate::ws::WsConfig {
                reconnect: false,
                ..crate::ws::WsConfig::default()
            },
            ..BitmexConfig::default()
        };
        let ex = adapter(config);
        ex.start().await.unwrap();

        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(10);
        while ex.connection_state() != ConnectionState::Disconnected {
            assert!(tokio::time::Instant::now() < deadline, "still {:?}", ex.connection_state());
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        ex.shutdown().await.unwrap();
    }

    #[test]
    fn test_trades_only_filled_by_feed() {
        let ex = adapter(BitmexConfig::default());
        let frame = br#"{"table":"trade","action":"insert","data":[{"timestamp":"2024-01-01T00:00:00.000Z","symbol":"XBTUSD","side":"Sell","size":5,"price":40000,"trdMatchID":"t1"}]}"#;
        ex.feed().on_message(frame);

        let trades = ex.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, "bitmex/t1");
        assert_eq!(ex.trades.len(), 1);
    }
}
