//! BitMEX adapter settings, read from the `market.bitmex` config subtree.

use serde::Deserialize;

use crate::auth::Credentials;
use crate::domain::trade::state::DEFAULT_TRADE_CAPACITY;
use crate::error::ConfigError;
use crate::network::{BITMEX_API_URL, BITMEX_WS_URL};
use crate::shared::{PriceQuote, Symbol};
use crate::ws::{Subscription, Topic, WsConfig};

fn default_http_host() -> String {
    BITMEX_API_URL.to_string()
}
fn default_ws_url() -> String {
    BITMEX_WS_URL.to_string()
}
fn default_symbol() -> Symbol {
    Symbol::from("XBTUSD")
}
fn default_max_trades() -> usize {
    DEFAULT_TRADE_CAPACITY
}
fn default_topics() -> Vec<String> {
    vec!["trade".to_string()]
}

#[derive(Clone, Deserialize, PartialEq)]
pub struct BitmexConfig {
    /// REST base URL, including the `/api/v1` prefix.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_symbol")]
    pub symbol: Symbol,
    /// Trade buffer capacity.
    #[serde(default = "default_max_trades")]
    pub max_trades: usize,
    /// XBTUSD is inverse-quoted; override with `direct` for linear contracts.
    #[serde(default)]
    pub price_quote: PriceQuote,
    /// Stream topics. A bare name is narrowed to `symbol`; `name:SYMBOL`
    /// is taken as written.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub ws: WsConfig,
}

impl Default for BitmexConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            ws_url: default_ws_url(),
            api_key: String::new(),
            api_secret: String::new(),
            symbol: default_symbol(),
            max_trades: default_max_trades(),
            price_quote: PriceQuote::default(),
            topics: default_topics(),
            ws: WsConfig::default(),
        }
    }
}

impl std::fmt::Debug for BitmexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmexConfig")
            .field("http_host", &self.http_host)
            .field("ws_url", &self.ws_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("symbol", &self.symbol)
            .field("max_trades", &self.max_trades)
            .field("price_quote", &self.price_quote)
            .field("topics", &self.topics)
            .field("ws", &self.ws)
            .finish()
    }
}

impl BitmexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_host.trim().is_empty() {
            return Err(ConfigError::Missing("market.bitmex.http_host".into()));
        }
        if self.ws_url.trim().is_empty() {
            return Err(ConfigError::Missing("market.bitmex.ws_url".into()));
        }
        if self.max_trades == 0 {
            return Err(ConfigError::Invalid {
                key: "market.bitmex.max_trades".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.api_key.is_empty() != self.api_secret.is_empty() {
            return Err(ConfigError::Invalid {
                key: "market.bitmex.api_key".into(),
                reason: "api_key and api_secret must be set together".into(),
            });
        }
        Ok(())
    }

    /// `None` when running unauthenticated (market data only).
    pub fn credentials(&self) -> Option<Credentials> {
        let creds = Credentials::new(self.api_key.clone(), self.api_secret.clone());
        creds.is_complete().then_some(creds)
    }

    /// Transport settings with the configured stream URL.
    pub fn ws_config(&self) -> WsConfig {
        WsConfig {
            url: self.ws_url.clone(),
            ..self.ws.clone()
        }
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.topics
            .iter()
            .map(|raw| match raw.split_once(':') {
                Some((topic, symbol)) => {
                    Subscription::new(Topic::from(topic), Some(Symbol::from(symbol)))
                }
                None => Subscription::new(Topic::from(raw.as_str()), Some(self.symbol.clone())),
            })
            .collect()
    }
}
