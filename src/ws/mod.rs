//! WebSocket layer — messages, topics, handler callbacks.
//!
//! The transport lives in [`native`] (`tokio-tungstenite`). This module
//! defines the shared types: outbound commands, inbound envelopes, the closed
//! [`Topic`] set, and the [`StreamHandler`] callbacks a transport drives.

pub mod dispatch;
pub mod native;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WsError;
use crate::shared::Symbol;

pub use dispatch::{classify, Frame, FrameError};
pub use native::WsClient;

// ─── Outbound messages ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Op {
    #[serde(rename = "authKey")]
    AuthKey,
    #[serde(rename = "subscribe")]
    Subscribe,
}

/// Command sent from client to server: `{"op": ..., "args": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageOut {
    pub op: Op,
    pub args: Vec<Value>,
}

impl MessageOut {
    /// `{"op":"authKey","args":[key, nonce, signature]}`
    pub fn auth_key(key: &str, nonce: u64, signature: &str) -> Self {
        Self {
            op: Op::AuthKey,
            args: vec![Value::from(key), Value::from(nonce), Value::from(signature)],
        }
    }

    /// One command covering every subscription.
    pub fn subscribe(subs: &[Subscription]) -> Self {
        Self {
            op: Op::Subscribe,
            args: subs.iter().map(|s| Value::from(s.to_string())).collect(),
        }
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Every field any inbound frame may carry. Classification happens in
/// [`dispatch::classify`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub subscribe: Option<Value>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A decoded data frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub topic: Topic,
    /// `partial`, `insert`, `update` or `delete`.
    pub action: String,
    pub data: Value,
}

// ─── Topics ──────────────────────────────────────────────────────────────────

/// Streaming topics the adapter knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Trade,
    OrderBookL2,
    Unrecognized(String),
}

impl Topic {
    pub fn as_str(&self) -> &str {
        match self {
            Topic::Trade => "trade",
            Topic::OrderBookL2 => "orderBookL2",
            Topic::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for Topic {
    fn from(table: &str) -> Self {
        match table {
            "trade" => Topic::Trade,
            "orderBookL2" => Topic::OrderBookL2,
            other => Topic::Unrecognized(other.to_string()),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A topic, optionally narrowed to one instrument (`trade:XBTUSD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub topic: Topic,
    pub symbol: Option<Symbol>,
}

impl Subscription {
    pub fn new(topic: Topic, symbol: Option<Symbol>) -> Self {
        Self { topic, symbol }
    }
}

impl std::fmt::Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{}:{}", self.topic, symbol),
            None => write!(f, "{}", self.topic),
        }
    }
}

// ─── Connection state ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(v: u16) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

// ─── Handler callbacks ───────────────────────────────────────────────────────

/// Outbound half handed to [`StreamHandler::on_connect`].
pub trait MessageSink: Send + Sync {
    fn send(&self, msg: MessageOut) -> Result<(), WsError>;
}

/// Callbacks a transport drives from its background task.
///
/// Calls are serial: no two callbacks on the same handler overlap. Handlers
/// must not block, since a slow callback delays every later frame.
pub trait StreamHandler: Send + Sync + 'static {
    /// Every successful (re)connection. Messages sent on `sink` go out before
    /// any other queued traffic.
    fn on_connect(&self, sink: &dyn MessageSink);

    /// Every inbound text or binary frame, in arrival order.
    fn on_message(&self, raw: &[u8]);

    /// The connection closed or the transport gave up connecting.
    fn on_disconnect(&self) {}

    /// A new connection attempt is scheduled after backoff.
    fn on_reconnecting(&self) {}
}

// ─── WsConfig ────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_max_reconnect_attempts() -> u32 {
    10
}
fn default_base_reconnect_delay_ms() -> u32 {
    1_000
}
fn default_ping_interval_ms() -> u32 {
    30_000
}
fn default_pong_timeout_ms() -> u32 {
    10_000
}

/// Transport settings. Reconnection and heartbeat belong here, not in the
/// adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WsConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_true")]
    pub reconnect: bool,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_base_reconnect_delay_ms")]
    pub base_reconnect_delay_ms: u32,
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u32,
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u32,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::BITMEX_WS_URL.to_string(),
            reconnect: true,
            max_reconnect_attempts: default_max_reconnect_attempts(),
            base_reconnect_delay_ms: default_base_reconnect_delay_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_key_wire_shape() {
        let json = serde_json::to_value(MessageOut::auth_key("k", 12, "abc")).unwrap();
        assert_eq!(json, serde_json::json!({"op": "authKey", "args": ["k", 12, "abc"]}));
    }

    #[test]
    fn test_subscribe_wire_shape() {
        let subs = [
            Subscription::new(Topic::Trade, Some(Symbol::from("XBTUSD"))),
            Subscription::new(Topic::OrderBookL2, None),
        ];
        let json = serde_json::to_value(MessageOut::subscribe(&subs)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "subscribe", "args": ["trade:XBTUSD", "orderBookL2"]})
        );
    }

    #[test]
    fn test_topic_from_table() {
        assert_eq!(Topic::from("trade"), Topic::Trade);
        assert_eq!(Topic::from("orderBookL2"), Topic::OrderBookL2);
        assert_eq!(Topic::from("funding"), Topic::Unrecognized("funding".into()));
        assert_eq!(Topic::from("funding").as_str(), "funding");
    }

    #[test]
    fn test_ready_state_from_u16() {
        assert_eq!(ReadyState::from(1), ReadyState::Open);
        assert_eq!(ReadyState::from(99), ReadyState::Closed);
    }

    #[test]
    fn test_ws_config_defaults_from_empty_table() {
        let cfg: WsConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.reconnect);
        assert_eq!(cfg.max_reconnect_attempts, 10);
        assert_eq!(cfg.ping_interval_ms, 30_000);
        assert!(cfg.url.is_empty());
    }
}
