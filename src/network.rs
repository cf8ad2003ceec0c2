//! Network URL constants for supported exchanges.

/// BitMEX REST API base URL (paths are appended after the `/api/v1` prefix).
pub const BITMEX_API_URL: &str = "https://www.bitmex.com/api/v1";

/// BitMEX realtime WebSocket URL.
pub const BITMEX_WS_URL: &str = "wss://www.bitmex.com/realtime";

/// BitMEX testnet REST API base URL.
pub const BITMEX_TESTNET_API_URL: &str = "https://testnet.bitmex.com/api/v1";

/// BitMEX testnet realtime WebSocket URL.
pub const BITMEX_TESTNET_WS_URL: &str = "wss://testnet.bitmex.com/realtime";

/// Path prefix every signed REST path is canonicalized under.
pub const BITMEX_API_PREFIX: &str = "/api/v1";
