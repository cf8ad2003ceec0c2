//! # Market Adapter
//!
//! Normalized access to cryptocurrency exchanges: one adapter per exchange,
//! each owning a stream connection, a bounded trade history and a signed REST
//! surface behind the [`exchange::Exchange`] trait.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Shared enums, domain slices (trade, order, market), errors
//! 2. **Auth** — Credentials, nonces, HMAC request signing
//! 3. **HTTP** — `HttpTransport` seam with a `reqwest` implementation
//! 4. **WebSocket** — Frame types, dispatcher, `tokio-tungstenite` transport
//! 5. **Adapters** — `Exchange` trait and the BitMEX adapter
//! 6. **Context** — Layered settings, logging, explicit process lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market_adapter::prelude::*;
//!
//! let mut ctx = ProcessContext::from_path(Some("market.toml".as_ref()))?;
//! let bitmex = ctx.bitmex().await?;
//!
//! let ticker = bitmex.ticker().await?;
//! let recent = bitmex.trades();
//!
//! ctx.shutdown().await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared enums and newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Credentials, nonces and request signing.
pub mod auth;

// ── Layer 3: HTTP ────────────────────────────────────────────────────────────

/// HTTP transport seam.
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// WebSocket messages, dispatch and transport.
pub mod ws;

// ── Layer 5: Adapters ────────────────────────────────────────────────────────

/// The `Exchange` contract and its implementations.
pub mod exchange;

// ── Layer 6: Context ─────────────────────────────────────────────────────────

/// Layered settings.
pub mod config;

/// Process context: logging and adapter lifecycle.
pub mod context;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared
    pub use crate::shared::{CurrencyUnit, PriceQuote, Symbol, TradeAction};

    // Domain types
    pub use crate::domain::market::{Balance, Depth, Position, PriceLevel, Ticker};
    pub use crate::domain::order::{Order, OrderRequest, OrderSide, OrderType};
    pub use crate::domain::trade::{Trade, TradeBuffer};

    // Errors
    pub use crate::error::{AdapterError, AdapterResult, ConfigError, HttpError, WsError};

    // Auth
    pub use crate::auth::{Credentials, RequestSigner};

    // Transports
    pub use crate::http::{HttpRequest, HttpTransport, ReqwestTransport};
    pub use crate::ws::{MessageOut, MessageSink, StreamHandler, Subscription, Topic, WsConfig};

    // Adapters
    pub use crate::exchange::{BitmexConfig, BitmexExchange, ConnectionState, Exchange};

    // Context
    pub use crate::config::Settings;
    pub use crate::context::ProcessContext;
}
