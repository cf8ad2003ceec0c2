//! Unified adapter error types.

use thiserror::Error;

/// Top-level adapter error.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Signing error: {0}")]
    Sign(#[from] SignError),

    /// The exchange answered with an explicit error envelope.
    #[error("Exchange error {name}: {message}")]
    Api { name: String, message: String },

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited { body: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    /// Body returned with a non-success status, if any.
    ///
    /// Exchanges put their error envelope here even on 4xx responses.
    pub fn body(&self) -> Option<&str> {
        match self {
            HttpError::ServerError { body, .. }
            | HttpError::RateLimited { body }
            | HttpError::Unauthorized(body)
            | HttpError::NotFound(body)
            | HttpError::BadRequest(body) => Some(body),
            HttpError::Reqwest(_) | HttpError::InvalidUrl(_) => None,
        }
    }
}

/// Request signing errors.
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Cannot encode parameters: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    #[error("Invalid HMAC key")]
    InvalidKey,
}

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Already started")]
    AlreadyStarted,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("Missing config key: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Logging init failed: {0}")]
    Logging(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;
