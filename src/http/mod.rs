//! HTTP layer — the transport collaborator seam.
//!
//! Adapters build an [`HttpRequest`] and hand it to an [`HttpTransport`].
//! The transport owns timeouts and connection pooling; it does not retry.
//! Decoding happens in the adapter, so a transport only returns the body.

pub mod client;

use async_trait::async_trait;

use crate::auth::signer::{encode_params, HttpMethod, Params};
use crate::error::{HttpError, SignError};

pub use client::ReqwestTransport;

/// One outbound REST call, fully formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Params,
    pub body: Params,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Params::new(),
            body: Params::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Params) -> Self {
        self.body = body;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// URL with the encoded query appended.
    pub fn full_url(&self) -> Result<String, SignError> {
        if self.query.is_empty() {
            Ok(self.url.clone())
        } else {
            Ok(format!("{}?{}", self.url, encode_params(&self.query)?))
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends a request and returns the raw response body.
///
/// Non-success statuses map to [`HttpError`] variants that still carry the
/// body, since exchanges put their error envelope there.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn call(&self, request: HttpRequest) -> Result<String, HttpError>;
}
