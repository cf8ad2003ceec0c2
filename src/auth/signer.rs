//! HMAC-SHA256 request signing.
//!
//! The canonical string for a REST call is
//! `VERB + "/api/v1" + path [+ "?" + query] + nonce [+ body]`, where query and
//! body are form-encoded with keys in sorted order. Stream authentication
//! signs `"GET/realtime" + nonce`.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::{Credentials, NonceSource};
use crate::error::SignError;
use crate::network::BITMEX_API_PREFIX;

type HmacSha256 = Hmac<Sha256>;

/// Request parameters. Sorted keys keep the encoding deterministic.
pub type Params = BTreeMap<String, String>;

// ─── HttpMethod ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// A request with form parameters is a POST; everything else is a GET.
    pub fn infer(body: &Params) -> Self {
        if body.is_empty() {
            HttpMethod::Get
        } else {
            HttpMethod::Post
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── AuthHeaders ─────────────────────────────────────────────────────────────

/// Headers attached to an authenticated REST call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub nonce: u64,
    pub key: String,
    pub signature: String,
}

impl AuthHeaders {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("api-nonce".to_string(), self.nonce.to_string()),
            ("api-key".to_string(), self.key.clone()),
            ("api-signature".to_string(), self.signature.clone()),
        ]
    }
}

// ─── Pure signing ────────────────────────────────────────────────────────────

/// Form-encode parameters (`a=1&b=2`).
pub fn encode_params(params: &Params) -> Result<String, SignError> {
    Ok(serde_urlencoded::to_string(params)?)
}

/// The exact bytes signed for a REST call.
pub fn canonical_string(
    method: HttpMethod,
    path: &str,
    query: &Params,
    body: &Params,
    nonce: u64,
) -> Result<String, SignError> {
    let mut raw = format!("{}{}{}", method.as_str(), BITMEX_API_PREFIX, path);
    if !query.is_empty() {
        raw.push('?');
        raw.push_str(&encode_params(query)?);
    }
    raw.push_str(&nonce.to_string());
    if !body.is_empty() {
        raw.push_str(&encode_params(body)?);
    }
    Ok(raw)
}

/// Lowercase hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn hmac_hex(secret: &str, payload: &str) -> Result<String, SignError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignError::InvalidKey)?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign one REST call. Pure: same inputs, same headers.
pub fn sign(
    method: HttpMethod,
    path: &str,
    query: &Params,
    body: &Params,
    credentials: &Credentials,
    nonce: u64,
) -> Result<AuthHeaders, SignError> {
    let raw = canonical_string(method, path, query, body, nonce)?;
    Ok(AuthHeaders {
        nonce,
        key: credentials.api_key.clone(),
        signature: hmac_hex(credentials.secret(), &raw)?,
    })
}

// ─── RequestSigner ───────────────────────────────────────────────────────────

/// Credentials plus a nonce source; signs REST calls and stream logins.
#[derive(Debug)]
pub struct RequestSigner {
    credentials: Credentials,
    nonces: NonceSource,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            nonces: NonceSource::new(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Sign a REST call with a fresh nonce.
    pub fn sign_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Params,
        body: &Params,
    ) -> Result<AuthHeaders, SignError> {
        sign(method, path, query, body, &self.credentials, self.nonces.next())
    }

    /// Arguments for the stream `authKey` command: `[key, nonce, signature]`.
    pub fn stream_auth(&self) -> Result<AuthHeaders, SignError> {
        let nonce = self.nonces.next();
        let signature = hmac_hex(self.credentials.secret(), &format!("GET/realtime{}", nonce))?;
        Ok(AuthHeaders {
            nonce,
            key: self.credentials.api_key.clone(),
            signature,
        })
    }
}
