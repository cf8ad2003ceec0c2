//! Authentication — API credentials, nonces and request signing.
//!
//! ## Security Model
//!
//! - Credentials are immutable once an adapter is built.
//! - The secret is NEVER logged: `Credentials` has a redacting `Debug` impl
//!   and no accessor hands the secret out of this module.
//! - Signed REST calls carry `api-nonce`, `api-key` and `api-signature`
//!   headers. Public endpoints are sent unsigned.

pub mod nonce;
pub mod signer;

use serde::Deserialize;

pub use nonce::NonceSource;
pub use signer::{AuthHeaders, HttpMethod, RequestSigner};

/// API key pair for one exchange account.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Both halves present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    pub(crate) fn secret(&self) -> &str {
        &self.api_secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
