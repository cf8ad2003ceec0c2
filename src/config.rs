//! Layered settings: optional TOML file, then `MARKET__*` environment
//! variables.
//!
//! ```toml
//! [server]
//! debug = true
//!
//! [log]
//! level = "info"
//! format = "compact"
//!
//! [market.bitmex]
//! api_key = "..."
//! api_secret = "..."
//! price_quote = "inverse"
//! ```
//!
//! `MARKET__MARKET__BITMEX__API_KEY` overrides `market.bitmex.api_key`.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MARKET";

// ─── LogSettings ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// The `[log]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    /// Filter directive (`info`, `market_adapter=debug`, ...). Unset means
    /// `info`, or `debug` when `server.debug` is on.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Settings {
    inner: Config,
}

impl Settings {
    /// Load from an optional TOML file plus the environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        let inner = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(Self { inner })
    }

    /// Settings from a TOML string only.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let inner = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(Self { inner })
    }

    /// Typed lookup by dotted key (`"market.bitmex.symbol"`).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.inner.get::<T>(key).map_err(|e| match e {
            config::ConfigError::NotFound(_) => ConfigError::Missing(key.to_string()),
            other => ConfigError::Source(other),
        })
    }

    /// Like [`Settings::get`], with a fallback for absent keys. Type errors
    /// still fail.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Err(ConfigError::Missing(_)) => Ok(default),
            other => other,
        }
    }

    /// The `market.<name>` subtree as an adapter config.
    pub fn exchange<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        self.get(&format!("market.{}", name))
    }

    pub fn log(&self) -> Result<LogSettings, ConfigError> {
        self.get_or("log", LogSettings::default())
    }

    /// `server.debug`, off unless set.
    pub fn debug(&self) -> bool {
        self.get_or("server.debug", false).unwrap_or(false)
    }
}
