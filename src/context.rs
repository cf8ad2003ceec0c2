//! Process context — settings, logging and the adapters built from them.
//!
//! Constructed once at startup and passed around explicitly. `shutdown`
//! stops every stream this context started.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogSettings, Settings};
use crate::error::{AdapterResult, ConfigError};
use crate::exchange::{BitmexConfig, BitmexExchange};
use crate::http::HttpTransport;

/// Resolve the filter directive: `RUST_LOG` wins, then `log.level`, then
/// `debug`/`info` depending on `server.debug`.
pub fn filter_directive(log: &LogSettings, debug: bool) -> String {
    if let Ok(env) = std::env::var("RUST_LOG") {
        if !env.trim().is_empty() {
            return env;
        }
    }
    match &log.level {
        Some(level) if !level.trim().is_empty() => level.clone(),
        _ if debug => "debug".to_string(),
        _ => "info".to_string(),
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(log: &LogSettings, debug: bool) -> Result<bool, ConfigError> {
    let directive = filter_directive(log, debug);
    let filter = EnvFilter::try_new(&directive).map_err(|e| ConfigError::Invalid {
        key: "log.level".into(),
        reason: e.to_string(),
    })?;

    let result = match log.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(ChronoLocal::rfc_3339())
            .pretty()
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(ChronoLocal::rfc_3339())
            .compact()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
    };
    Ok(result.is_ok())
}

pub struct ProcessContext {
    settings: Settings,
    logging_installed: bool,
    bitmex: Vec<Arc<BitmexExchange>>,
}

impl ProcessContext {
    /// Build from settings and install logging.
    pub fn init(settings: Settings) -> Result<Self, ConfigError> {
        let log = settings.log()?;
        let logging_installed = init_logging(&log, settings.debug())?;
        tracing::debug!(?log, installed = logging_installed, "logging ready");
        Ok(Self {
            settings,
            logging_installed,
            bitmex: Vec::new(),
        })
    }

    /// [`Settings::load`] then [`ProcessContext::init`].
    pub fn from_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::init(Settings::load(path)?)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether this context installed the global subscriber.
    pub fn logging_installed(&self) -> bool {
        self.logging_installed
    }

    /// `market.bitmex` settings, or defaults if the table is absent.
    pub fn bitmex_config(&self) -> Result<BitmexConfig, ConfigError> {
        match self.settings.exchange::<BitmexConfig>("bitmex") {
            Err(ConfigError::Missing(_)) => Ok(BitmexConfig::default()),
            other => other,
        }
    }

    /// Build a BitMEX adapter on the default transport and start its stream.
    pub async fn bitmex(&mut self) -> AdapterResult<Arc<BitmexExchange>> {
        let adapter = Arc::new(BitmexExchange::from_config(self.bitmex_config()?)?);
        adapter.start().await?;
        self.bitmex.push(Arc::clone(&adapter));
        Ok(adapter)
    }

    /// Build a BitMEX adapter over `http` without starting its stream. It is
    /// still stopped by [`ProcessContext::shutdown`] if started later.
    pub fn bitmex_with_transport(
        &mut self,
        http: Arc<dyn HttpTransport>,
    ) -> AdapterResult<Arc<BitmexExchange>> {
        let adapter = Arc::new(BitmexExchange::new(self.bitmex_config()?, http)?);
        self.bitmex.push(Arc::clone(&adapter));
        Ok(adapter)
    }

    pub fn adapter_count(&self) -> usize {
        self.bitmex.len()
    }

    /// Stop every adapter's stream. Errors are logged; all adapters are
    /// attempted.
    pub async fn shutdown(&mut self) {
        for adapter in self.bitmex.drain(..) {
            if let Err(e) = adapter.shutdown().await {
                tracing::warn!("shutdown of {} failed: {}", adapter.config().symbol, e);
            }
        }
        tracing::info!("process context shut down");
    }
}
