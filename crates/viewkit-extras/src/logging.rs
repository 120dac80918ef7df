//! Log initialisation
//!
//! Installs a global `tracing` subscriber: an [`EnvFilter`] (from `RUST_LOG`
//! when set, otherwise the configured default) and a formatting layer.
//!
//! ```rust,ignore
//! use viewkit_extras::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default().format(LogFormat::Pretty))?;
//! tracing::info!("listening");
//! ```

use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    EnvFilter, Layer, Registry,
};

/// Output format of log lines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line, human oriented
    Pretty,
    /// The default `tracing-subscriber` format
    Full,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
///
/// Deserializable, so it can be read with
/// `Config::<LoggingConfig>::from_env_prefixed("VIEWKIT_LOG")`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging format
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set
    pub filter: String,
    /// Whether to print the event target
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            filter: "info".to_string(),
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Set the output format
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the fallback filter directive
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Default configuration for an environment profile
    #[cfg(feature = "config")]
    pub fn for_environment(env: &crate::config::Environment) -> Self {
        Self {
            filter: env.default_log_level().to_string(),
            format: if env.is_development() {
                LogFormat::Pretty
            } else {
                LogFormat::Compact
            },
            ..Self::default()
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, ParseError> {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
            _ => EnvFilter::try_new(&self.filter),
        }
    }
}

/// Error type for log initialisation
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The filter directive could not be parsed
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber is already installed
    #[error("logging already initialised: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the filter is invalid or another subscriber was installed first.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(config.with_target)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(config.with_target)
            .boxed(),
        LogFormat::Full => tracing_subscriber::fmt::layer()
            .with_target(config.with_target)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, "Logging initialised");
    Ok(())
}
