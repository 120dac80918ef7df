//! Configuration management with environment variable support.
//!
//! This module provides configuration loading from `.env` files and
//! typed configuration extraction via [`Config<T>`].
//!
//! # Example
//!
//! ```ignore
//! use viewkit_extras::config::{Config, Environment, load_dotenv};
//! use serde::Deserialize;
//!
//! load_dotenv();
//!
//! #[derive(Deserialize)]
//! struct ServerConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! // Reads HTMX_HOST and HTMX_PORT
//! let config = Config::<ServerConfig>::from_env_prefixed("HTMX")?;
//! ```

use serde::de::DeserializeOwned;
use std::fmt;

/// Variable holding the environment profile name
pub const ENV_VAR: &str = "VIEWKIT_ENV";

/// Error type for configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    EnvyError(envy::Error),
    /// A required environment variable is missing.
    MissingVar(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvyError(e) => write!(f, "Configuration error: {}", e),
            ConfigError::MissingVar(var) => {
                write!(f, "Missing required environment variable: {}", var)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::EnvyError(e) => Some(e),
            ConfigError::MissingVar(_) => None,
        }
    }
}

impl From<envy::Error> for ConfigError {
    fn from(err: envy::Error) -> Self {
        ConfigError::EnvyError(err)
    }
}

/// Environment profile for the application.
///
/// Detected from the `VIEWKIT_ENV` environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Development: debug logging, templates reloaded from disk.
    Development,
    /// Production: info logging, templates loaded once.
    Production,
    /// Custom environment name for specialized deployments.
    Custom(String),
}

impl Environment {
    /// Detect the current environment from `VIEWKIT_ENV`.
    ///
    /// - `Production` for "production" or "prod"
    /// - `Development` for "development", "dev", or when unset
    /// - `Custom(name)` for any other value
    pub fn current() -> Self {
        match std::env::var(ENV_VAR).as_deref() {
            Ok("production") | Ok("prod") => Self::Production,
            Ok("development") | Ok("dev") => Self::Development,
            Ok(other) => Self::Custom(other.to_string()),
            Err(_) => Self::Development,
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Get the environment name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Whether templates should be re-read from disk on every render.
    pub fn reload_templates(&self) -> bool {
        self.is_development()
    }

    /// Get the default log directive for this environment.
    ///
    /// - Development: "debug"
    /// - Production and custom: "info"
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "info",
            Self::Custom(_) => "info",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed configuration deserialized from environment variables.
///
/// Field names are looked up in SCREAMING_SNAKE_CASE; fields with
/// `#[serde(default)]` may be left unset.
///
/// # Example
///
/// ```ignore
/// use viewkit_extras::config::Config;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct TemplateSettings {
///     glob: String,       // Reads from GLOB
///     auto_reload: bool,  // Reads from AUTO_RELOAD
/// }
///
/// let config = Config::<TemplateSettings>::from_env()?;
/// println!("Templates: {}", config.glob);
/// ```
#[derive(Debug, Clone)]
pub struct Config<T>(pub T);

impl<T: DeserializeOwned> Config<T> {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing
    /// or if deserialization fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<T>().map(Config).map_err(ConfigError::from)
    }

    /// Load configuration from variables named `<PREFIX>_<FIELD>`.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        envy::prefixed(format!("{}_", prefix))
            .from_env::<T>()
            .map(Config)
            .map_err(ConfigError::from)
    }

    /// Get the inner configuration value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Config<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Load environment variables from a `.env` file in the current directory.
///
/// A missing file is not an error. Variables already set in the process
/// environment are not overridden.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let path = path.as_ref();
    if let Err(e) = dotenvy::from_path(path) {
        tracing::warn!(path = %path.display(), "Failed to load env file: {}", e);
    }
}

/// Read a variable that must be set.
///
/// # Errors
///
/// [`ConfigError::MissingVar`] if the variable is unset or not valid unicode.
pub fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

/// Get an environment variable with a default value.
pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable and parse it to a specific type.
///
/// # Example
///
/// ```ignore
/// use viewkit_extras::config::env_parse;
///
/// let port: u16 = env_parse("PORT").unwrap_or(8080);
/// ```
pub fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
