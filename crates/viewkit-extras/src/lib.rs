//! # viewkit-extras
//!
//! Startup plumbing for viewkit applications. Everything is behind a feature flag:
//!
//! | Feature | What it adds |
//! |---------|--------------|
//! | `config` | `.env` loading, [`Environment`](config::Environment) detection, typed [`Config<T>`](config::Config) |
//! | `logging` | [`init_logging`](logging::init_logging) over `tracing-subscriber` |
//! | `full` | all of the above |
//!
//! ## Example
//!
//! ```rust,ignore
//! use viewkit_extras::config::{load_dotenv, Environment};
//! use viewkit_extras::logging::{init_logging, LoggingConfig};
//!
//! load_dotenv();
//! init_logging(&LoggingConfig::for_environment(&Environment::current()))?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

#[cfg(feature = "config")]
pub mod config;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "config")]
pub use config::{
    env_or, env_parse, load_dotenv, load_dotenv_from, require_env, Config, ConfigError, Environment,
};

#[cfg(feature = "logging")]
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
