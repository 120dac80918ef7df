//! # viewkit
//!
//! Server-rendered HTML for hypermedia applications (htmx and friends).
//! Pages and fragments are rendered from Tera-backed components, and live
//! updates are pushed to the browser as Server-Sent Events.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use viewkit::prelude::*;
//!
//! struct Clock;
//! impl Component for Clock {
//!     const TEMPLATE: &'static str = "clock.html";
//! }
//!
//! // Push source -> pull stream -> SSE response
//! let ticks: Notifier<String> = Notifier::new();
//! let events = ticks
//!     .clone()
//!     .into_stream(CancellationToken::new())
//!     .map(|tick| tick.map(|html| SseEvent::html("tick", html)));
//! let response = Sse::new(events).into_response();
//!
//! // Elsewhere: render and emit
//! let html = renderer
//!     .render_component::<Clock>(None, Parameters::new().insert("Now", &now))
//!     .await?;
//! ticks.emit(html);
//! ```
//!
//! ## Optional Features
//!
//! - `view` (default) - components, layouts and fragments via `viewkit-view`
//! - `config` - `.env` loading and typed environment configuration
//! - `logging` - `tracing-subscriber` initialisation
//! - `full` - all of the above

// Re-export core functionality
pub use viewkit_core::*;

#[cfg(feature = "view")]
pub use viewkit_view as view;
#[cfg(feature = "view")]
pub use viewkit_view::{
    Component, ComponentRenderer, Fragment, Layout, Parameters, Root, Templates, TemplatesConfig,
    View, ViewError,
};

#[cfg(feature = "config")]
pub use viewkit_extras::config;
#[cfg(feature = "config")]
pub use viewkit_extras::{load_dotenv, Config, ConfigError, Environment};

#[cfg(feature = "logging")]
pub use viewkit_extras::logging;
#[cfg(feature = "logging")]
pub use viewkit_extras::{init_logging, LogFormat, LoggingConfig};

// Re-export commonly used external crates
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use viewkit_core::bridge::from_fn;
    pub use viewkit_core::json::{lenient_bool, lenient_opt_int};
    pub use viewkit_core::{
        BufferPolicy, CancellationToken, Html, IntoResponse, LenientBool, LenientInt, Notifier,
        Observer, PushSource, PushSourceExt, Response, Sse, SseEvent, SseWriter, StreamError,
        StreamOutcome,
    };

    #[cfg(feature = "view")]
    pub use viewkit_view::prelude::*;

    #[cfg(feature = "config")]
    pub use viewkit_extras::config::{Config, Environment};

    pub use serde::{Deserialize, Serialize};
}
