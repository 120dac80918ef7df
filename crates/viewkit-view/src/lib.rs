//! # viewkit-view
//!
//! Server-side HTML components for viewkit, rendered with Tera templates.
//!
//! A [`Component`] names the template that renders it. The
//! [`ComponentRenderer`] turns components, inline [`Fragment`]s and whole
//! pages (a component wrapped in one or more [`Layout`]s) into HTML strings,
//! ready to be returned as a [`View`] or pushed to the browser as an SSE event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use viewkit_view::{Component, ComponentRenderer, Layout, Parameters, Root, Templates};
//!
//! struct Main;
//! impl Component for Main {
//!     const TEMPLATE: &'static str = "main.html";
//! }
//!
//! struct MainLayout;
//! impl Component for MainLayout {
//!     const TEMPLATE: &'static str = "layout.html";
//! }
//! impl Layout for MainLayout {
//!     type Parent = Root;
//! }
//!
//! let renderer = ComponentRenderer::new(Templates::new("templates/**/*.html")?);
//! let html = renderer
//!     .render_page::<Main, MainLayout>(None, Parameters::new().insert("Title", "Home"))
//!     .await?;
//! ```
//!
//! Every component receives a `Cancel` parameter:
//!
//! ```html
//! {% if Cancel.can_be_canceled %}<button hx-post="/cancel">Stop</button>{% endif %}
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod parameters;
mod renderer;
mod templates;
mod view;

pub use error::ViewError;
pub use parameters::Parameters;
pub use renderer::{
    CancelState, Component, ComponentRenderer, Fragment, Layout, Root, BODY_PARAMETER,
    CANCEL_PARAMETER,
};
pub use templates::{Templates, TemplatesConfig};
pub use view::View;

// Re-export tera types that users might need
pub use tera::Context;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Component, ComponentRenderer, Fragment, Layout, Parameters, Root, Templates,
        TemplatesConfig, View, ViewError,
    };
}
