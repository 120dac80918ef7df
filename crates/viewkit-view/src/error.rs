//! View error types

use thiserror::Error;

/// Error type for rendering operations
#[derive(Error, Debug)]
pub enum ViewError {
    /// The template engine failed to parse or render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// No template is registered under this name
    #[error("Template not found: {0}")]
    NotFound(String),

    /// The parameters could not be turned into a template context
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A caller parameter collides with one the renderer injects
    #[error("Parameter '{0}' is supplied by the renderer and cannot be passed in")]
    DuplicateParameter(String),

    /// The cancellation token fired before rendering started
    #[error("Rendering cancelled")]
    Cancelled,
}

impl ViewError {
    /// Create a serialization error
    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(template: impl Into<String>) -> Self {
        Self::NotFound(template.into())
    }
}
