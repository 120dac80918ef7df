//! Template engine wrapper

use crate::ViewError;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Tera, Value};
use tokio::sync::RwLock;
use viewkit_core::sse::strip_line_breaks;

/// Configuration for the template engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Glob pattern for template files
    pub glob: String,
    /// Whether to reload templates from disk before each render (debug builds only)
    pub auto_reload: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            glob: "templates/**/*.html".to_string(),
            auto_reload: cfg!(debug_assertions),
        }
    }
}

impl TemplatesConfig {
    /// Create a new config with the given glob pattern
    pub fn new(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            ..Default::default()
        }
    }

    /// Set auto-reload behavior
    pub fn auto_reload(mut self, enabled: bool) -> Self {
        self.auto_reload = enabled;
        self
    }
}

/// Tera instance plus the templates registered from strings
///
/// A full reload rebuilds Tera from the glob alone, so string templates are
/// kept here and added back afterwards.
struct Store {
    tera: Tera,
    raw: Vec<(String, String)>,
}

impl Store {
    fn new(tera: Tera) -> Self {
        Self {
            tera,
            raw: Vec::new(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    fn add_raw(&mut self, name: String, content: String) -> Result<(), ViewError> {
        self.tera.add_raw_template(&name, &content)?;
        match self.raw.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = content,
            None => self.raw.push((name, content)),
        }
        Ok(())
    }

    fn full_reload(&mut self) -> Result<(), ViewError> {
        self.tera.full_reload()?;
        if !self.raw.is_empty() {
            self.tera.add_raw_templates(
                self.raw
                    .iter()
                    .map(|(name, content)| (name.as_str(), content.as_str())),
            )?;
        }
        Ok(())
    }
}

/// Thread-safe template store shared by every renderer clone
///
/// Templates added from strings (including inline fragments) survive
/// [`Templates::reload`] and auto-reload.
///
/// # Example
///
/// ```rust,ignore
/// use viewkit_view::Templates;
///
/// let templates = Templates::new("templates/**/*.html")?;
/// ```
#[derive(Clone)]
pub struct Templates {
    inner: Arc<RwLock<Store>>,
    config: TemplatesConfig,
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    from_glob: bool,
}

impl Templates {
    /// Load every template matching a glob pattern
    ///
    /// # Errors
    ///
    /// Returns an error if the glob pattern is invalid or templates fail to parse.
    pub fn new(glob: impl Into<String>) -> Result<Self, ViewError> {
        Self::with_config(TemplatesConfig::new(glob))
    }

    /// Create a new template engine with configuration
    pub fn with_config(config: TemplatesConfig) -> Result<Self, ViewError> {
        let mut tera = Tera::new(&config.glob)?;
        register_builtin_filters(&mut tera);

        tracing::debug!(
            glob = %config.glob,
            templates = tera.get_template_names().count(),
            "Loaded templates"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(Store::new(tera))),
            config,
            from_glob: true,
        })
    }

    /// Create an empty template engine (for adding templates programmatically)
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        register_builtin_filters(&mut tera);

        Self {
            inner: Arc::new(RwLock::new(Store::new(tera))),
            config: TemplatesConfig::default().auto_reload(false),
            from_glob: false,
        }
    }

    /// Add a template from a string, replacing any template with that name
    pub async fn add_template(
        &self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ViewError> {
        let mut store = self.inner.write().await;
        store.add_raw(name.into(), content.into())
    }

    /// Add a template only if no template with that name exists yet
    pub(crate) async fn add_template_once(&self, name: &str, content: &str) -> Result<(), ViewError> {
        if self.has_template(name).await {
            return Ok(());
        }
        let mut store = self.inner.write().await;
        if !store.contains(name) {
            store.add_raw(name.to_string(), content.to_string())?;
        }
        Ok(())
    }

    /// Render a template with the given context
    pub async fn render(
        &self,
        template: &str,
        context: &tera::Context,
    ) -> Result<String, ViewError> {
        #[cfg(debug_assertions)]
        if self.config.auto_reload && self.from_glob {
            let mut store = self.inner.write().await;
            if let Err(e) = store.full_reload() {
                tracing::warn!("Template reload failed: {}", e);
            }
        }

        let store = self.inner.read().await;
        if !store.contains(template) {
            return Err(ViewError::not_found(template));
        }
        store.tera.render(template, context).map_err(ViewError::from)
    }

    /// Check if a template exists
    pub async fn has_template(&self, name: &str) -> bool {
        let store = self.inner.read().await;
        store.contains(name)
    }

    /// Get all template names
    pub async fn template_names(&self) -> Vec<String> {
        let store = self.inner.read().await;
        store.tera.get_template_names().map(String::from).collect()
    }

    /// Reload all templates from disk, keeping templates added from strings
    pub async fn reload(&self) -> Result<(), ViewError> {
        let mut store = self.inner.write().await;
        store.full_reload()
    }

    /// Get the configuration
    pub fn config(&self) -> &TemplatesConfig {
        &self.config
    }
}

fn register_builtin_filters(tera: &mut Tera) {
    tera.register_filter(
        "json_pretty",
        |value: &Value, _: &HashMap<String, Value>| {
            serde_json::to_string_pretty(value)
                .map(Value::String)
                .map_err(|e| tera::Error::msg(e.to_string()))
        },
    );

    // Joins multi-line text so it fits a single SSE data line
    tera.register_filter(
        "oneline",
        |value: &Value, _: &HashMap<String, Value>| {
            let s = tera::try_get_value!("oneline", "value", String, value);
            Ok(Value::String(strip_line_breaks(&s).into_owned()))
        },
    );
}
