//! Component and page rendering

use crate::{Parameters, Templates, ViewError};
use serde::Serialize;
use std::borrow::Cow;
use tokio_util::sync::CancellationToken;

/// Parameter the renderer injects into every component
pub const CANCEL_PARAMETER: &str = "Cancel";

/// Parameter holding the inner HTML a layout wraps
pub const BODY_PARAMETER: &str = "Body";

/// A server-rendered component backed by a registered template
///
/// # Example
///
/// ```rust,ignore
/// struct Counter;
///
/// impl Component for Counter {
///     const TEMPLATE: &'static str = "counter.html";
/// }
/// ```
pub trait Component {
    /// Name of the template that renders this component
    const TEMPLATE: &'static str;
}

/// A component that wraps a page
///
/// The wrapped HTML is available to the template as `{{ Body | safe }}`.
/// Layouts nest through [`Layout::Parent`]; use [`Root`] for the outermost one.
pub trait Layout: Component {
    /// Layout this one renders inside
    type Parent: Layout;

    /// Whether this is the end of the layout chain
    const IS_ROOT: bool = false;
}

/// Marker ending a layout chain
pub struct Root;

impl Component for Root {
    const TEMPLATE: &'static str = "";
}

impl Layout for Root {
    type Parent = Root;
    const IS_ROOT: bool = true;
}

/// Template names from `L` outward, excluding [`Root`]
fn layout_chain<L: Layout>(chain: &mut Vec<&'static str>) {
    if L::IS_ROOT {
        return;
    }
    chain.push(L::TEMPLATE);
    layout_chain::<L::Parent>(chain);
}

/// Cancellation state exposed to templates as `Cancel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancelState {
    /// A token was supplied
    pub can_be_canceled: bool,
    /// The token has fired
    pub is_cancellation_requested: bool,
}

impl CancelState {
    fn from_token(cancel: Option<&CancellationToken>) -> Self {
        Self {
            can_be_canceled: cancel.is_some(),
            is_cancellation_requested: cancel.map_or(false, |c| c.is_cancelled()),
        }
    }
}

/// Inline template markup with its own parameters
///
/// The source is compiled the first time a fragment with this name is
/// rendered and reused afterwards. Names ending in `.html` are autoescaped.
#[derive(Debug, Clone)]
pub struct Fragment {
    name: Cow<'static, str>,
    source: Cow<'static, str>,
    parameters: Parameters,
}

impl Fragment {
    /// Create a fragment from a name and template source
    pub fn new(name: impl Into<Cow<'static, str>>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            parameters: Parameters::new(),
        }
    }

    /// Set the fragment's parameters
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Fragment name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Renders components, fragments and pages to HTML strings
///
/// Cloning is cheap; clones share the same templates.
#[derive(Clone)]
pub struct ComponentRenderer {
    templates: Templates,
}

impl ComponentRenderer {
    /// Create a renderer over a template store
    pub fn new(templates: Templates) -> Self {
        Self { templates }
    }

    /// The underlying template store
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Render a component with the given parameters
    ///
    /// A `Cancel` parameter describing `cancel` is added for the template.
    ///
    /// # Errors
    ///
    /// [`ViewError::DuplicateParameter`] if `parameters` already holds
    /// `Cancel`, [`ViewError::Cancelled`] if the token has already fired.
    pub async fn render_component<C: Component>(
        &self,
        cancel: Option<&CancellationToken>,
        parameters: Parameters,
    ) -> Result<String, ViewError> {
        self.render_template(C::TEMPLATE, cancel, parameters).await
    }

    /// Render a registered template by name, as [`render_component`](Self::render_component) does
    pub async fn render_template(
        &self,
        name: &str,
        cancel: Option<&CancellationToken>,
        mut parameters: Parameters,
    ) -> Result<String, ViewError> {
        let state = CancelState::from_token(cancel);
        parameters.inject(CANCEL_PARAMETER, &state)?;
        if state.is_cancellation_requested {
            return Err(ViewError::Cancelled);
        }

        tracing::trace!(template = name, "Rendering component");
        self.templates.render(name, parameters.context()).await
    }

    /// Render an inline fragment
    pub async fn render_fragment(&self, fragment: &Fragment) -> Result<String, ViewError> {
        self.templates
            .add_template_once(&fragment.name, &fragment.source)
            .await?;

        tracing::trace!(fragment = %fragment.name, "Rendering fragment");
        self.templates
            .render(&fragment.name, fragment.parameters.context())
            .await
    }

    /// Render page `P` inside layout `L` and each of its parents
    ///
    /// Every layout sees the page parameters plus `Body`, the HTML rendered so far.
    ///
    /// # Errors
    ///
    /// [`ViewError::DuplicateParameter`] if `parameters` holds `Body` or
    /// `Cancel`, [`ViewError::Cancelled`] if the token fires before rendering
    /// finishes.
    pub async fn render_page<P: Component, L: Layout>(
        &self,
        cancel: Option<&CancellationToken>,
        parameters: Parameters,
    ) -> Result<String, ViewError> {
        if parameters.contains(BODY_PARAMETER) {
            return Err(ViewError::DuplicateParameter(BODY_PARAMETER.to_string()));
        }

        let mut chain = Vec::new();
        layout_chain::<L>(&mut chain);

        let mut body = self
            .render_component::<P>(cancel, parameters.clone())
            .await?;

        for layout in chain {
            if cancel.map_or(false, |c| c.is_cancelled()) {
                return Err(ViewError::Cancelled);
            }
            let mut layout_parameters = parameters.clone();
            layout_parameters.inject(BODY_PARAMETER, &body)?;
            body = self
                .render_template(layout, cancel, layout_parameters)
                .await?;
        }

        Ok(body)
    }
}
