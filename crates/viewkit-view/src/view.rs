//! View response type

use crate::ViewError;
use http::{header, HeaderValue, StatusCode};
use viewkit_core::response::full_body;
use viewkit_core::{IntoResponse, Response};

const ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Error</title></head>\
    <body><h1>500 Internal Server Error</h1>\
    <p>Template rendering failed</p></body></html>";

/// Rendered HTML, or the error that prevented rendering, as a response
///
/// # Example
///
/// ```rust,ignore
/// use viewkit_view::View;
///
/// async fn home(renderer: ComponentRenderer) -> View {
///     View::from(renderer.render_page::<Main, MainLayout>(None, Parameters::new()).await)
/// }
/// ```
#[derive(Debug)]
pub struct View {
    content: Result<String, ViewError>,
    status: StatusCode,
}

impl View {
    /// Create a view from pre-rendered HTML
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            content: Ok(html.into()),
            status: StatusCode::OK,
        }
    }

    /// Create an error view
    pub fn error(err: ViewError) -> Self {
        Self {
            content: Err(err),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Set the status code used when rendering succeeded
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The rendered HTML, if rendering succeeded
    pub fn html(&self) -> Option<&str> {
        self.content.as_deref().ok()
    }
}

impl From<Result<String, ViewError>> for View {
    fn from(content: Result<String, ViewError>) -> Self {
        match content {
            Ok(html) => Self::from_html(html),
            Err(err) => Self::error(err),
        }
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        let (status, body) = match self.content {
            Ok(html) => (self.status, full_body(html)),
            Err(err) => {
                tracing::error!("Template rendering failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, full_body(ERROR_PAGE))
            }
        };

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }
}
