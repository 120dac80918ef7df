//! Response types for viewkit
//!
//! Rendered HTML and event streams both end up as an HTTP response. The core
//! trait is [`IntoResponse`]; the body type is boxed so buffered and
//! streaming bodies share one [`Response`] type that hyper can serve.
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | [`Html<T>`] | 200 | text/html |
//! | [`Sse<S>`](crate::sse::Sse) | 200 | text/event-stream |
//! | `StatusCode` | given | - |

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Empty, Full};
use std::convert::Infallible;

/// Boxed response body
pub type Body = http_body_util::combinators::UnsyncBoxBody<Bytes, Infallible>;

/// HTTP Response type
pub type Response = http::Response<Body>;

/// Body holding `bytes` in full
pub fn full_body(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into()).boxed_unsync()
}

/// Body with no content
pub fn empty_body() -> Body {
    Empty::<Bytes>::new().boxed_unsync()
}

fn with_content_type(body: Body, content_type: &'static str) -> Response {
    let mut response = http::Response::new(body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        http::Response::new(empty_body())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        with_content_type(full_body(self), "text/plain; charset=utf-8")
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        with_content_type(full_body(self), "text/plain; charset=utf-8")
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        let mut response = http::Response::new(empty_body());
        *response.status_mut() = self;
        response
    }
}

// (StatusCode, impl IntoResponse)
impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// HTML response wrapper
///
/// # Example
///
/// ```rust,ignore
/// async fn page(renderer: &ComponentRenderer) -> Html<String> {
///     Html(renderer.render_fragment(&fragment).await?)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<String>> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        with_content_type(full_body(self.0.into()), "text/html; charset=utf-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_html_response() {
        let response = Html("<p>hi</p>").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_status_tuple() {
        let response = (StatusCode::NOT_FOUND, "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "missing");
    }

    #[test]
    fn test_result_response() {
        let ok: Result<&'static str, StatusCode> = Ok("fine");
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let err: Result<&'static str, StatusCode> = Err(StatusCode::BAD_GATEWAY);
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
