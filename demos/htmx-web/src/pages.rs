//! Components and routes

use futures_util::StreamExt;
use http::{Method, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use viewkit::prelude::*;

pub const ROUTE_MAIN: &str = "/";
pub const ROUTE_MAIN_EXAMPLE: &str = "/main/example";
pub const ROUTE_EVENTS: &str = "/events";

pub struct Main;
impl Component for Main {
    const TEMPLATE: &'static str = "pages/main.html";
}

pub struct MainLayout;
impl Component for MainLayout {
    const TEMPLATE: &'static str = "layouts/main_layout.html";
}
impl Layout for MainLayout {
    type Parent = Root;
}

pub struct Tick;
impl Component for Tick {
    const TEMPLATE: &'static str = "components/tick.html";
}

/// Inline markup for the example fragment
pub fn example(message: &str) -> Fragment {
    Fragment::new("example.html", "<p class=\"example\">{{ Message }}</p>")
        .with_parameters(Parameters::new().insert("Message", message))
}

#[derive(Debug, Deserialize)]
struct ExampleQuery {
    #[serde(default, with = "lenient_bool")]
    shout: bool,
    #[serde(default, with = "lenient_opt_int")]
    repeat: Option<i32>,
}

/// Shared state handed to every request
pub struct AppState {
    pub renderer: ComponentRenderer,
    pub ticks: Notifier<String>,
    pub shutdown: CancellationToken,
    pub keep_alive: Duration,
}

/// Dispatch a request to its handler
pub async fn route<B>(state: Arc<AppState>, req: http::Request<B>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_owned);
    let start = std::time::Instant::now();

    let response = match (&method, path.as_str()) {
        (&Method::GET, ROUTE_MAIN) => main_page(&state).await.into_response(),
        (&Method::GET, ROUTE_MAIN_EXAMPLE) => {
            main_example(&state, query.as_deref()).await.into_response()
        }
        (&Method::GET, ROUTE_EVENTS) => events(&state).into_response(),
        (_, ROUTE_MAIN) | (_, ROUTE_MAIN_EXAMPLE) | (_, ROUTE_EVENTS) => {
            StatusCode::METHOD_NOT_ALLOWED.into_response()
        }
        _ => (StatusCode::NOT_FOUND, Html("<h1>404 Not Found</h1>")).into_response(),
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

async fn main_page(state: &AppState) -> View {
    let parameters = Parameters::new().insert("Title", "viewkit + htmx");
    View::from(
        state
            .renderer
            .render_page::<Main, MainLayout>(None, parameters)
            .await,
    )
}

async fn main_example(state: &AppState, query: Option<&str>) -> Response {
    let query: ExampleQuery = match serde_urlencoded::from_str(query.unwrap_or("")) {
        Ok(query) => query,
        Err(e) => {
            tracing::debug!("Rejected query: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let mut message = String::from("Hello World!");
    if query.shout {
        message = message.to_uppercase();
    }
    let repeat = query.repeat.unwrap_or(1).clamp(1, 10) as usize;
    let message = vec![message.as_str(); repeat].join(" ");

    View::from(state.renderer.render_fragment(&example(&message)).await).into_response()
}

fn events(state: &AppState) -> Response {
    let cancel = state.shutdown.child_token();
    let events = state
        .ticks
        .clone()
        .into_stream_with(BufferPolicy::DropOldest(64), cancel.clone())
        .map(|tick| tick.map(|html| SseEvent::html("tick", html)));

    Sse::new(events)
        .keep_alive(state.keep_alive)
        .cancel_on(cancel)
        .into_response()
}

/// Render a tick and push it to every connected browser until shutdown
pub async fn run_ticker(state: Arc<AppState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    let mut count: u64 = 0;

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }
        count += 1;

        if !state.ticks.has_subscribers() {
            continue;
        }
        let cancel = state.shutdown.child_token();
        match state
            .renderer
            .render_component::<Tick>(Some(&cancel), Parameters::new().insert("Count", &count))
            .await
        {
            Ok(html) => {
                let delivered = state.ticks.emit(html);
                tracing::debug!(count, delivered, "Tick pushed");
            }
            Err(ViewError::Cancelled) => break,
            Err(e) => tracing::warn!("Tick rendering failed: {}", e),
        }
    }

    state.ticks.complete();
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn state() -> Arc<AppState> {
        let templates = Templates::empty();
        templates
            .add_template(MainLayout::TEMPLATE, "<html>{{ Body | safe }}</html>")
            .await
            .unwrap();
        templates
            .add_template(Main::TEMPLATE, "<h1>{{ Title }}</h1>")
            .await
            .unwrap();
        templates
            .add_template(Tick::TEMPLATE, "<p>Tick {{ Count }}</p>")
            .await
            .unwrap();

        Arc::new(AppState {
            renderer: ComponentRenderer::new(templates),
            ticks: Notifier::new(),
            shutdown: CancellationToken::new(),
            keep_alive: Duration::from_secs(15),
        })
    }

    fn get(uri: &str) -> http::Request<()> {
        http::Request::get(uri).body(()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_main_page_in_layout() {
        let response = route(state().await, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "<html><h1>viewkit + htmx</h1></html>"
        );
    }

    #[tokio::test]
    async fn test_example_fragment_with_lenient_query() {
        let state = state().await;
        let response = route(state.clone(), get("/main/example")).await;
        assert_eq!(
            body_text(response).await,
            "<p class=\"example\">Hello World!</p>"
        );

        let response = route(state, get("/main/example?shout=True&repeat=%202")).await;
        assert_eq!(
            body_text(response).await,
            "<p class=\"example\">HELLO WORLD! HELLO WORLD!</p>"
        );
    }

    #[tokio::test]
    async fn test_bad_query_is_400() {
        let response = route(state().await, get("/main/example?shout=maybe")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let state = state().await;
        assert_eq!(
            route(state.clone(), get("/nope")).await.status(),
            StatusCode::NOT_FOUND
        );

        let post = http::Request::post("/").body(()).unwrap();
        assert_eq!(
            route(state, post).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_events_stream_ticks_until_shutdown() {
        let state = state().await;
        let response = route(state.clone(), get("/events")).await;
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        let ticker = tokio::spawn(run_ticker(state.clone(), Duration::from_millis(5)));
        let mut body = response.into_body();
        let frame = body.frame().await.unwrap().unwrap();
        let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
        assert!(text.starts_with("event: tick\ndata: <p>Tick "), "{}", text);
        assert!(text.ends_with("</p>\n\n"));

        state.shutdown.cancel();
        ticker.await.unwrap();
        assert!(body.collect().await.is_ok());
    }
}
