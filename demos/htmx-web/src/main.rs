//! htmx demo
//!
//! - `GET /` renders the main page inside its layout
//! - `GET /main/example` renders an inline fragment (`?shout=true&repeat=2`)
//! - `GET /events` streams a rendered tick component every second over SSE
//!
//! Configuration comes from the environment (or `.env`): `HTMX_HOST`,
//! `HTMX_PORT`, `HTMX_TEMPLATES`, `HTMX_TICK_MS`, `HTMX_KEEP_ALIVE_SECS`,
//! plus `VIEWKIT_ENV` and `RUST_LOG`.

mod pages;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use pages::AppState;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use viewkit::config::{load_dotenv, Config, Environment};
use viewkit::logging::{init_logging, LoggingConfig};
use viewkit::{CancellationToken, ComponentRenderer, Notifier, Templates, TemplatesConfig};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServerConfig {
    host: String,
    port: u16,
    templates: String,
    tick_ms: u64,
    keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            templates: concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html").to_string(),
            tick_ms: 1000,
            keep_alive_secs: 15,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();
    let environment = Environment::current();
    init_logging(&LoggingConfig::for_environment(&environment))?;

    let config = Config::<ServerConfig>::from_env_prefixed("HTMX")?.into_inner();
    let templates = Templates::with_config(
        TemplatesConfig::new(&config.templates).auto_reload(environment.reload_templates()),
    )?;

    let state = Arc::new(AppState {
        renderer: ComponentRenderer::new(templates),
        ticks: Notifier::new(),
        shutdown: CancellationToken::new(),
        keep_alive: Duration::from_secs(config.keep_alive_secs),
    });

    let ticker = tokio::spawn(pages::run_ticker(
        state.clone(),
        Duration::from_millis(config.tick_ms.max(1)),
    ));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(env = %environment, "htmx demo running on http://{}", addr);

    loop {
        let (stream, _) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => break,
        };
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<Incoming>| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(pages::route(state, req).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("Connection error: {}", err);
            }
        });
    }

    tracing::info!("Shutting down");
    state.shutdown.cancel();
    ticker.await?;
    Ok(())
}
