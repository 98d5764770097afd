//! Axum Integration Example
//!
//! Logs request and response bodies of an axum application.
//!
//! Features shown:
//! - Loading dump settings from YAML
//! - Skipping health checks and multipart uploads
//! - Reading the callback context (method, path, status)
//!
//! Run:
//!   cargo run -p bodydump-demos --example axum
//!
//! Try it:
//!   curl -v -d '{"name":"widget"}' http://localhost:3000/items   # Both bodies logged
//!   curl -v http://localhost:3000/health                         # Not logged

use axum::{
    Router,
    routing::{get, post},
};
use bodydump_http::{DumpContext, DumpSettings};
use bodydump_tower::BodyDumpBuilder;
use bytes::Bytes;
use http::StatusCode;
use tracing_subscriber::EnvFilter;

const SETTINGS: &str = r#"
request: true
response: true
skip:
  - Path:
      in: ["/health", "/metrics"]
  - Header:
      name: content-type
      value: multipart/form-data
pool:
  buffer_capacity: 8192
  max_idle: 32
"#;

fn log_body(direction: &'static str) -> impl Fn(&DumpContext<'_>, &[u8]) + Send + Sync + 'static {
    move |ctx, body| {
        tracing::info!(
            direction,
            method = %ctx.method(),
            path = ctx.path(),
            status = ?ctx.status(),
            len = body.len(),
            body = %String::from_utf8_lossy(body),
            "body dumped"
        );
    }
}

async fn create_item(body: Bytes) -> (StatusCode, Bytes) {
    (StatusCode::CREATED, body)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bodydump_tower=debug")),
        )
        .init();

    let settings: DumpSettings = serde_saphyr::from_str(SETTINGS)?;
    let dump = BodyDumpBuilder::from_settings(settings)?
        .on_request(log_body("request"))
        .on_response(log_body("response"))
        .build();

    let app = Router::new()
        .route("/items", post(create_item))
        .route("/health", get(|| async { "ok" }))
        .layer(dump);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
