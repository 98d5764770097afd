//! Writer Host Example
//!
//! Wraps a writer-based handler with a body dumper and drives a few requests
//! through an in-memory recorder.
//!
//! Run:
//!   cargo run -p bodydump-demos --example writer

use std::io::Write;

use bodydump::{Exchange, RequestBody, ResponseRecorder, ResponseWriter};
use bodydump_http::filters::Method;
use bodydump_http::{DumpConfig, body_handler};
use http::{HeaderValue, Request, StatusCode, header};
use tracing_subscriber::EnvFilter;

fn upper(mut exchange: Exchange<'_>) {
    let input = match exchange.read_body() {
        Ok(input) => input,
        Err(error) => {
            exchange.writer.write_status(StatusCode::BAD_REQUEST);
            let _ = write!(exchange.writer, "{error}");
            return;
        }
    };
    exchange
        .writer
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    exchange.writer.write_status(StatusCode::OK);
    let _ = exchange.writer.write_all(&input.to_ascii_uppercase());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = DumpConfig::builder().filter(Method::new(http::Method::HEAD));
    let middleware = bodydump::middleware(
        Some(body_handler(|ctx, body| {
            tracing::info!(path = ctx.path(), body = %String::from_utf8_lossy(body), "request");
        })),
        Some(body_handler(|ctx, body| {
            tracing::info!(
                path = ctx.path(),
                status = ?ctx.status(),
                body = %String::from_utf8_lossy(body),
                "response"
            );
        })),
        config,
    );
    let handler = middleware(upper);

    for (method, body) in [("POST", "hello"), ("PUT", "dumped twice"), ("HEAD", "skipped")] {
        let request = Request::builder()
            .method(method)
            .uri("/upper")
            .body(RequestBody::from(body))
            .expect("static request");
        let mut recorder = ResponseRecorder::new();
        bodydump::serve(&handler, request, &mut recorder);
        let response = recorder.into_response();
        println!("{method} -> {} {:?}", response.status(), response.body());
    }
}
