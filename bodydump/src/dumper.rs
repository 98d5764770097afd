//! The dump coordinator for writer-based hosts.

use std::fmt;
use std::mem;
use std::sync::Arc;

use bodydump_http::{
    BodyHandler, DumpConfig, DumpConfigBuilder, DumpContext, DumpPlan, ResponseView,
};
use http::StatusCode;
use http::request::Parts;

use crate::exchange::{Exchange, RequestBody};
use crate::handler::Handler;
use crate::tee::TeeWriter;
use crate::writer::ResponseWriter;

/// Dumps request and response bodies of the handlers it wraps.
///
/// Cheap to clone; every wrapped handler shares the same config and pool.
///
/// If reading the request body fails, the request callback is skipped and the
/// wrapped handler reads the bytes drained so far followed by the original error.
///
/// ```
/// use bodydump::{BodyDumper, Exchange, RequestBody, ResponseRecorder, ResponseWriter};
/// use bodydump_http::body_handler;
///
/// let dumper = BodyDumper::new(
///     Some(body_handler(|ctx, body| println!("{} sent {} bytes", ctx.path(), body.len()))),
///     None,
/// );
/// let handler = dumper.wrap(|exchange: Exchange<'_>| {
///     exchange.writer.read_from(exchange.body).unwrap();
/// });
///
/// let mut recorder = ResponseRecorder::new();
/// let request = http::Request::post("/echo").body(RequestBody::from("ping")).unwrap();
/// bodydump::serve(&handler, request, &mut recorder);
/// assert_eq!(recorder.body(), b"ping");
/// ```
#[derive(Clone)]
pub struct BodyDumper {
    config: Arc<DumpConfig>,
}

impl BodyDumper {
    /// Dumper with the given callbacks, no filters and a private pool.
    ///
    /// Passing `None` for a callback disables that half.
    pub fn new(on_request: Option<BodyHandler>, on_response: Option<BodyHandler>) -> Self {
        Self::with_config(DumpConfig::new(on_request, on_response))
    }

    /// Dumper with a full config.
    pub fn with_config(config: DumpConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Shared config.
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Wraps `handler`.
    pub fn wrap<H>(&self, handler: H) -> DumpHandler<H>
    where
        H: Handler,
    {
        DumpHandler {
            inner: handler,
            config: Arc::clone(&self.config),
        }
    }
}

impl fmt::Debug for BodyDumper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyDumper")
            .field("config", &self.config)
            .finish()
    }
}

/// Builds a middleware function from two optional callbacks and a config.
///
/// Callbacks given here replace any set on `config`.
pub fn middleware<H>(
    on_request: Option<BodyHandler>,
    on_response: Option<BodyHandler>,
    config: DumpConfigBuilder,
) -> impl Fn(H) -> DumpHandler<H> + Clone
where
    H: Handler,
{
    let dumper = BodyDumper::with_config(
        config
            .request_handler(on_request)
            .response_handler(on_response)
            .build(),
    );
    move |handler: H| dumper.wrap(handler)
}

/// A handler wrapped by a [`BodyDumper`].
pub struct DumpHandler<H> {
    inner: H,
    config: Arc<DumpConfig>,
}

impl<H> DumpHandler<H> {
    /// The wrapped handler.
    pub fn get_ref(&self) -> &H {
        &self.inner
    }
}

impl<H> Handler for DumpHandler<H>
where
    H: Handler,
{
    fn serve(&self, exchange: Exchange<'_>) {
        let plan = self.config.plan(&*exchange.parts);
        let (on_request, on_response) = match plan {
            DumpPlan::Bypass | DumpPlan::Filtered => return self.inner.serve(exchange),
            DumpPlan::Capture { request, response } => (
                self.config.request_handler().filter(|_| request),
                self.config.response_handler().filter(|_| response),
            ),
        };
        tracing::debug!(
            path = exchange.parts.uri.path(),
            request = on_request.is_some(),
            response = on_response.is_some(),
            "dumping bodies"
        );

        let Exchange {
            parts,
            body,
            writer,
        } = exchange;

        if let Some(handler) = on_request {
            self.capture_request(handler, &*parts, &mut *body);
        }

        match on_response {
            Some(handler) => {
                let mut tee = TeeWriter::new(&mut *writer, self.config.pool().acquire());
                self.inner.serve(Exchange::new(&mut *parts, &mut *body, &mut tee));

                let status = tee.status().unwrap_or(StatusCode::OK);
                let ctx = DumpContext::from_parts(&*parts)
                    .with_response(ResponseView::new(status, tee.headers()));
                handler(&ctx, tee.captured());
            }
            None => self.inner.serve(Exchange::new(&mut *parts, &mut *body, writer)),
        }

        if on_request.is_some() {
            // Releases the replay buffer.
            drop(mem::take(body));
        }
    }
}

impl<H> DumpHandler<H>
where
    H: Handler,
{
    /// Drains the request body, reports it and installs a replay.
    ///
    /// A read failure skips the callback. The downstream handler then reads
    /// the bytes that were drained, followed by the same error.
    fn capture_request(&self, handler: &BodyHandler, parts: &Parts, body: &mut RequestBody) {
        let pool = self.config.pool();
        let mut captured = pool.acquire();
        match captured.read_from(body) {
            Ok(_) => {
                let mut replay = pool.acquire();
                replay.extend_from_slice(&captured);
                handler(&DumpContext::from_parts(parts), &captured);
                drop(captured);
                *body = RequestBody::replay(replay);
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    path = parts.uri.path(),
                    read = captured.len(),
                    "request body read failed, forwarding without request dump"
                );
                *body = RequestBody::partial(captured, error);
            }
        }
    }
}

impl<H> fmt::Debug for DumpHandler<H>
where
    H: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpHandler")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .finish()
    }
}
