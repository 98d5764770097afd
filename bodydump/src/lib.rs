//! Request and response body dumping for writer-based HTTP hosts.
//!
//! Hosts that hand handlers a response *writer* (rather than expecting a
//! response value back) implement [`ResponseWriter`] and call [`Handler`]s
//! with an [`Exchange`]. Wrapping a handler with a [`BodyDumper`] gives the
//! callbacks a copy of both bodies:
//!
//! - the request body is drained into a pooled buffer, reported, and replaced
//!   by a replay so the wrapped handler reads it unconsumed;
//! - the response writer is wrapped in a [`TeeWriter`] that mirrors every byte
//!   the handler writes, and the response callback runs once the handler
//!   returns.
//!
//! Filters, capture toggles and the buffer pool live in
//! [`DumpConfig`](bodydump_http::DumpConfig), shared with the tower
//! integration.
//!
//! ```
//! use bodydump::{Exchange, RequestBody, ResponseRecorder, ResponseWriter};
//! use bodydump_http::{DumpConfig, body_handler};
//! use bodydump_http::filters::Path;
//!
//! let middleware = bodydump::middleware(
//!     Some(body_handler(|ctx, body| tracing::info!(path = ctx.path(), len = body.len(), "request"))),
//!     Some(body_handler(|ctx, body| tracing::info!(status = ?ctx.status(), len = body.len(), "response"))),
//!     DumpConfig::builder().filter(Path::new("/health")),
//! );
//!
//! let handler = middleware(|exchange: Exchange<'_>| {
//!     exchange.writer.write_str("hello").unwrap();
//! });
//!
//! let mut recorder = ResponseRecorder::new();
//! let request = http::Request::get("/").body(RequestBody::Empty).unwrap();
//! bodydump::serve(&handler, request, &mut recorder);
//! assert_eq!(recorder.body(), b"hello");
//! ```

#![warn(missing_docs)]

pub mod dumper;
pub mod error;
pub mod exchange;
mod handler;
mod recorder;
mod tee;
pub mod writer;

pub use dumper::{BodyDumper, DumpHandler, middleware};
pub use error::{TeeError, is_short_write};
pub use exchange::{Exchange, RequestBody};
pub use handler::{Handler, serve};
pub use recorder::ResponseRecorder;
pub use tee::TeeWriter;
pub use writer::ResponseWriter;
