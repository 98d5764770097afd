//! Tower middleware that tees request and response bodies into callbacks.
//!
//! [`BodyDump`] is a Tower [`Layer`](tower::Layer). For every request it
//! checks the configured filters, then:
//!
//! - **request side**: drains the body into a pooled buffer, calls the request
//!   callback, and hands the inner service a [`ReplayBody`] yielding the same
//!   bytes and trailers. If reading fails, the callback is skipped and the
//!   inner service sees the bytes that were read followed by the same error;
//! - **response side**: wraps the response body in a [`TeeBody`] that mirrors
//!   every data frame on its way to the client and calls the response callback
//!   once the body ends.
//!
//! Callbacks receive a [`DumpContext`] and a byte slice that is only valid for
//! the duration of the call.
//!
//! ```
//! use bodydump_http::filters::Path;
//! use bodydump_tower::BodyDump;
//! use tower::ServiceBuilder;
//!
//! let layer = BodyDump::builder()
//!     .on_request(|ctx, body| tracing::info!(path = ctx.path(), len = body.len(), "request body"))
//!     .on_response(|ctx, body| tracing::info!(status = ?ctx.status(), len = body.len(), "response body"))
//!     .filter(Path::new("/health"))
//!     .build();
//!
//! let builder = ServiceBuilder::new().layer(layer);
//! # let _ = builder;
//! ```
//!
//! # Main Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BodyDump`] | Tower `Layer`, the entry point |
//! | [`BodyDumpBuilder`] | Builder for callbacks, filters, toggles and the pool |
//! | [`DumpService`] | The wrapping `Service` |
//! | [`DumpFuture`] | Response future running the per-request state machine |

#![warn(missing_docs)]

/// Response future of the dump service.
pub mod future;
/// Tower layer and builder.
pub mod layer;
/// The Tower service.
pub mod service;

pub use bodydump_http::{
    BodyHandler, DumpConfig, DumpContext, DumpSettings, ReplayBody, TeeBody, body_handler,
};
pub use future::DumpFuture;
pub use layer::{BodyDump, BodyDumpBuilder};
pub use service::DumpService;
