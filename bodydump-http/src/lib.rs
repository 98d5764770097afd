//! HTTP building blocks shared by every bodydump host integration.
//!
//! - [`DumpContext`] - request (and, for the response callback, response)
//!   metadata handed to body callbacks alongside the captured bytes.
//! - [`DumpConfig`] - callbacks, capture toggles, filters and the buffer pool
//!   of one middleware instance. [`DumpConfig::plan`] performs the per-request
//!   filter check and tells the host what to capture.
//! - [`filters`] - path, method and header filters over `http::request::Parts`.
//! - [`settings`] - serde-loadable configuration (YAML, JSON, ...).
//! - [`body`] - `http-body` adapters: [`ReplayBody`] restores a drained request
//!   body for the downstream handler, [`TeeBody`] mirrors a response body into a
//!   capture buffer while it streams to the client.

pub mod body;
pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod settings;

pub use body::{RequestCapture, ReplayBody, ResponseCapture, TeeBody};
pub use config::{BodyHandler, DumpConfig, DumpConfigBuilder, DumpPlan, RequestFilter, body_handler};
pub use context::{DumpContext, RequestHead, ResponseView};
pub use error::ConfigError;
pub use settings::DumpSettings;

pub use bodydump_core::{BufferPool, Filter, FilterExt, Filters, PooledBuffer, filter_fn};
