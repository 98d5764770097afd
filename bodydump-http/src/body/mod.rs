//! `http-body` adapters used by streaming hosts.
//!
//! # Request side
//!
//! A request body is a single-read stream. To report it and still hand an
//! unconsumed body to the downstream service, the host drains it into a
//! [`RequestCapture`] and then replaces it with a [`ReplayBody`]:
//!
//! - **Complete**: the body was fully read; the replay yields the same bytes
//!   and trailers.
//! - **Partial**: reading failed; the replay yields the prefix that was read
//!   and then the very same error, so the downstream service observes exactly
//!   what it would have seen without the dumper.
//! - **Passthrough**: the body was not touched.
//!
//! # Response side
//!
//! A [`TeeBody`] forwards every frame of the response body unchanged and
//! mirrors data frames into a [`ResponseCapture`]. The response callback runs
//! once the stream ends (or fails). A body dropped before completion releases
//! its buffer without invoking the callback.

mod capture;
mod replay;
mod tee;

pub use capture::{RequestCapture, ResponseCapture};
pub use replay::ReplayBody;
pub use tee::TeeBody;

use bytes::{Buf, Bytes};
use http_body::Frame;

/// Flattens a data frame of any `Buf` into `Bytes`.
pub(crate) fn into_bytes_frame<D: Buf>(frame: Frame<D>) -> Frame<Bytes> {
    frame.map_data(|mut data| data.copy_to_bytes(data.remaining()))
}
