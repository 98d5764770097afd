#![warn(missing_docs)]
//! # bodydump-core
//!
//! Protocol-agnostic building blocks for the bodydump middleware.
//!
//! This crate knows nothing about HTTP. It provides the two pieces every host
//! integration shares:
//!
//! - **[`BufferPool`]** - reusable capture buffers, amortizing allocation across
//!   requests. Buffers are handed out as [`PooledBuffer`] guards which return
//!   themselves to the pool on drop, so a buffer can never leak past the request
//!   that borrowed it.
//! - **[`Filter`]** - a cheap, synchronous test over request metadata deciding
//!   whether a request is *excluded* from dumping, together with the
//!   [`FilterExt`] combinators and the [`Filters`] list.
//!
//! Protocol-specific types (the callback context, HTTP filters, body adapters)
//! live in `bodydump-http`.

pub mod filter;
pub mod pool;

pub use filter::{
    And, BoxFilter, Filter, FilterExt, FilterFn, Filters, Keep, Not, Or, filter_fn,
};
pub use pool::{BufferPool, BufferPoolBuilder, PoolSettings, PoolStats, PooledBuffer};
