//! Filters over request metadata.
//!
//! All filters here implement [`Filter<Parts>`](bodydump_core::Filter) and
//! return `true` (skip) when the request **matches**. Combine them with
//! [`FilterExt`](bodydump_core::FilterExt):
//!
//! ```
//! use bodydump_core::{Filter, FilterExt};
//! use bodydump_http::filters::{Method, Path};
//!
//! // Skip static assets, and everything that is not a POST.
//! let skip = Path::new("/static/{tail}*").or(Method::new(http::Method::POST).not());
//!
//! let (post_api, _) = http::Request::post("/api/users").body(()).unwrap().into_parts();
//! let (get_api, _) = http::Request::get("/api/users").body(()).unwrap().into_parts();
//! assert!(!skip.skip(&post_api));
//! assert!(skip.skip(&get_api));
//! ```
//!
//! | Filter | Matches on |
//! |--------|------------|
//! | [`Path`] | URL path against actix-router patterns |
//! | [`Method`] | one of several HTTP methods |
//! | [`Header`] | header presence or exact value |

pub mod header;
pub mod method;
pub mod path;

pub use header::Header;
pub use method::Method;
pub use path::Path;
