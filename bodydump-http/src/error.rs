//! Errors raised while turning settings into a [`DumpConfig`](crate::DumpConfig).

/// A settings entry could not be turned into a filter.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The HTTP method is not a valid token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The header name contains characters not allowed in a header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// The header value contains characters not allowed in a header value.
    #[error("invalid header value for {name}: {value}")]
    InvalidHeaderValue {
        /// Header the value was configured for.
        name: String,
        /// Rejected value.
        value: String,
    },

    /// The path pattern cannot be compiled.
    #[error("invalid path pattern {pattern}: {reason}")]
    InvalidPath {
        /// Rejected pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A list-valued filter was given an empty list.
    #[error("{0} filter requires at least one entry")]
    EmptyList(&'static str),
}
