//! Serializable dumper settings.
//!
//! Everything except the callbacks can be loaded from a configuration file.
//! Filter entries use the externally tagged form:
//!
//! ```yaml
//! request: true
//! response: false
//! skip:
//!   - Path: "/health"
//!   - Path:
//!       in:
//!         - "/static/{tail}*"
//!         - "/favicon.ico"
//!   - Method: OPTIONS
//!   - Header:
//!       name: x-no-dump
//!   - Header:
//!       name: content-type
//!       value: multipart/form-data
//! pool:
//!   buffer_capacity: 16384
//!   max_idle: 64
//! ```
//!
//! Turn settings into a config with [`DumpSettings::into_config_builder`] and
//! attach the callbacks to the returned builder.

use bodydump_core::{BufferPool, FilterExt, PoolSettings};
use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::{DumpConfigBuilder, RequestFilter};
use crate::error::ConfigError;
use crate::filters::{Header, Method, Path};

/// One value or a list of values: `"GET"` or `{ in: ["GET", "HEAD"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// Single entry.
    One(String),
    /// Several entries, any of which matches.
    In {
        /// Entries.
        r#in: Vec<String>,
    },
}

impl OneOrMany {
    fn into_vec(self, kind: &'static str) -> Result<Vec<String>, ConfigError> {
        let values = match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::In { r#in } => r#in,
        };
        if values.is_empty() {
            return Err(ConfigError::EmptyList(kind));
        }
        Ok(values)
    }
}

/// Header filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSettings {
    /// Header name.
    pub name: String,
    /// Exact value to match. Any value matches when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A filter entry. Matching requests are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSettings {
    /// Path patterns.
    Path(OneOrMany),
    /// HTTP methods.
    Method(OneOrMany),
    /// Header presence or value.
    Header(HeaderSettings),
}

impl FilterSettings {
    /// Builds the filter this entry describes.
    pub fn into_filter(self) -> Result<Box<RequestFilter>, ConfigError> {
        match self {
            FilterSettings::Path(patterns) => {
                Ok(Path::try_any_of(patterns.into_vec("Path")?)?.boxed())
            }
            FilterSettings::Method(methods) => {
                let methods = methods
                    .into_vec("Method")?
                    .into_iter()
                    .map(|method| {
                        http::Method::from_bytes(method.as_bytes())
                            .map_err(|_| ConfigError::InvalidMethod(method))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Method::any_of(methods).boxed())
            }
            FilterSettings::Header(HeaderSettings { name, value }) => {
                let header_name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))?;
                match value {
                    None => Ok(Header::present(header_name).boxed()),
                    Some(value) => {
                        let header_value = HeaderValue::from_str(&value)
                            .map_err(|_| ConfigError::InvalidHeaderValue { name, value })?;
                        Ok(Header::equals(header_name, header_value).boxed())
                    }
                }
            }
        }
    }
}

/// Serializable part of a [`DumpConfig`](crate::DumpConfig).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpSettings {
    /// Capture request bodies when a request callback is attached.
    pub request: bool,
    /// Capture response bodies when a response callback is attached.
    pub response: bool,
    /// Requests matching any entry are not dumped.
    pub skip: Vec<FilterSettings>,
    /// Capture buffer pool sizing.
    pub pool: PoolSettings,
}

impl Default for DumpSettings {
    fn default() -> Self {
        Self {
            request: true,
            response: true,
            skip: Vec::new(),
            pool: PoolSettings::default(),
        }
    }
}

impl DumpSettings {
    /// Builds every filter and returns a builder ready for callbacks.
    pub fn into_config_builder(self) -> Result<DumpConfigBuilder, ConfigError> {
        let filters = self
            .skip
            .into_iter()
            .map(FilterSettings::into_filter)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DumpConfigBuilder::default()
            .capture_request(self.request)
            .capture_response(self.response)
            .filters(filters)
            .pool(BufferPool::with_settings(self.pool)))
    }
}
