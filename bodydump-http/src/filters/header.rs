use bodydump_core::Filter;
use http::request::Parts;
use http::{HeaderName, HeaderValue};

/// Skips requests carrying a header, optionally with an exact value.
///
/// ```
/// use bodydump_core::Filter;
/// use bodydump_http::filters::Header;
///
/// let skip = Header::equals(
///     http::header::CONTENT_TYPE,
///     http::HeaderValue::from_static("multipart/form-data"),
/// );
/// let (parts, _) = http::Request::post("/upload")
///     .header("content-type", "multipart/form-data")
///     .body(())
///     .unwrap()
///     .into_parts();
/// assert!(skip.skip(&parts));
/// ```
#[derive(Debug, Clone)]
pub struct Header {
    name: HeaderName,
    value: Option<HeaderValue>,
}

impl Header {
    /// Matches when the header is present, whatever its value.
    pub fn present(name: HeaderName) -> Self {
        Self { name, value: None }
    }

    /// Matches when any value of the header equals `value`.
    pub fn equals(name: HeaderName, value: HeaderValue) -> Self {
        Self {
            name,
            value: Some(value),
        }
    }
}

impl Filter<Parts> for Header {
    fn skip(&self, parts: &Parts) -> bool {
        match &self.value {
            None => parts.headers.contains_key(&self.name),
            Some(expected) => parts
                .headers
                .get_all(&self.name)
                .iter()
                .any(|value| value == expected),
        }
    }
}
