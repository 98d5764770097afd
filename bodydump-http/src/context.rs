//! Metadata handed to body callbacks.

use http::{HeaderMap, Method, StatusCode, Uri, Version, request::Parts};

/// Owned copy of the request line and headers.
///
/// Kept alive past the point where the request itself is handed to the
/// downstream service, so the response callback can still see what was asked.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// HTTP version.
    pub version: Version,
    /// Request headers.
    pub headers: HeaderMap,
}

impl From<&Parts> for RequestHead {
    fn from(parts: &Parts) -> Self {
        RequestHead {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }
}

/// Response metadata visible to the response callback.
#[derive(Debug, Clone, Copy)]
pub struct ResponseView<'a> {
    status: StatusCode,
    headers: &'a HeaderMap,
}

impl<'a> ResponseView<'a> {
    /// Creates a view over a response status and headers.
    pub fn new(status: StatusCode, headers: &'a HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }
}

/// Borrowed view of the exchange a captured body belongs to.
///
/// Only valid for the duration of the callback, like the body bytes passed
/// next to it.
#[derive(Debug, Clone, Copy)]
pub struct DumpContext<'a> {
    method: &'a Method,
    uri: &'a Uri,
    version: Version,
    headers: &'a HeaderMap,
    response: Option<ResponseView<'a>>,
}

impl<'a> DumpContext<'a> {
    /// Context for a request that is still in its original parts.
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self {
            method: &parts.method,
            uri: &parts.uri,
            version: parts.version,
            headers: &parts.headers,
            response: None,
        }
    }

    /// Context built from a detached [`RequestHead`].
    pub fn from_head(head: &'a RequestHead) -> Self {
        Self {
            method: &head.method,
            uri: &head.uri,
            version: head.version,
            headers: &head.headers,
            response: None,
        }
    }

    /// Attaches response metadata.
    pub fn with_response(mut self, response: ResponseView<'a>) -> Self {
        self.response = Some(response);
        self
    }

    /// Request method.
    pub fn method(&self) -> &'a Method {
        self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &'a Uri {
        self.uri
    }

    /// Request path.
    pub fn path(&self) -> &'a str {
        self.uri.path()
    }

    /// Request HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Request headers.
    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Response metadata, present only for the response callback.
    pub fn response(&self) -> Option<ResponseView<'a>> {
        self.response
    }

    /// Response status, present only for the response callback.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.map(|response| response.status())
    }
}
