//! Per-middleware configuration and the per-request dump plan.

use std::fmt;
use std::sync::Arc;

use bodydump_core::{BufferPool, Filter, Filters};
use http::request::Parts;

use crate::context::DumpContext;

/// Callback receiving a captured body.
///
/// The byte slice is only valid for the duration of the call; copy it if it
/// must outlive the callback.
pub type BodyHandler = Arc<dyn Fn(&DumpContext<'_>, &[u8]) + Send + Sync>;

/// Filter over request metadata. Returns `true` to skip dumping.
pub type RequestFilter = dyn Filter<Parts>;

/// Wraps a closure into a [`BodyHandler`].
///
/// ```
/// use bodydump_http::body_handler;
///
/// let handler = body_handler(|ctx, body| {
///     tracing::info!(path = ctx.path(), len = body.len(), "request body");
/// });
/// # let _ = handler;
/// ```
pub fn body_handler<F>(handler: F) -> BodyHandler
where
    F: Fn(&DumpContext<'_>, &[u8]) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// What the host must do for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpPlan {
    /// Nothing is configured to be captured. Filters were not evaluated.
    Bypass,
    /// A filter excluded the request.
    Filtered,
    /// Capture the selected halves.
    Capture {
        /// Drain, report and restore the request body.
        request: bool,
        /// Mirror the response body.
        response: bool,
    },
}

impl DumpPlan {
    /// `true` when the request body must be captured.
    pub fn captures_request(&self) -> bool {
        matches!(self, DumpPlan::Capture { request: true, .. })
    }

    /// `true` when the response body must be captured.
    pub fn captures_response(&self) -> bool {
        matches!(self, DumpPlan::Capture { response: true, .. })
    }
}

/// Immutable settings of one dumper instance.
///
/// A half is captured when its callback is present **and** its toggle is on.
pub struct DumpConfig {
    on_request: Option<BodyHandler>,
    on_response: Option<BodyHandler>,
    capture_request: bool,
    capture_response: bool,
    filters: Filters<Parts>,
    pool: BufferPool,
}

impl DumpConfig {
    /// Creates a config from two optional callbacks, with no filters.
    ///
    /// Either callback may be `None` to disable that half.
    pub fn new(on_request: Option<BodyHandler>, on_response: Option<BodyHandler>) -> Self {
        DumpConfig {
            on_request,
            on_response,
            capture_request: true,
            capture_response: true,
            filters: Filters::new(),
            pool: BufferPool::new(),
        }
    }

    /// Returns a builder.
    pub fn builder() -> DumpConfigBuilder {
        DumpConfigBuilder::default()
    }

    /// Request callback, if request capture is enabled.
    pub fn request_handler(&self) -> Option<&BodyHandler> {
        self.on_request.as_ref().filter(|_| self.capture_request)
    }

    /// Response callback, if response capture is enabled.
    pub fn response_handler(&self) -> Option<&BodyHandler> {
        self.on_response.as_ref().filter(|_| self.capture_response)
    }

    /// Configured filters.
    pub fn filters(&self) -> &Filters<Parts> {
        &self.filters
    }

    /// Pool capture buffers are taken from.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// `true` when nothing will ever be captured.
    pub fn is_bypass(&self) -> bool {
        self.request_handler().is_none() && self.response_handler().is_none()
    }

    /// Decides what to capture for a request.
    ///
    /// Filters are only evaluated when at least one half is enabled.
    pub fn plan(&self, parts: &Parts) -> DumpPlan {
        if self.is_bypass() {
            return DumpPlan::Bypass;
        }
        if self.filters.skip(parts) {
            tracing::debug!(
                method = %parts.method,
                path = parts.uri.path(),
                "request filtered from body dump"
            );
            return DumpPlan::Filtered;
        }
        DumpPlan::Capture {
            request: self.request_handler().is_some(),
            response: self.response_handler().is_some(),
        }
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        DumpConfig::new(None, None)
    }
}

impl fmt::Debug for DumpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpConfig")
            .field("on_request", &self.on_request.as_ref().map(|_| "..."))
            .field("on_response", &self.on_response.as_ref().map(|_| "..."))
            .field("capture_request", &self.capture_request)
            .field("capture_response", &self.capture_response)
            .field("filters", &self.filters)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Builder for [`DumpConfig`].
///
/// ```
/// use bodydump_http::DumpConfig;
/// use bodydump_http::filters::Path;
///
/// let config = DumpConfig::builder()
///     .on_request(|ctx, body| println!("{} -> {} bytes", ctx.path(), body.len()))
///     .on_response(|ctx, body| println!("{:?} <- {} bytes", ctx.status(), body.len()))
///     .filter(Path::new("/health"))
///     .build();
/// # let _ = config;
/// ```
pub struct DumpConfigBuilder {
    on_request: Option<BodyHandler>,
    on_response: Option<BodyHandler>,
    capture_request: bool,
    capture_response: bool,
    filters: Filters<Parts>,
    pool: Option<BufferPool>,
}

impl Default for DumpConfigBuilder {
    fn default() -> Self {
        Self {
            on_request: None,
            on_response: None,
            capture_request: true,
            capture_response: true,
            filters: Filters::new(),
            pool: None,
        }
    }
}

impl DumpConfigBuilder {
    /// Sets the request body callback.
    pub fn on_request<F>(self, handler: F) -> Self
    where
        F: Fn(&DumpContext<'_>, &[u8]) + Send + Sync + 'static,
    {
        self.request_handler(Some(Arc::new(handler)))
    }

    /// Sets the response body callback.
    pub fn on_response<F>(self, handler: F) -> Self
    where
        F: Fn(&DumpContext<'_>, &[u8]) + Send + Sync + 'static,
    {
        self.response_handler(Some(Arc::new(handler)))
    }

    /// Sets or clears an already shared request callback.
    pub fn request_handler(self, handler: Option<BodyHandler>) -> Self {
        DumpConfigBuilder {
            on_request: handler,
            ..self
        }
    }

    /// Sets or clears an already shared response callback.
    pub fn response_handler(self, handler: Option<BodyHandler>) -> Self {
        DumpConfigBuilder {
            on_response: handler,
            ..self
        }
    }

    /// Enables or disables request capture without touching the callback.
    pub fn capture_request(self, enabled: bool) -> Self {
        DumpConfigBuilder {
            capture_request: enabled,
            ..self
        }
    }

    /// Enables or disables response capture without touching the callback.
    pub fn capture_response(self, enabled: bool) -> Self {
        DumpConfigBuilder {
            capture_response: enabled,
            ..self
        }
    }

    /// Appends a filter. A request is skipped if any filter skips it.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Filter<Parts> + 'static,
    {
        self.filters.push(filter);
        self
    }

    /// Appends several boxed filters.
    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Box<RequestFilter>>,
    {
        self.filters.extend(filters);
        self
    }

    /// Uses an existing pool instead of creating a private one.
    pub fn pool(self, pool: BufferPool) -> Self {
        DumpConfigBuilder {
            pool: Some(pool),
            ..self
        }
    }

    /// Builds the config.
    pub fn build(self) -> DumpConfig {
        DumpConfig {
            on_request: self.on_request,
            on_response: self.on_response,
            capture_request: self.capture_request,
            capture_response: self.capture_response,
            filters: self.filters,
            pool: self.pool.unwrap_or_default(),
        }
    }
}

impl fmt::Debug for DumpConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpConfigBuilder")
            .field("capture_request", &self.capture_request)
            .field("capture_response", &self.capture_response)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
