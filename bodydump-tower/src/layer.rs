use std::fmt;
use std::sync::Arc;

use bodydump_http::{
    BodyHandler, BufferPool, ConfigError, DumpConfig, DumpConfigBuilder, DumpContext,
    DumpSettings, Filter,
};
use http::request::Parts;
use tower::Layer;

use crate::service::DumpService;

/// Tower [`Layer`] that dumps request and response bodies.
///
/// Every service produced by one layer shares its config, so filters,
/// callbacks and the buffer pool are set up once.
#[derive(Clone)]
pub struct BodyDump {
    config: Arc<DumpConfig>,
}

impl BodyDump {
    /// Layer with the given callbacks, no filters and a private pool.
    ///
    /// Passing `None` for a callback disables that half.
    pub fn new(on_request: Option<BodyHandler>, on_response: Option<BodyHandler>) -> Self {
        Self::from_config(DumpConfig::new(on_request, on_response))
    }

    /// Layer from a prepared config.
    pub fn from_config(config: DumpConfig) -> Self {
        BodyDump {
            config: Arc::new(config),
        }
    }

    /// Returns a builder.
    pub fn builder() -> BodyDumpBuilder {
        BodyDumpBuilder::default()
    }

    /// Shared config.
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }
}

impl<S> Layer<S> for BodyDump {
    type Service = DumpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DumpService::new(inner, Arc::clone(&self.config))
    }
}

impl fmt::Debug for BodyDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyDump")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`BodyDump`].
#[derive(Debug, Default)]
pub struct BodyDumpBuilder {
    config: DumpConfigBuilder,
}

impl BodyDumpBuilder {
    /// Starts from loaded settings.
    pub fn from_settings(settings: DumpSettings) -> Result<Self, ConfigError> {
        Ok(BodyDumpBuilder {
            config: settings.into_config_builder()?,
        })
    }

    /// Sets the request body callback.
    pub fn on_request<F>(self, handler: F) -> Self
    where
        F: Fn(&DumpContext<'_>, &[u8]) + Send + Sync + 'static,
    {
        BodyDumpBuilder {
            config: self.config.on_request(handler),
        }
    }

    /// Sets the response body callback.
    pub fn on_response<F>(self, handler: F) -> Self
    where
        F: Fn(&DumpContext<'_>, &[u8]) + Send + Sync + 'static,
    {
        BodyDumpBuilder {
            config: self.config.on_response(handler),
        }
    }

    /// Toggles request capture.
    pub fn capture_request(self, enabled: bool) -> Self {
        BodyDumpBuilder {
            config: self.config.capture_request(enabled),
        }
    }

    /// Toggles response capture.
    pub fn capture_response(self, enabled: bool) -> Self {
        BodyDumpBuilder {
            config: self.config.capture_response(enabled),
        }
    }

    /// Adds a filter. Requests it matches are not dumped.
    pub fn filter<F>(self, filter: F) -> Self
    where
        F: Filter<Parts> + 'static,
    {
        BodyDumpBuilder {
            config: self.config.filter(filter),
        }
    }

    /// Shares `pool` with other dumpers.
    pub fn pool(self, pool: BufferPool) -> Self {
        BodyDumpBuilder {
            config: self.config.pool(pool),
        }
    }

    /// Builds the layer.
    pub fn build(self) -> BodyDump {
        BodyDump::from_config(self.config.build())
    }
}
