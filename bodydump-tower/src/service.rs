use std::fmt;
use std::mem;
use std::sync::Arc;
use std::task::{Context, Poll};

use bodydump_http::{
    BodyHandler, BufferPool, DumpConfig, DumpPlan, ReplayBody, RequestHead, ResponseCapture,
    TeeBody,
};
use http::{Request, Response};
use http_body::Body as HttpBody;
use tower::Service;

use crate::future::DumpFuture;

/// Service produced by [`BodyDump`](crate::BodyDump).
///
/// The wrapped service receives a [`ReplayBody`] and the response body is
/// wrapped in a [`TeeBody`]; both forward the original bytes unchanged when
/// nothing is captured.
pub struct DumpService<S> {
    inner: S,
    config: Arc<DumpConfig>,
}

impl<S> DumpService<S> {
    /// Wraps `inner`.
    pub fn new(inner: S, config: Arc<DumpConfig>) -> Self {
        DumpService { inner, config }
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S> Clone for DumpService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> fmt::Debug for DumpService<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpService")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .finish()
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DumpService<S>
where
    S: Service<Request<ReplayBody<ReqBody>>, Response = Response<ResBody>> + Clone,
    ReqBody: HttpBody,
    ResBody: HttpBody,
{
    type Response = Response<TeeBody<ResBody>>;
    type Error = S::Error;
    type Future = DumpFuture<S, ReqBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The clone is not guaranteed to be ready; the one polled above is.
        let clone = self.inner.clone();
        let mut inner = mem::replace(&mut self.inner, clone);

        let (parts, body) = request.into_parts();
        let (on_request, on_response) = match self.config.plan(&parts) {
            DumpPlan::Bypass | DumpPlan::Filtered => {
                let request = Request::from_parts(parts, ReplayBody::passthrough(body));
                return DumpFuture::upstream(inner.call(request), None);
            }
            DumpPlan::Capture { request, response } => (
                self.config.request_handler().filter(|_| request),
                self.config.response_handler().filter(|_| response),
            ),
        };
        tracing::debug!(
            method = %parts.method,
            path = parts.uri.path(),
            request = on_request.is_some(),
            response = on_response.is_some(),
            "dumping bodies"
        );

        let response = on_response.map(|handler| ResponseDump {
            handler: Arc::clone(handler),
            request: RequestHead::from(&parts),
            pool: self.config.pool().clone(),
        });

        match on_request {
            Some(handler) => DumpFuture::capture_request(
                parts,
                body,
                self.config.pool().acquire(),
                Arc::clone(handler),
                inner,
                response,
            ),
            None => {
                let request = Request::from_parts(parts, ReplayBody::passthrough(body));
                DumpFuture::upstream(inner.call(request), response)
            }
        }
    }
}

/// What the response side needs once the upstream response arrives.
pub(crate) struct ResponseDump {
    handler: BodyHandler,
    request: RequestHead,
    pool: BufferPool,
}

impl ResponseDump {
    pub(crate) fn wrap<B>(self, response: Response<B>) -> Response<TeeBody<B>>
    where
        B: HttpBody,
    {
        let (parts, body) = response.into_parts();
        let capture = ResponseCapture::new(
            self.pool.acquire(),
            self.handler,
            self.request,
            parts.status,
            parts.headers.clone(),
        );
        Response::from_parts(parts, TeeBody::capture(body, capture))
    }
}
