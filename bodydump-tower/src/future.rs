use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bodydump_http::{BodyHandler, PooledBuffer, ReplayBody, RequestCapture, TeeBody};
use futures::ready;
use http::request::Parts;
use http::{Request, Response};
use http_body::Body as HttpBody;
use pin_project::pin_project;
use tower::Service;

use crate::service::ResponseDump;

const POLL_AFTER_READY_ERROR: &str = "DumpFuture can't be polled after finishing";
const CAPTURE_TAKEN_ERROR: &str = "Request capture already taken from state";
const PARTS_TAKEN_ERROR: &str = "Request parts already taken from state";
const SERVICE_TAKEN_ERROR: &str = "Upstream service already taken from state";

#[pin_project(project = StateProj)]
enum State<S, ReqBody>
where
    S: Service<Request<ReplayBody<ReqBody>>>,
    ReqBody: HttpBody,
{
    /// Draining the request body into the capture buffer.
    CaptureRequest {
        #[pin]
        body: ReqBody,
        capture: Option<RequestCapture>,
        parts: Option<Parts>,
        handler: BodyHandler,
        service: Option<S>,
    },
    /// Waiting for the upstream response.
    PollUpstream {
        #[pin]
        future: S::Future,
    },
    Done,
}

/// Response future of [`DumpService`](crate::service::DumpService).
///
/// Runs the request side first: the body is drained, reported and replaced
/// before the upstream service is called. The response body is wrapped once
/// the upstream response arrives.
#[pin_project]
pub struct DumpFuture<S, ReqBody>
where
    S: Service<Request<ReplayBody<ReqBody>>>,
    ReqBody: HttpBody,
{
    #[pin]
    state: State<S, ReqBody>,
    response: Option<ResponseDump>,
}

impl<S, ReqBody> DumpFuture<S, ReqBody>
where
    S: Service<Request<ReplayBody<ReqBody>>>,
    ReqBody: HttpBody,
{
    pub(crate) fn capture_request(
        parts: Parts,
        body: ReqBody,
        buffer: PooledBuffer,
        handler: BodyHandler,
        service: S,
        response: Option<ResponseDump>,
    ) -> Self {
        DumpFuture {
            state: State::CaptureRequest {
                body,
                capture: Some(RequestCapture::new(buffer)),
                parts: Some(parts),
                handler,
                service: Some(service),
            },
            response,
        }
    }

    pub(crate) fn upstream(future: S::Future, response: Option<ResponseDump>) -> Self {
        DumpFuture {
            state: State::PollUpstream { future },
            response,
        }
    }
}

impl<S, ReqBody, ResBody> Future for DumpFuture<S, ReqBody>
where
    S: Service<Request<ReplayBody<ReqBody>>, Response = Response<ResBody>>,
    ReqBody: HttpBody,
    ResBody: HttpBody,
{
    type Output = Result<Response<TeeBody<ResBody>>, S::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        loop {
            let state = match this.state.as_mut().project() {
                StateProj::CaptureRequest {
                    body,
                    capture,
                    parts,
                    handler,
                    service,
                } => {
                    let drained = ready!(
                        capture
                            .as_mut()
                            .expect(CAPTURE_TAKEN_ERROR)
                            .poll_drain(body, cx)
                    );
                    let capture = capture.take().expect(CAPTURE_TAKEN_ERROR);
                    let parts = parts.take().expect(PARTS_TAKEN_ERROR);
                    let replay = match drained {
                        Ok(()) => capture.complete(handler, &parts),
                        Err(error) => {
                            tracing::warn!(
                                path = parts.uri.path(),
                                read = capture.bytes().len(),
                                "request body read failed, forwarding without request dump"
                            );
                            capture.fail(error)
                        }
                    };
                    let mut service = service.take().expect(SERVICE_TAKEN_ERROR);
                    State::PollUpstream {
                        future: service.call(Request::from_parts(parts, replay)),
                    }
                }
                StateProj::PollUpstream { future } => {
                    let result = ready!(future.poll(cx));
                    this.state.set(State::Done);
                    let response = this.response.take();
                    return Poll::Ready(result.map(|upstream| match response {
                        Some(dump) => dump.wrap(upstream),
                        None => upstream.map(TeeBody::passthrough),
                    }));
                }
                StateProj::Done => panic!("{}", POLL_AFTER_READY_ERROR),
            };
            this.state.set(state);
        }
    }
}

impl<S, ReqBody> fmt::Debug for DumpFuture<S, ReqBody>
where
    S: Service<Request<ReplayBody<ReqBody>>>,
    ReqBody: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::CaptureRequest { .. } => "CaptureRequest",
            State::PollUpstream { .. } => "PollUpstream",
            State::Done => "Done",
        };
        f.debug_struct("DumpFuture")
            .field("state", &state)
            .field("response", &self.response.is_some())
            .finish()
    }
}
