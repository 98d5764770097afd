use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bodydump_core::PooledBuffer;
use bytes::{Buf, Bytes};
use futures::ready;
use http::{HeaderMap, StatusCode, request::Parts};
use http_body::{Body as HttpBody, Frame};

use super::ReplayBody;
use crate::config::BodyHandler;
use crate::context::{DumpContext, RequestHead, ResponseView};

/// Accumulates a request body while it is being drained.
pub struct RequestCapture {
    buffer: PooledBuffer,
    trailers: Option<HeaderMap>,
}

impl RequestCapture {
    /// Starts a capture into a pooled buffer.
    pub fn new(buffer: PooledBuffer) -> Self {
        Self {
            buffer,
            trailers: None,
        }
    }

    /// Appends a data frame, or records trailers.
    pub fn push<D: Buf>(&mut self, frame: Frame<D>) {
        match frame.into_data() {
            Ok(mut data) => {
                while data.has_remaining() {
                    let chunk = data.chunk();
                    let len = chunk.len();
                    self.buffer.extend_from_slice(chunk);
                    data.advance(len);
                }
            }
            Err(frame) => {
                if let Ok(trailers) = frame.into_trailers() {
                    match &mut self.trailers {
                        Some(existing) => existing.extend(trailers),
                        None => self.trailers = Some(trailers),
                    }
                }
            }
        }
    }

    /// Drives `body` to its end, capturing every frame.
    ///
    /// Resolves to `Err` with the body's error if a frame fails; the bytes read
    /// so far stay captured.
    pub fn poll_drain<B>(
        &mut self,
        mut body: Pin<&mut B>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), B::Error>>
    where
        B: HttpBody,
    {
        loop {
            match ready!(body.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => self.push(frame),
                Some(Err(error)) => return Poll::Ready(Err(error)),
                None => return Poll::Ready(Ok(())),
            }
        }
    }

    /// Captured bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Reports the captured body to `handler` and returns a replay of it.
    ///
    /// The capture buffer goes back to the pool; the replay owns a copy.
    pub fn complete<B>(self, handler: &BodyHandler, parts: &Parts) -> ReplayBody<B>
    where
        B: HttpBody,
    {
        handler(&DumpContext::from_parts(parts), &self.buffer);
        ReplayBody::complete(Bytes::copy_from_slice(&self.buffer), self.trailers)
    }

    /// Abandons the capture after a read failure.
    ///
    /// No callback runs. The replay yields the bytes read so far followed by
    /// `error`, exactly as the untouched body would have.
    pub fn fail<B>(self, error: B::Error) -> ReplayBody<B>
    where
        B: HttpBody,
    {
        ReplayBody::partial(Bytes::copy_from_slice(&self.buffer), error)
    }
}

impl fmt::Debug for RequestCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCapture")
            .field("len", &self.buffer.len())
            .field("trailers", &self.trailers.is_some())
            .finish()
    }
}

/// Accumulates a response body while it streams to the client.
pub struct ResponseCapture {
    buffer: PooledBuffer,
    handler: BodyHandler,
    request: RequestHead,
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseCapture {
    /// Starts a capture for a response to `request`.
    pub fn new(
        buffer: PooledBuffer,
        handler: BodyHandler,
        request: RequestHead,
        status: StatusCode,
        headers: HeaderMap,
    ) -> Self {
        Self {
            buffer,
            handler,
            request,
            status,
            headers,
        }
    }

    /// Appends bytes that were forwarded to the client.
    pub fn mirror(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Captured bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Runs the response callback and releases the buffer.
    pub fn finish(self) {
        let ctx = DumpContext::from_head(&self.request)
            .with_response(ResponseView::new(self.status, &self.headers));
        (self.handler)(&ctx, &self.buffer);
    }
}

impl fmt::Debug for ResponseCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCapture")
            .field("len", &self.buffer.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
