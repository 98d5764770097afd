use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::ready;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

use super::{ResponseCapture, into_bytes_frame};

/// Response body that mirrors its data frames into a capture buffer.
///
/// Frames reach the client unchanged and in order. The callback held by the
/// [`ResponseCapture`] runs exactly once: when the inner body ends, or when it
/// yields an error (with the bytes forwarded so far).
#[pin_project(project = TeeBodyProj)]
pub enum TeeBody<B> {
    /// No capture for this response.
    Passthrough(#[pin] B),

    /// Capturing. `capture` is taken when the callback runs.
    Capturing {
        /// The handler's response body.
        #[pin]
        inner: B,
        /// Pending capture.
        capture: Option<ResponseCapture>,
    },
}

impl<B> TeeBody<B>
where
    B: HttpBody,
{
    /// Forwards `body` without capturing.
    pub fn passthrough(body: B) -> Self {
        TeeBody::Passthrough(body)
    }

    /// Mirrors `body` into `capture`.
    ///
    /// A body that is already at its end will never be polled by some servers,
    /// so the callback runs right away and the body is forwarded as is.
    pub fn capture(body: B, capture: ResponseCapture) -> Self {
        if body.is_end_stream() {
            capture.finish();
            return TeeBody::Passthrough(body);
        }
        TeeBody::Capturing {
            inner: body,
            capture: Some(capture),
        }
    }
}

impl<B> HttpBody for TeeBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            TeeBodyProj::Passthrough(body) => {
                let frame = ready!(body.poll_frame(cx));
                Poll::Ready(frame.map(|frame| frame.map(into_bytes_frame)))
            }
            TeeBodyProj::Capturing { mut inner, capture } => {
                match ready!(inner.as_mut().poll_frame(cx)) {
                    Some(Ok(frame)) => {
                        let frame = into_bytes_frame(frame);
                        if let (Some(pending), Some(data)) = (capture.as_mut(), frame.data_ref()) {
                            pending.mirror(data);
                        }
                        if inner.is_end_stream() {
                            if let Some(pending) = capture.take() {
                                pending.finish();
                            }
                        }
                        Poll::Ready(Some(Ok(frame)))
                    }
                    Some(Err(error)) => {
                        if let Some(pending) = capture.take() {
                            tracing::debug!(
                                captured = pending.bytes().len(),
                                "response body failed, reporting bytes forwarded so far"
                            );
                            pending.finish();
                        }
                        Poll::Ready(Some(Err(error)))
                    }
                    None => {
                        if let Some(pending) = capture.take() {
                            pending.finish();
                        }
                        Poll::Ready(None)
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            TeeBody::Passthrough(body) => body.size_hint(),
            TeeBody::Capturing { inner, .. } => inner.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            TeeBody::Passthrough(body) => body.is_end_stream(),
            TeeBody::Capturing { inner, capture } => capture.is_none() && inner.is_end_stream(),
        }
    }
}

impl<B> fmt::Debug for TeeBody<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeeBody::Passthrough(_) => f.debug_tuple("Passthrough").field(&"...").finish(),
            TeeBody::Capturing { capture, .. } => f
                .debug_struct("Capturing")
                .field("capture", capture)
                .finish_non_exhaustive(),
        }
    }
}
