use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::ready;
use http::HeaderMap;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

use super::into_bytes_frame;

/// Request body handed to the downstream service after capture.
#[pin_project(project = ReplayBodyProj)]
pub enum ReplayBody<B>
where
    B: HttpBody,
{
    /// The original body was fully drained.
    ///
    /// Each `Option` is taken when yielded, so data and trailers are produced once.
    Complete {
        /// Captured payload.
        data: Option<Bytes>,
        /// Captured trailers.
        trailers: Option<HeaderMap>,
    },

    /// Draining failed after `prefix` was read.
    ///
    /// Yields the prefix, then the error, then ends.
    Partial {
        /// Bytes read before the failure.
        prefix: Option<Bytes>,
        /// The failure, yielded once.
        error: Option<B::Error>,
    },

    /// The original body, untouched.
    Passthrough(#[pin] B),
}

impl<B> ReplayBody<B>
where
    B: HttpBody,
{
    /// Replays a fully drained body.
    pub fn complete(data: Bytes, trailers: Option<HeaderMap>) -> Self {
        ReplayBody::Complete {
            data: Some(data).filter(|data| !data.is_empty()),
            trailers,
        }
    }

    /// Replays a prefix followed by the error that interrupted draining.
    pub fn partial(prefix: Bytes, error: B::Error) -> Self {
        ReplayBody::Partial {
            prefix: Some(prefix).filter(|prefix| !prefix.is_empty()),
            error: Some(error),
        }
    }

    /// Forwards the original body.
    pub fn passthrough(body: B) -> Self {
        ReplayBody::Passthrough(body)
    }
}

impl<B> HttpBody for ReplayBody<B>
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
            ReplayBodyProj::Complete { data, trailers } => {
                if let Some(bytes) = data.take() {
                    return Poll::Ready(Some(Ok(Frame::data(bytes))));
                }
                Poll::Ready(trailers.take().map(|trailers| Ok(Frame::trailers(trailers))))
            }
            ReplayBodyProj::Partial { prefix, error } => {
                if let Some(bytes) = prefix.take() {
                    return Poll::Ready(Some(Ok(Frame::data(bytes))));
                }
                Poll::Ready(error.take().map(Err))
            }
            ReplayBodyProj::Passthrough(body) => {
                let frame = ready!(body.poll_frame(cx));
                Poll::Ready(frame.map(|frame| frame.map(into_bytes_frame)))
            }
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            ReplayBody::Complete { data, .. } => {
                SizeHint::with_exact(data.as_ref().map_or(0, |data| data.len() as u64))
            }
            ReplayBody::Partial { prefix, .. } => {
                SizeHint::with_exact(prefix.as_ref().map_or(0, |prefix| prefix.len() as u64))
            }
            ReplayBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            ReplayBody::Complete { data, trailers } => data.is_none() && trailers.is_none(),
            ReplayBody::Partial { prefix, error } => prefix.is_none() && error.is_none(),
            ReplayBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}

impl<B> fmt::Debug for ReplayBody<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayBody::Complete { data, trailers } => f
                .debug_struct("Complete")
                .field("len", &data.as_ref().map_or(0, Bytes::len))
                .field("trailers", &trailers.is_some())
                .finish(),
            ReplayBody::Partial { prefix, error } => f
                .debug_struct("Partial")
                .field("prefix_len", &prefix.as_ref().map_or(0, Bytes::len))
                .field("error", &error.is_some())
                .finish(),
            ReplayBody::Passthrough(_) => f.debug_tuple("Passthrough").field(&"...").finish(),
        }
    }
}
