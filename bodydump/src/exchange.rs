//! Per-request context handed to handlers.

use std::fmt;
use std::io::{self, Cursor, Read};

use bodydump_core::PooledBuffer;
use bytes::{Buf, Bytes};
use http::request::Parts;

use crate::writer::ResponseWriter;

/// Readable request body.
///
/// Handlers read it once. A dumper that captured the body swaps in a replay so
/// the next handler still sees the whole body.
#[derive(Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A body read straight from the host.
    Stream(Box<dyn Read + Send>),
    /// A body that was captured and is read back from a pooled buffer.
    Replay(Cursor<PooledBuffer>),
    /// A body whose capture failed: yields the bytes read before the failure,
    /// then that failure.
    Partial {
        /// Bytes read before the failure.
        prefix: Cursor<PooledBuffer>,
        /// The failure, returned once.
        error: Option<io::Error>,
    },
}

impl RequestBody {
    /// Wraps any reader.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        RequestBody::Stream(Box::new(reader))
    }

    /// Replays a captured body.
    pub fn replay(buffer: PooledBuffer) -> Self {
        RequestBody::Replay(Cursor::new(buffer))
    }

    /// Replays `prefix`, then fails with `error`.
    pub fn partial(prefix: PooledBuffer, error: io::Error) -> Self {
        RequestBody::Partial {
            prefix: Cursor::new(prefix),
            error: Some(error),
        }
    }

    /// `true` for [`RequestBody::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

impl Read for RequestBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            RequestBody::Empty => Ok(0),
            RequestBody::Stream(reader) => reader.read(buf),
            RequestBody::Replay(cursor) => cursor.read(buf),
            RequestBody::Partial { prefix, error } => {
                let read = prefix.read(buf)?;
                if read > 0 || buf.is_empty() {
                    return Ok(read);
                }
                error.take().map_or(Ok(0), Err)
            }
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(body: Vec<u8>) -> Self {
        RequestBody::from_reader(Cursor::new(body))
    }
}

impl From<Bytes> for RequestBody {
    fn from(body: Bytes) -> Self {
        RequestBody::from_reader(body.reader())
    }
}

impl From<&'static str> for RequestBody {
    fn from(body: &'static str) -> Self {
        RequestBody::from(Bytes::from_static(body.as_bytes()))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Stream(_) => f.debug_tuple("Stream").field(&"...").finish(),
            RequestBody::Replay(cursor) => f
                .debug_struct("Replay")
                .field("len", &cursor.get_ref().len())
                .field("position", &cursor.position())
                .finish(),
            RequestBody::Partial { prefix, error } => f
                .debug_struct("Partial")
                .field("prefix_len", &prefix.get_ref().len())
                .field("error", error)
                .finish(),
        }
    }
}

/// One request/response exchange as seen by a [`Handler`](crate::Handler).
///
/// Bundles borrowed request metadata, the request body and the response
/// writer. The fields are public so a handler can use the body and the writer
/// at the same time:
///
/// ```
/// use bodydump::{Exchange, RequestBody, ResponseRecorder, ResponseWriter};
///
/// fn echo(exchange: Exchange<'_>) {
///     exchange.writer.read_from(exchange.body).unwrap();
/// }
///
/// let (mut parts, _) = http::Request::post("/echo").body(()).unwrap().into_parts();
/// let mut body = RequestBody::from("ping");
/// let mut recorder = ResponseRecorder::new();
/// echo(Exchange::new(&mut parts, &mut body, &mut recorder));
/// assert_eq!(recorder.body(), b"ping");
/// ```
pub struct Exchange<'a> {
    /// Request line and headers.
    pub parts: &'a mut Parts,
    /// Request body.
    pub body: &'a mut RequestBody,
    /// Response writer.
    pub writer: &'a mut dyn ResponseWriter,
}

impl<'a> Exchange<'a> {
    /// Bundles the pieces of an exchange.
    pub fn new(
        parts: &'a mut Parts,
        body: &'a mut RequestBody,
        writer: &'a mut dyn ResponseWriter,
    ) -> Self {
        Self {
            parts,
            body,
            writer,
        }
    }

    /// Request path.
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Reads the whole request body.
    pub fn read_body(&mut self) -> io::Result<Vec<u8>> {
        let mut body = Vec::new();
        self.body.read_to_end(&mut body)?;
        Ok(body)
    }

    /// Replaces the request body, returning the previous one.
    pub fn replace_body(&mut self, body: RequestBody) -> RequestBody {
        std::mem::replace(self.body, body)
    }

    /// Reborrows the exchange for a nested handler.
    pub fn reborrow(&mut self) -> Exchange<'_> {
        Exchange {
            parts: &mut *self.parts,
            body: &mut *self.body,
            writer: &mut *self.writer,
        }
    }
}

impl fmt::Debug for Exchange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("body", &self.body)
            .field("status", &self.writer.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodydump_core::BufferPool;

    #[test]
    fn test_replay_reads_captured_bytes() {
        let pool = BufferPool::new();
        let mut buffer = pool.acquire();
        buffer.extend_from_slice(b"captured");

        let mut body = RequestBody::replay(buffer);
        let mut out = String::new();
        body.read_to_string(&mut out).unwrap();
        assert_eq!(out, "captured");

        drop(body);
        assert_eq!(pool.stats().in_use(), 0);
    }

    #[test]
    fn test_partial_yields_prefix_then_error_once() {
        let pool = BufferPool::new();
        let mut prefix = pool.acquire();
        prefix.extend_from_slice(b"head");
        let mut body = RequestBody::partial(prefix, io::Error::from(io::ErrorKind::TimedOut));

        let mut out = Vec::new();
        let error = body.read_to_end(&mut out).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::TimedOut);
        assert_eq!(out, b"head");

        assert_eq!(body.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn test_body_conversions() {
        let mut from_vec = RequestBody::from(b"vec".to_vec());
        let mut from_str = RequestBody::from("str");
        let mut out = String::new();
        from_vec.read_to_string(&mut out).unwrap();
        from_str.read_to_string(&mut out).unwrap();
        assert_eq!(out, "vecstr");
        assert!(RequestBody::default().is_empty());
    }
}
