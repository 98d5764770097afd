use std::fmt;
use std::io::{self, Read, Write};

use bodydump_core::PooledBuffer;
use http::{HeaderMap, StatusCode};

use crate::error::TeeError;
use crate::writer::ResponseWriter;

const COPY_CHUNK: usize = 32 * 1024;

/// Response writer that mirrors every accepted byte into a pooled buffer.
///
/// Each write goes to the wrapped writer first. The mirror is only updated
/// once the wrapped writer has accepted the whole slice, so the buffer always
/// equals what actually reached the wrapped writer, in order:
///
/// - an error from the wrapped writer is returned as is and nothing is mirrored;
/// - an `Ok(n)` with `n` smaller than the slice fails with
///   [`TeeError::ShortWrite`] and nothing is mirrored;
/// - otherwise the slice is appended to the buffer.
///
/// [`write_str`](ResponseWriter::write_str) follows the same rules, and
/// [`read_from`](ResponseWriter::read_from) always copies through
/// [`write`](Write::write), never through the wrapped writer's own `read_from`.
///
/// ```
/// use std::io::Write;
///
/// use bodydump::{ResponseRecorder, TeeWriter};
/// use bodydump_core::BufferPool;
///
/// let pool = BufferPool::new();
/// let mut tee = TeeWriter::new(ResponseRecorder::new(), pool.acquire());
/// tee.write_all(b"hello").unwrap();
///
/// assert_eq!(tee.captured(), b"hello");
/// assert_eq!(tee.get_ref().body(), b"hello");
/// ```
pub struct TeeWriter<W> {
    inner: W,
    buffer: PooledBuffer,
}

impl<W> TeeWriter<W>
where
    W: ResponseWriter,
{
    /// Wraps `inner`, mirroring into `buffer`.
    pub fn new(inner: W, buffer: PooledBuffer) -> Self {
        Self { inner, buffer }
    }

    /// Bytes mirrored so far.
    pub fn captured(&self) -> &[u8] {
        &self.buffer
    }

    /// The wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps into the wrapped writer and the capture buffer.
    pub fn into_parts(self) -> (W, PooledBuffer) {
        (self.inner, self.buffer)
    }

    fn mirror(&mut self, data: &[u8], written: usize) -> io::Result<usize> {
        if written != data.len() {
            tracing::debug!(
                requested = data.len(),
                written,
                "short write from wrapped response writer"
            );
            return Err(TeeError::ShortWrite {
                requested: data.len(),
                written,
            }
            .into());
        }
        self.buffer.extend_from_slice(data);
        Ok(written)
    }
}

impl<W> Write for TeeWriter<W>
where
    W: ResponseWriter,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.mirror(buf, written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W> ResponseWriter for TeeWriter<W>
where
    W: ResponseWriter,
{
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.inner.write_status(status)
    }

    fn status(&self) -> Option<StatusCode> {
        self.inner.status()
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        let written = self.inner.write_str(s)?;
        self.mirror(s.as_bytes(), written)
    }

    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        let mut chunk = [0u8; COPY_CHUNK];
        let mut total = 0u64;
        loop {
            let read = match src.read(&mut chunk) {
                Ok(0) => return Ok(total),
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            };
            total += self.write(&chunk[..read])? as u64;
        }
    }

    fn unwrap_writer(&self) -> Option<&dyn ResponseWriter> {
        Some(&self.inner)
    }
}

impl<W> fmt::Debug for TeeWriter<W>
where
    W: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeeWriter")
            .field("inner", &self.inner)
            .field("captured", &self.buffer.len())
            .finish()
    }
}
