//! The response writer capability the dumper is built against.

use std::io::{self, Read, Write};

use http::{HeaderMap, StatusCode};

/// Outbound half of an exchange, implemented by the host server.
///
/// Body bytes go through [`io::Write`]. Headers can be changed until the status
/// line is written; the first body write sends an implicit `200 OK` if no status
/// was written before.
pub trait ResponseWriter: Write + Send {
    /// Response headers.
    fn headers(&self) -> &HeaderMap;

    /// Response headers, for modification before the status is written.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Writes the status line. Later calls are ignored by well-behaved hosts.
    fn write_status(&mut self, status: StatusCode);

    /// Status written so far, or `None` if nothing has been written yet.
    fn status(&self) -> Option<StatusCode>;

    /// Number of body bytes written so far.
    fn size(&self) -> u64;

    /// Writes a string, returning the number of bytes accepted.
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.write(s.as_bytes())
    }

    /// Copies `src` into the response until EOF.
    ///
    /// Hosts may override this with a faster path that bypasses [`write`].
    ///
    /// [`write`]: Write::write
    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        io::copy(src, self)
    }

    /// The writer this one wraps, for callers that need to inspect the original.
    ///
    /// Only a shared reference is handed out, so nothing can be written around
    /// a wrapper.
    fn unwrap_writer(&self) -> Option<&dyn ResponseWriter> {
        None
    }
}

impl<W> ResponseWriter for &mut W
where
    W: ResponseWriter + ?Sized,
{
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status)
    }

    fn status(&self) -> Option<StatusCode> {
        (**self).status()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        (**self).write_str(s)
    }

    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        (**self).read_from(src)
    }

    fn unwrap_writer(&self) -> Option<&dyn ResponseWriter> {
        (**self).unwrap_writer()
    }
}

impl<W> ResponseWriter for Box<W>
where
    W: ResponseWriter + ?Sized,
{
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status)
    }

    fn status(&self) -> Option<StatusCode> {
        (**self).status()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        (**self).write_str(s)
    }

    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        (**self).read_from(src)
    }

    fn unwrap_writer(&self) -> Option<&dyn ResponseWriter> {
        (**self).unwrap_writer()
    }
}
