use std::io::{self, Read, Write};

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};

use crate::ResponseWriter;

/// In-memory [`ResponseWriter`] that records everything written to it.
///
/// Useful for tests and for running handlers outside a server. It overrides
/// [`ResponseWriter::read_from`] with a direct read into its body, the way a
/// socket-backed writer would offer a zero-copy path, and counts how often that
/// path was taken.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    direct_copies: usize,
    flushes: usize,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// How many times the direct `read_from` path was used.
    pub fn direct_copies(&self) -> usize {
        self.direct_copies
    }

    /// How many times the recorder was flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Converts the recording into an `http::Response`.
    ///
    /// A recorder that was never written to yields `200 OK`.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }

    fn ensure_status(&mut self) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
    }
}

impl Write for ResponseRecorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_status();
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(current) => {
                tracing::warn!(%current, ignored = %status, "superfluous write_status call");
            }
        }
    }

    fn status(&self) -> Option<StatusCode> {
        self.status
    }

    fn size(&self) -> u64 {
        self.body.len() as u64
    }

    fn read_from(&mut self, src: &mut dyn Read) -> io::Result<u64> {
        self.ensure_status();
        self.direct_copies += 1;
        let copied = src.read_to_end(&mut self.body)?;
        Ok(copied as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_sets_implicit_ok() {
        let mut recorder = ResponseRecorder::new();
        assert_eq!(recorder.status(), None);

        recorder.write_all(b"hello").unwrap();
        recorder.write_status(StatusCode::CREATED);

        assert_eq!(recorder.status(), Some(StatusCode::OK));
        assert_eq!(recorder.size(), 5);
    }

    #[test]
    fn test_into_response_keeps_status_headers_and_body() {
        let mut recorder = ResponseRecorder::new();
        recorder
            .headers_mut()
            .insert("content-type", "text/plain".parse().unwrap());
        recorder.write_status(StatusCode::ACCEPTED);
        recorder.write_str("queued").unwrap();

        let response = recorder.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(response.body(), &Bytes::from_static(b"queued"));
    }

    #[test]
    fn test_read_from_takes_direct_path() {
        let mut recorder = ResponseRecorder::new();
        let copied = recorder.read_from(&mut &b"streamed"[..]).unwrap();

        assert_eq!(copied, 8);
        assert_eq!(recorder.body(), b"streamed");
        assert_eq!(recorder.direct_copies(), 1);
    }
}
