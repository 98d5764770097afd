//! Tee writer errors.
//!
//! Writers speak [`std::io::Error`], so a [`TeeError`] travels inside one. Use
//! [`is_short_write`] to recognise it on the caller side.

use std::io;

/// Failure raised by a [`TeeWriter`](crate::TeeWriter) on its own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TeeError {
    /// The underlying writer accepted fewer bytes than it was given without
    /// reporting an error. Nothing from that call was mirrored.
    #[error("short write: underlying writer accepted {written} of {requested} bytes")]
    ShortWrite {
        /// Length of the slice passed to `write`.
        requested: usize,
        /// Count reported by the underlying writer.
        written: usize,
    },
}

impl From<TeeError> for io::Error {
    fn from(error: TeeError) -> Self {
        match error {
            TeeError::ShortWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, error),
        }
    }
}

/// Returns the [`TeeError`] carried by `error`, if any.
pub fn tee_error(error: &io::Error) -> Option<&TeeError> {
    error.get_ref()?.downcast_ref::<TeeError>()
}

/// `true` when `error` is a short write detected by a tee writer.
///
/// A plain `WriteZero` coming from elsewhere is not a short write.
pub fn is_short_write(error: &io::Error) -> bool {
    matches!(tee_error(error), Some(TeeError::ShortWrite { .. }))
}
