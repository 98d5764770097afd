//! Reusable capture buffers.
//!
//! A [`BufferPool`] hands out [`PooledBuffer`] guards. Each guard owns its
//! [`BytesMut`] exclusively until it is dropped, at which point the buffer is
//! cleared (length reset, capacity kept) and returned to the pool.
//!
//! The pool never blocks waiting for a buffer: when no idle buffer is available
//! a new one is allocated. It is a throughput optimization, not a limit on the
//! number of buffers in flight. The only bound is [`max_idle`], which caps how
//! many *returned* buffers are retained for reuse.
//!
//! Pools are explicit values, not process globals. Cloning a [`BufferPool`]
//! yields another handle to the same set of buffers.
//!
//! ```
//! use bodydump_core::BufferPool;
//!
//! let pool = BufferPool::new();
//! {
//!     let mut buffer = pool.acquire();
//!     buffer.extend_from_slice(b"captured");
//!     assert_eq!(&buffer[..], b"captured");
//! } // returned to the pool here
//!
//! let buffer = pool.acquire();
//! assert!(buffer.is_empty());
//! assert_eq!(pool.stats().released, 1);
//! ```
//!
//! [`max_idle`]: BufferPoolBuilder::max_idle

use std::fmt;
use std::io::{self, Read};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

/// Initial capacity of freshly allocated buffers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;

/// Number of idle buffers retained by default.
pub const DEFAULT_MAX_IDLE: usize = 256;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Serializable pool sizing.
///
/// ```yaml
/// buffer_capacity: 16384
/// max_idle: 64
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Initial capacity of newly allocated buffers.
    pub buffer_capacity: usize,
    /// Maximum number of idle buffers kept for reuse.
    pub max_idle: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}

/// Snapshot of pool checkout accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers allocated because no idle buffer was available.
    pub created: usize,
    /// Total number of [`BufferPool::acquire`] calls.
    pub acquired: usize,
    /// Total number of buffers handed back (retained or dropped).
    pub released: usize,
    /// Buffers currently idle in the pool.
    pub idle: usize,
}

impl PoolStats {
    /// Buffers currently checked out.
    pub fn in_use(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }
}

struct Inner {
    idle: Mutex<Vec<BytesMut>>,
    settings: PoolSettings,
    created: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl Inner {
    fn idle(&self) -> MutexGuard<'_, Vec<BytesMut>> {
        // A panic while holding the lock cannot leave the Vec in a broken state.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A shared pool of reusable byte buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl BufferPool {
    /// Creates a pool with default sizing.
    pub fn new() -> Self {
        Self::with_settings(PoolSettings::default())
    }

    /// Creates a pool from serializable settings.
    pub fn with_settings(settings: PoolSettings) -> Self {
        BufferPool {
            inner: Arc::new(Inner {
                idle: Mutex::new(Vec::new()),
                settings,
                created: AtomicUsize::new(0),
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns a builder for configuring pool sizing.
    pub fn builder() -> BufferPoolBuilder {
        BufferPoolBuilder::default()
    }

    /// Takes a logically empty buffer out of the pool, allocating one if none is idle.
    ///
    /// The returned buffer has length zero but may carry capacity (and stale
    /// bytes beyond its length) from a previous request.
    pub fn acquire(&self) -> PooledBuffer {
        self.inner.acquired.fetch_add(1, Ordering::Relaxed);
        let reused = self.inner.idle().pop();
        let mut buffer = match reused {
            Some(buffer) => buffer,
            None => {
                self.inner.created.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    capacity = self.inner.settings.buffer_capacity,
                    "allocating capture buffer"
                );
                BytesMut::with_capacity(self.inner.settings.buffer_capacity)
            }
        };
        buffer.clear();
        PooledBuffer {
            buffer: Some(buffer),
            pool: self.clone(),
        }
    }

    /// Current checkout accounting.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.inner.created.load(Ordering::Relaxed),
            acquired: self.inner.acquired.load(Ordering::Relaxed),
            released: self.inner.released.load(Ordering::Relaxed),
            idle: self.inner.idle().len(),
        }
    }

    /// Sizing this pool was created with.
    pub fn settings(&self) -> PoolSettings {
        self.inner.settings
    }

    fn release(&self, mut buffer: BytesMut) {
        buffer.clear();
        self.inner.released.fetch_add(1, Ordering::Relaxed);
        let mut idle = self.inner.idle();
        if idle.len() < self.inner.settings.max_idle {
            idle.push(buffer);
        } else {
            tracing::trace!(idle = idle.len(), "pool full, dropping capture buffer");
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("settings", &self.inner.settings)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Builder for [`BufferPool`].
#[derive(Debug, Default)]
pub struct BufferPoolBuilder {
    settings: PoolSettings,
}

impl BufferPoolBuilder {
    /// Initial capacity of newly allocated buffers.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.settings.buffer_capacity = capacity;
        self
    }

    /// Maximum number of idle buffers retained for reuse.
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.settings.max_idle = max_idle;
        self
    }

    /// Builds the pool.
    pub fn build(self) -> BufferPool {
        BufferPool::with_settings(self.settings)
    }
}

/// A buffer checked out of a [`BufferPool`].
///
/// Dereferences to [`BytesMut`]. Dropping the guard returns the buffer to its
/// pool exactly once, on every path including unwinding and future cancellation.
pub struct PooledBuffer {
    buffer: Option<BytesMut>,
    pool: BufferPool,
}

impl PooledBuffer {
    /// Appends everything `reader` yields until end of stream.
    ///
    /// On error the bytes read so far stay in the buffer; the caller decides
    /// whether to keep or discard them.
    pub fn read_from<R>(&mut self, reader: &mut R) -> io::Result<u64>
    where
        R: Read + ?Sized,
    {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return Ok(total),
                Ok(n) => {
                    self.extend_from_slice(&chunk[..n]);
                    total += n as u64;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        self.buffer
            .as_ref()
            .expect("pooled buffer is only taken on drop")
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        self.buffer
            .as_mut()
            .expect("pooled buffer is only taken on drop")
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.deref()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(buffer);
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
