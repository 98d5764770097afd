//! Request exclusion filters.
//!
//! A [`Filter`] looks at request metadata and answers one question: should this
//! request be **skipped** by the dumper? Filters run on every request that
//! reaches the middleware, so they are synchronous, side-effect free and cheap.
//!
//! Closures become filters through [`filter_fn`]:
//!
//! ```
//! use bodydump_core::{Filter, FilterExt, filter_fn};
//!
//! let is_health = filter_fn(|path: &str| path == "/health");
//! let is_metrics = filter_fn(|path: &str| path.starts_with("/metrics"));
//!
//! let skip = is_health.or(is_metrics);
//! assert!(skip.skip("/metrics/jvm"));
//! assert!(!skip.skip("/api/users"));
//! ```
//!
//! ## Composability
//!
//! - [`Not`] - inverts a filter
//! - [`And`] - skip only when both filters skip
//! - [`Or`] - skip when either filter skips
//!
//! A [`Filters`] list skips the request as soon as any member does.

pub mod combinators;

use std::fmt;
use std::sync::Arc;

pub use combinators::{And, FilterExt, Keep, Not, Or};

/// Decides whether a request is excluded from dumping.
pub trait Filter<S: ?Sized>: Send + Sync {
    /// Returns `true` when the subject must **not** be dumped.
    fn skip(&self, subject: &S) -> bool;
}

/// Returns a [`Filter`] that calls `f` with the request.
///
/// `f` returns `true` to skip the request.
pub fn filter_fn<F>(f: F) -> FilterFn<F> {
    FilterFn { f }
}

/// A [`Filter`] implemented by a closure. See [`filter_fn`].
#[derive(Clone, Copy)]
pub struct FilterFn<F> {
    f: F,
}

impl<F> fmt::Debug for FilterFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterFn")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}

impl<S, F> Filter<S> for FilterFn<F>
where
    S: ?Sized,
    F: Fn(&S) -> bool + Send + Sync,
{
    fn skip(&self, subject: &S) -> bool {
        (self.f)(subject)
    }
}

impl<S, T> Filter<S> for Box<T>
where
    S: ?Sized,
    T: Filter<S> + ?Sized,
{
    fn skip(&self, subject: &S) -> bool {
        self.as_ref().skip(subject)
    }
}

impl<S, T> Filter<S> for Arc<T>
where
    S: ?Sized,
    T: Filter<S> + ?Sized,
{
    fn skip(&self, subject: &S) -> bool {
        self.as_ref().skip(subject)
    }
}

/// Boxed filter trait object.
pub type BoxFilter<S> = Box<dyn Filter<S>>;

/// An ordered list of filters.
///
/// The request is skipped if **any** filter skips it. Evaluation stops at the
/// first filter that does. An empty list never skips.
pub struct Filters<S: ?Sized> {
    filters: Vec<BoxFilter<S>>,
}

impl<S: ?Sized> Filters<S> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Appends a filter.
    pub fn push<F>(&mut self, filter: F)
    where
        F: Filter<S> + 'static,
    {
        self.filters.push(Box::new(filter));
    }

    /// Number of configured filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` when no filter is configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<S: ?Sized> Filter<S> for Filters<S> {
    fn skip(&self, subject: &S) -> bool {
        self.filters.iter().any(|filter| filter.skip(subject))
    }
}

impl<S: ?Sized> Default for Filters<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Extend<BoxFilter<S>> for Filters<S> {
    fn extend<I: IntoIterator<Item = BoxFilter<S>>>(&mut self, iter: I) {
        self.filters.extend(iter);
    }
}

impl<S: ?Sized> FromIterator<BoxFilter<S>> for Filters<S> {
    fn from_iter<I: IntoIterator<Item = BoxFilter<S>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Filters<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filters")
            .field("len", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_list_never_skips() {
        let filters: Filters<str> = Filters::new();
        assert!(!filters.skip("/anything"));
    }

    #[test]
    fn test_any_filter_skipping_is_enough() {
        let mut filters: Filters<str> = Filters::new();
        filters.push(filter_fn(|path: &str| path == "/foo"));
        filters.push(filter_fn(|path: &str| path == "/bar"));

        assert!(filters.skip("/foo"));
        assert!(filters.skip("/bar"));
        assert!(!filters.skip("/baz"));
    }

    #[test]
    fn test_evaluation_stops_at_first_skip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut filters: Filters<str> = Filters::new();
        filters.push(filter_fn(|_: &str| true));
        filters.push(filter_fn(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        }));

        assert!(filters.skip("/"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_boxed_and_arced_filters() {
        let boxed: BoxFilter<str> = Box::new(filter_fn(|path: &str| path.is_empty()));
        let arced: Arc<dyn Filter<str>> = Arc::new(filter_fn(|path: &str| path.len() > 3));

        assert!(boxed.skip(""));
        assert!(arced.skip("/long"));
        assert!(!arced.skip("/a"));
    }
}
