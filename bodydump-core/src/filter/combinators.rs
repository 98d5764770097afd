//! Logical combinators for composing filters.
//!
//! ```
//! use bodydump_core::{Filter, FilterExt, filter_fn};
//!
//! let api = filter_fn(|path: &str| path.starts_with("/api"));
//! let upload = filter_fn(|path: &str| path.ends_with("/upload"));
//!
//! // Skip everything outside /api, and uploads inside it.
//! let skip = api.not().or(upload);
//! assert!(skip.skip("/static/app.js"));
//! assert!(skip.skip("/api/files/upload"));
//! assert!(!skip.skip("/api/users"));
//! ```

use std::marker::PhantomData;

use super::Filter;

/// Inverts a filter.
#[derive(Debug)]
pub struct Not<F> {
    filter: F,
}

impl<F> Not<F> {
    /// Creates a new `Not` combinator wrapping the given filter.
    pub fn new(filter: F) -> Self {
        Self { filter }
    }
}

impl<S: ?Sized, F: Filter<S>> Filter<S> for Not<F> {
    fn skip(&self, subject: &S) -> bool {
        !self.filter.skip(subject)
    }
}

/// Skips only when both filters skip.
///
/// Short-circuits: the right filter is not evaluated when the left one keeps
/// the request.
#[derive(Debug)]
pub struct And<L, R> {
    left: L,
    right: R,
}

impl<L, R> And<L, R> {
    /// Creates a new `And` combinator from two filters.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<S, L, R> Filter<S> for And<L, R>
where
    S: ?Sized,
    L: Filter<S>,
    R: Filter<S>,
{
    fn skip(&self, subject: &S) -> bool {
        self.left.skip(subject) && self.right.skip(subject)
    }
}

/// Skips when either filter skips.
///
/// Short-circuits: the right filter is not evaluated when the left one skips.
#[derive(Debug)]
pub struct Or<L, R> {
    left: L,
    right: R,
}

impl<L, R> Or<L, R> {
    /// Creates a new `Or` combinator from two filters.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<S, L, R> Filter<S> for Or<L, R>
where
    S: ?Sized,
    L: Filter<S>,
    R: Filter<S>,
{
    fn skip(&self, subject: &S) -> bool {
        self.left.skip(subject) || self.right.skip(subject)
    }
}

/// Fluent composition methods, implemented for every [`Filter`].
pub trait FilterExt<S: ?Sized>: Filter<S> + Sized {
    /// Inverts this filter.
    fn not(self) -> Not<Self> {
        Not::new(self)
    }

    /// Skips only when both `self` and `other` skip.
    fn and<F: Filter<S>>(self, other: F) -> And<Self, F> {
        And::new(self, other)
    }

    /// Skips when either `self` or `other` skips.
    fn or<F: Filter<S>>(self, other: F) -> Or<Self, F> {
        Or::new(self, other)
    }

    /// Erases the concrete type of this filter.
    fn boxed(self) -> Box<dyn Filter<S>>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<S: ?Sized, F: Filter<S>> FilterExt<S> for F {}

/// Filter that never skips. Useful as a fold seed.
pub struct Keep<S: ?Sized> {
    _phantom: PhantomData<fn(&S)>,
}

impl<S: ?Sized> Keep<S> {
    /// Creates a filter that keeps every request.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S: ?Sized> Default for Keep<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> std::fmt::Debug for Keep<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keep").finish()
    }
}

impl<S: ?Sized> Filter<S> for Keep<S> {
    fn skip(&self, _subject: &S) -> bool {
        false
    }
}
