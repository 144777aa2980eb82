//! Closure-backed aggregates and the adapter for plain std iterators

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{Aggregate, Countable, EntryIterator, Identity, Key, Source};

/// Aggregate whose inner source comes from a closure
///
/// Each call to [`Aggregate::inner`] runs the closure again, mirroring an
/// aggregate that hands out a fresh iterator per request.
pub struct FnAggregate<V, F> {
    identity: Identity,
    produce: F,
    len: Option<usize>,
    _marker: PhantomData<fn() -> V>,
}

impl<V, F> FnAggregate<V, F>
where
    F: Fn() -> Source<V>,
{
    /// Aggregate without a countable capability
    pub fn new(produce: F) -> Self {
        Self {
            identity: Identity::fresh(),
            produce,
            len: None,
            _marker: PhantomData,
        }
    }

    /// Declare the aggregate countable with the given size
    pub fn with_count(mut self, len: usize) -> Self {
        self.len = Some(len);
        self
    }
}

impl<V, F> fmt::Debug for FnAggregate<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAggregate")
            .field("identity", &self.identity)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<V, F> Countable for FnAggregate<V, F> {
    fn len(&self) -> usize {
        self.len.unwrap_or(0)
    }
}

impl<V, F> Aggregate<V> for FnAggregate<V, F>
where
    F: Fn() -> Source<V>,
{
    fn identity(&self) -> Identity {
        self.identity
    }

    fn inner(&self) -> Source<V> {
        (self.produce)()
    }

    fn as_countable(&self) -> Option<&dyn Countable> {
        self.len.map(|_| self as &dyn Countable)
    }
}

/// Wrap a closure as a non-countable aggregate source
pub fn aggregate<V, F>(produce: F) -> Source<V>
where
    V: 'static,
    F: Fn() -> Source<V> + 'static,
{
    Source::Aggregate(Rc::new(FnAggregate::new(produce)))
}

/// Non-countable [`EntryIterator`] over any std iterator of entries
pub struct IterEntries<I> {
    identity: Identity,
    inner: I,
}

impl<I> IterEntries<I> {
    /// Adapt `inner`
    pub fn new(inner: I) -> Self {
        Self {
            identity: Identity::fresh(),
            inner,
        }
    }
}

impl<I> fmt::Debug for IterEntries<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterEntries")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl<I, V> Iterator for IterEntries<I>
where
    I: Iterator<Item = (Key, V)>,
{
    type Item = (Key, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I, V> EntryIterator<V> for IterEntries<I>
where
    I: Iterator<Item = (Key, V)>,
{
    fn identity(&self) -> Option<Identity> {
        Some(self.identity)
    }
}
