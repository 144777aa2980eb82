//! Capability tests applied to resolution candidates

use crate::source::Source;
use crate::InvocationError;

/// Test deciding whether a candidate ends resolution
///
/// Predicates must be free of side effects for resolution to be
/// deterministic. An `Err` is a failure of the predicate itself and aborts
/// resolution; it is never read as `false`.
pub trait Predicate<V> {
    /// Evaluate the candidate
    fn test(&mut self, candidate: &Source<V>) -> Result<bool, InvocationError>;
}

impl<V, F> Predicate<V> for F
where
    F: FnMut(&Source<V>) -> bool,
{
    fn test(&mut self, candidate: &Source<V>) -> Result<bool, InvocationError> {
        Ok(self(candidate))
    }
}

/// Adapter for predicates that can fail
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F>(pub F);

impl<V, F> Predicate<V> for Fallible<F>
where
    F: FnMut(&Source<V>) -> Result<bool, InvocationError>,
{
    fn test(&mut self, candidate: &Source<V>) -> Result<bool, InvocationError> {
        (self.0)(candidate)
    }
}

/// Accepts entry iterators; the default resolution target
#[derive(Debug, Clone, Copy, Default)]
pub struct IsIterator;

impl<V> Predicate<V> for IsIterator {
    fn test(&mut self, candidate: &Source<V>) -> Result<bool, InvocationError> {
        Ok(candidate.is_iterator())
    }
}

/// Accepts anything countable without traversal
#[derive(Debug, Clone, Copy, Default)]
pub struct IsCountable;

impl<V> Predicate<V> for IsCountable {
    fn test(&mut self, candidate: &Source<V>) -> Result<bool, InvocationError> {
        Ok(candidate.is_countable())
    }
}

/// Accepts anything that is not an aggregate
#[derive(Debug, Clone, Copy, Default)]
pub struct IsTerminal;

impl<V> Predicate<V> for IsTerminal {
    fn test(&mut self, candidate: &Source<V>) -> Result<bool, InvocationError> {
        Ok(!candidate.is_aggregate())
    }
}
