//! Aggregate resolution
//!
//! Walks a chain of aggregates, testing every candidate (the input included)
//! against a predicate before unwrapping it. The walk is bounded twice: by
//! the depth limit, and by a visited set of aggregate identities that stops
//! any aggregate from being unwrapped a second time.

mod predicate;

pub use predicate::{Fallible, IsCountable, IsIterator, IsTerminal, Predicate};

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::source::{Source, SourceKind};
use crate::util::{non_negative, IntLike, IntNormalizer, StrictIntNormalizer};
use crate::{IterableConfig, IterableError, RangeViolation};

/// Resolves aggregate chains down to a candidate accepted by a predicate
#[derive(Debug, Clone)]
pub struct Resolver<N = StrictIntNormalizer> {
    config: IterableConfig,
    ints: N,
}

impl Resolver {
    /// Resolver using the strict integer normalizer
    pub fn new(config: IterableConfig) -> Self {
        Self {
            config,
            ints: StrictIntNormalizer,
        }
    }
}

impl<N: IntNormalizer> Resolver<N> {
    /// Resolver using a custom integer normalizer for depth limits
    pub fn with_normalizer(config: IterableConfig, ints: N) -> Self {
        Self { config, ints }
    }

    /// Resolve `value` to the first candidate satisfying `predicate`.
    ///
    /// `value` must be an iterator or an aggregate. `depth_limit` is the
    /// number of unwraps allowed and must normalize to a non-negative
    /// integer.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a structure or record input, or a bad limit
    /// - `OutOfRange` when the limit is reached, a cycle is found, or a
    ///   terminal candidate fails the predicate
    /// - `Invocation` when the predicate itself fails
    pub fn resolve<V, P>(
        &self,
        value: Source<V>,
        predicate: P,
        depth_limit: impl Into<IntLike>,
    ) -> Result<Source<V>, IterableError>
    where
        P: Predicate<V>,
    {
        if !matches!(value.kind(), SourceKind::Iterator | SourceKind::Aggregate) {
            return Err(IterableError::invalid_subject(
                "only iterators and aggregates can be resolved",
                value.subject(),
            ));
        }
        let limit = non_negative(&self.ints, &depth_limit.into(), "depth limit")?;
        drill(value, predicate, limit)
    }

    /// Resolve to an iterator with the configured depth limit
    pub fn resolve_default<V>(&self, value: Source<V>) -> Result<Source<V>, IterableError> {
        self.resolve(value, IsIterator, self.config.depth_limit)
    }
}

/// Core resolution loop shared with the normalizer
pub(crate) fn drill<V, P>(
    value: Source<V>,
    mut predicate: P,
    limit: usize,
) -> Result<Source<V>, IterableError>
where
    P: Predicate<V>,
{
    let subject = value.subject();
    let mut visited = HashSet::new();
    let mut current = value;
    let mut depth = 0;

    loop {
        if predicate.test(&current)? {
            debug!(depth, kind = %current.kind(), "resolved candidate");
            return Ok(current);
        }

        if depth >= limit {
            return Err(IterableError::out_of_range(
                RangeViolation::DepthLimitReached { depth },
                subject,
                limit,
            ));
        }

        let next = match &current {
            Source::Aggregate(aggregate) => {
                let identity = aggregate.identity();
                if !visited.insert(identity) {
                    return Err(IterableError::out_of_range(
                        RangeViolation::CycleDetected { identity },
                        subject,
                        limit,
                    ));
                }
                trace!(depth, %identity, "unwrapping aggregate");
                aggregate.inner()
            }
            _ => {
                return Err(IterableError::out_of_range(
                    RangeViolation::Unresolvable {
                        terminal: current.subject(),
                    },
                    subject,
                    limit,
                ));
            }
        };

        current = next;
        depth += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{aggregate, Structure};

    fn letters() -> Source<&'static str> {
        Source::iterator(crate::source::ArrayIterator::from(Structure::from_values([
            "a", "b",
        ])))
    }

    #[test]
    fn test_match_at_depth_zero_skips_unwrapping() {
        let wrapped = aggregate(letters);
        let identity = wrapped.identity();

        let resolver = Resolver::new(IterableConfig::default());
        let resolved = resolver
            .resolve(wrapped, |_: &Source<&str>| true, 0)
            .expect("depth-zero match");
        assert_eq!(resolved.identity(), identity);
    }

    #[test]
    fn test_structure_input_is_rejected() {
        let resolver = Resolver::new(IterableConfig::default());
        let err = resolver
            .resolve_default(Source::from(vec![1, 2, 3]))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let resolver = Resolver::new(IterableConfig::default());
        let err = resolver.resolve(letters(), IsIterator, -1).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_terminal_mismatch_is_unresolvable() {
        let resolver = Resolver::new(IterableConfig::default());
        let err = resolver
            .resolve(
                aggregate(letters),
                |c: &Source<&str>| c.kind() == SourceKind::Record,
                10,
            )
            .unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(RangeViolation::Unresolvable { terminal }) if terminal.kind == SourceKind::Iterator
        ));
    }
}
