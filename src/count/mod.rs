//! Cheapest-path element counting
//!
//! Strategies, in order of preference:
//! 1. Native count of a structure, record, or countable object
//! 2. Drill through aggregates to the first countable value
//! 3. Full traversal
//!
//! All three agree for the same finite input. Step 2 is best-effort: when
//! drilling fails (cycle, depth bound) the counter falls through to step 3
//! instead of reporting the failure. Step 3 has no depth bound and fails
//! only on a cycle.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::normalize::Normalizer;
use crate::resolve::{drill, IsTerminal};
use crate::source::{Aggregate, Source};
use crate::{IterableConfig, IterableError};

/// How a count was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    /// The value reported its own size
    Native,
    /// A countable value was found `depth` unwraps below the input
    Resolved {
        /// Unwraps performed
        depth: usize,
    },
    /// Every entry was visited
    Traversal,
}

/// Count together with the strategy that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Number of elements
    pub count: usize,
    /// Strategy used
    pub strategy: CountStrategy,
}

impl Tally {
    fn new(count: usize, strategy: CountStrategy) -> Self {
        Self { count, strategy }
    }
}

/// Counts the elements of finite sources
#[derive(Debug, Clone)]
pub struct Counter {
    config: IterableConfig,
}

impl Counter {
    /// Counter bounded by `config.count_depth_limit` while drilling
    pub fn new(config: IterableConfig) -> Self {
        Self { config }
    }

    /// Number of elements in `iterable`, which must be finite.
    ///
    /// A non-countable iterator is advanced to its end.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` only when traversal is the last resort and the
    /// aggregate chain cannot be turned into an iterator at all.
    pub fn count<V: 'static>(&self, iterable: &mut Source<V>) -> Result<usize, IterableError> {
        self.tally(iterable).map(|tally| tally.count)
    }

    /// Like [`Counter::count`], also reporting the strategy used
    pub fn tally<V: 'static>(&self, iterable: &mut Source<V>) -> Result<Tally, IterableError> {
        let native = match iterable {
            Source::Structure(structure) => structure.len(),
            Source::Record(record) => record.len(),
            Source::Iterator(iterator) => match iterator.as_countable() {
                Some(countable) => countable.len(),
                None => {
                    let count = iterator.by_ref().count();
                    return Ok(Tally::new(count, CountStrategy::Traversal));
                }
            },
            Source::Aggregate(aggregate) => match aggregate.as_countable() {
                Some(countable) => countable.len(),
                None => return self.count_aggregate(aggregate),
            },
        };
        debug!(count = native, "native count");
        Ok(Tally::new(native, CountStrategy::Native))
    }

    fn count_aggregate<V: 'static>(
        &self,
        outer: &Rc<dyn Aggregate<V>>,
    ) -> Result<Tally, IterableError> {
        let limit = self.config.count_depth_limit;
        let mut visited = HashSet::from([outer.identity()]);
        let mut depth = 0;

        let mut current = if limit == 0 {
            None
        } else {
            depth += 1;
            Some(outer.inner())
        };

        while let Some(candidate) = current.take() {
            if let Some(count) = candidate.try_count() {
                debug!(count, depth, "resolved countable");
                return Ok(Tally::new(count, CountStrategy::Resolved { depth }));
            }
            match candidate {
                Source::Aggregate(next) if depth < limit && visited.insert(next.identity()) => {
                    depth += 1;
                    current = Some(next.inner());
                }
                Source::Iterator(iterator) => {
                    debug!(depth, "no countable found, traversing terminal iterator");
                    return Ok(Tally::new(iterator.count(), CountStrategy::Traversal));
                }
                _ => {
                    debug!(depth, limit, "countable search abandoned");
                }
            }
        }

        self.traverse(Source::Aggregate(Rc::clone(outer)))
    }

    /// Walk every entry. Only a cycle stops the unwrap here: the input is
    /// finite, so the chain ends without a depth bound.
    fn traverse<V: 'static>(&self, value: Source<V>) -> Result<Tally, IterableError> {
        let subject = value.subject();
        let terminal = drill(value, IsTerminal, usize::MAX).map_err(|err| {
            IterableError::invalid_subject("aggregate does not yield an iterable", subject)
                .caused_by(err)
        })?;
        let iterator = Normalizer::new(self.config.clone()).normalize(terminal)?;
        Ok(Tally::new(iterator.count(), CountStrategy::Traversal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{aggregate, FnAggregate, Key, Structure};

    fn counter() -> Counter {
        Counter::new(IterableConfig::default())
    }

    #[test]
    fn test_native_structure() {
        let mut source = Source::from(vec![1, 2, 3, 4]);
        let tally = counter().tally(&mut source).unwrap();
        assert_eq!(tally, Tally::new(4, CountStrategy::Native));
    }

    #[test]
    fn test_resolved_through_aggregates() {
        let mut source = aggregate(|| aggregate(|| Source::from(Structure::from_values(0..5))));
        let tally = counter().tally(&mut source).unwrap();
        assert_eq!(tally, Tally::new(5, CountStrategy::Resolved { depth: 2 }));
    }

    #[test]
    fn test_countable_aggregate_is_native() {
        let mut source = Source::aggregate(
            FnAggregate::new(|| Source::lazy(std::iter::empty::<(Key, u8)>())).with_count(9),
        );
        let tally = counter().tally(&mut source).unwrap();
        assert_eq!(tally, Tally::new(9, CountStrategy::Native));
    }

    #[test]
    fn test_lazy_iterator_is_traversed() {
        let mut source = Source::lazy((0..6).map(|i| (Key::from(i), i)));
        let tally = counter().tally(&mut source).unwrap();
        assert_eq!(tally, Tally::new(6, CountStrategy::Traversal));
        // The iterator has been exhausted by the traversal.
        assert_eq!(counter().count(&mut source).unwrap(), 0);
    }

    #[test]
    fn test_traversal_ignores_depth_limit() {
        let config = IterableConfig::default()
            .with_depth_limit(1)
            .with_count_depth_limit(1);
        let mut source = aggregate(|| aggregate(|| aggregate(|| Source::from(vec![1, 2]))));
        let tally = Counter::new(config).tally(&mut source).unwrap();
        assert_eq!(tally, Tally::new(2, CountStrategy::Traversal));
    }

    #[test]
    fn test_zero_count_depth_falls_back_to_traversal() {
        let config = IterableConfig::default().with_count_depth_limit(0);
        let mut source = aggregate(|| Source::from(vec!['a', 'b']));
        let tally = Counter::new(config).tally(&mut source).unwrap();
        assert_eq!(tally, Tally::new(2, CountStrategy::Traversal));
    }
}
