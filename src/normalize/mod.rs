//! Canonical entry iterators
//!
//! Iterators pass through untouched, structures and records are moved into
//! an [`ArrayIterator`], and aggregates are unwrapped until something
//! iterable turns up.

use tracing::debug;

use crate::resolve::{drill, IsTerminal};
use crate::source::{ArrayIterator, EntryIterator, Source};
use crate::{IterableConfig, IterableError};

/// Converts any [`Source`] into a sequential entry iterator
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: IterableConfig,
}

impl Normalizer {
    /// Normalizer unwrapping at most `config.depth_limit` aggregates
    pub fn new(config: IterableConfig) -> Self {
        Self { config }
    }

    /// Normalize `value` into an iterator preserving keys and order.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when an aggregate chain never yields anything
    /// iterable (a cycle, or more wrappers than the depth limit allows); the
    /// resolution failure is attached as the cause.
    pub fn normalize<V: 'static>(
        &self,
        value: Source<V>,
    ) -> Result<Box<dyn EntryIterator<V>>, IterableError> {
        match value {
            Source::Iterator(iterator) => Ok(iterator),
            Source::Structure(structure) => Ok(Box::new(ArrayIterator::from(structure))),
            Source::Record(record) => Ok(Box::new(ArrayIterator::new(record.into_entries()))),
            Source::Aggregate(_) => {
                let subject = value.subject();
                let terminal = drill(value, IsTerminal, self.config.depth_limit).map_err(|err| {
                    IterableError::invalid_subject("aggregate does not yield an iterable", subject)
                        .caused_by(err)
                })?;
                debug!(%subject, kind = %terminal.kind(), "unwrapped aggregate");
                self.normalize(terminal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{aggregate, Fields, Key, Structure};

    fn collect<V: 'static>(value: Source<V>) -> Vec<(Key, V)> {
        Normalizer::new(IterableConfig::default())
            .normalize(value)
            .expect("normalizes")
            .collect()
    }

    #[test]
    fn test_structure_keeps_keys_and_order() {
        let structure = Structure::from_entries([("b", 2), ("a", 1)]);
        assert_eq!(
            collect(Source::from(structure)),
            vec![(Key::from("b"), 2), (Key::from("a"), 1)]
        );
    }

    #[test]
    fn test_record_becomes_counted_iterator() {
        let fields = Fields::new().with("x", 1).with("y", 2);
        let iterator = Normalizer::new(IterableConfig::default())
            .normalize(Source::from(fields))
            .unwrap();
        assert_eq!(iterator.as_countable().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_aggregate_over_structure() {
        let wrapped = aggregate(|| aggregate(|| Source::from(vec!['p', 'q'])));
        assert_eq!(
            collect(wrapped),
            vec![(Key::Index(0), 'p'), (Key::Index(1), 'q')]
        );
    }

    #[test]
    fn test_too_deep_is_invalid_argument() {
        let wrapped = aggregate(|| aggregate(|| Source::from(vec![1])));
        let err = Normalizer::new(IterableConfig::default().with_depth_limit(1))
            .normalize(wrapped)
            .err()
            .expect("depth limit exceeded");
        match err {
            IterableError::InvalidArgument { cause: Some(cause), .. } => {
                assert!(cause.is_out_of_range());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
