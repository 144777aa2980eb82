//! Iterable sources and their capabilities
//!
//! Every accepted value is one of four shapes. Classification is a single
//! `match` on [`Source`]; the optional capabilities (countable, unwrappable)
//! are queried through trait methods instead of runtime type checks.

mod aggregate;
mod structure;

pub use aggregate::{aggregate, FnAggregate, IterEntries};
pub use structure::{ArrayIterator, Fields, Structure};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key of a single entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(untagged))]
pub enum Key {
    /// Positional key
    Index(i64),
    /// Named key
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Key::Index(i64::from(index))
    }
}

impl From<usize> for Key {
    /// Indices beyond `i64::MAX` stay exact as named keys.
    fn from(index: usize) -> Self {
        match i64::try_from(index) {
            Ok(index) => Key::Index(index),
            Err(_) => Key::Name(index.to_string()),
        }
    }
}

/// Address-independent handle of an aggregate or iterator
///
/// Handles come from a process-wide counter, so they stay valid when the
/// object they belong to is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(u64);

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

impl Identity {
    /// Allocate an identity no other object holds
    pub fn fresh() -> Self {
        Identity(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw handle value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shape of a [`Source`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Ordered indexed/associative structure
    Structure,
    /// Fixed-field record treated as a map
    Record,
    /// Sequential entry iterator
    Iterator,
    /// Wrapper exposing an inner source
    Aggregate,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Structure => "structure",
            SourceKind::Record => "record",
            SourceKind::Iterator => "iterator",
            SourceKind::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// Reference to an offending value, carried by errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    /// Shape of the value
    pub kind: SourceKind,
    /// Identity, when the value has one
    pub identity: Option<Identity>,
}

impl Subject {
    /// Describe a value by shape and identity
    pub fn new(kind: SourceKind, identity: Option<Identity>) -> Self {
        Self { kind, identity }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            Some(identity) => write!(f, "{} {}", self.kind, identity),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Element count known without traversal
pub trait Countable {
    /// Number of elements
    fn len(&self) -> usize;

    /// Whether there are no elements
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sequential access to `(key, value)` entries
pub trait EntryIterator<V>: Iterator<Item = (Key, V)> {
    /// Countable capability, if the iterator knows how many entries remain
    fn as_countable(&self) -> Option<&dyn Countable> {
        None
    }

    /// Identity of this iterator, if it carries one
    fn identity(&self) -> Option<Identity> {
        None
    }
}

/// Object that does not iterate itself but exposes an inner source
pub trait Aggregate<V> {
    /// Stable identity used for cycle detection
    fn identity(&self) -> Identity;

    /// Produce the inner source
    fn inner(&self) -> Source<V>;

    /// Countable capability, if the aggregate knows its size
    fn as_countable(&self) -> Option<&dyn Countable> {
        None
    }
}

/// Fixed-field object treated as a map from field name to value
pub trait Record<V> {
    /// Number of fields
    fn len(&self) -> usize;

    /// Whether the record has no fields
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields in declaration order
    fn into_entries(self: Box<Self>) -> Vec<(Key, V)>;
}

impl<V> Record<V> for BTreeMap<String, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn into_entries(self: Box<Self>) -> Vec<(Key, V)> {
        (*self)
            .into_iter()
            .map(|(name, value)| (Key::Name(name), value))
            .collect()
    }
}

/// Any iterable value the toolkit accepts
pub enum Source<V> {
    /// Indexed or associative structure
    Structure(Structure<V>),
    /// Structured record
    Record(Box<dyn Record<V>>),
    /// Entry iterator
    Iterator(Box<dyn EntryIterator<V>>),
    /// Iterator aggregate
    Aggregate(Rc<dyn Aggregate<V>>),
}

impl<V> Source<V> {
    /// Wrap an entry iterator
    pub fn iterator<I>(iterator: I) -> Self
    where
        I: EntryIterator<V> + 'static,
    {
        Source::Iterator(Box::new(iterator))
    }

    /// Wrap any std iterator of entries as a non-countable iterator
    pub fn lazy<I>(entries: I) -> Self
    where
        I: Iterator<Item = (Key, V)> + 'static,
        V: 'static,
    {
        Source::Iterator(Box::new(IterEntries::new(entries)))
    }

    /// Wrap an aggregate
    pub fn aggregate<A>(aggregate: A) -> Self
    where
        A: Aggregate<V> + 'static,
    {
        Source::Aggregate(Rc::new(aggregate))
    }

    /// Wrap a record
    pub fn record<R>(record: R) -> Self
    where
        R: Record<V> + 'static,
    {
        Source::Record(Box::new(record))
    }

    /// Shape of this source
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Structure(_) => SourceKind::Structure,
            Source::Record(_) => SourceKind::Record,
            Source::Iterator(_) => SourceKind::Iterator,
            Source::Aggregate(_) => SourceKind::Aggregate,
        }
    }

    /// Identity of this source, if it carries one
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Source::Iterator(iterator) => iterator.identity(),
            Source::Aggregate(aggregate) => Some(aggregate.identity()),
            Source::Structure(_) | Source::Record(_) => None,
        }
    }

    /// Element count when it is available without traversal
    pub fn try_count(&self) -> Option<usize> {
        match self {
            Source::Structure(structure) => Some(structure.len()),
            Source::Record(record) => Some(record.len()),
            Source::Iterator(iterator) => iterator.as_countable().map(|c| c.len()),
            Source::Aggregate(aggregate) => aggregate.as_countable().map(|c| c.len()),
        }
    }

    /// Whether the count is available without traversal
    pub fn is_countable(&self) -> bool {
        self.try_count().is_some()
    }

    /// Whether this is an entry iterator
    pub fn is_iterator(&self) -> bool {
        matches!(self, Source::Iterator(_))
    }

    /// Whether this is an aggregate
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Source::Aggregate(_))
    }

    /// Inner source of an aggregate; `None` for every other shape
    pub fn inner(&self) -> Option<Source<V>> {
        match self {
            Source::Aggregate(aggregate) => Some(aggregate.inner()),
            _ => None,
        }
    }

    /// Error-reporting reference to this value
    pub fn subject(&self) -> Subject {
        Subject::new(self.kind(), self.identity())
    }
}

impl<V> fmt::Debug for Source<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("kind", &self.kind())
            .field("identity", &self.identity())
            .field("count", &self.try_count())
            .finish()
    }
}

impl<V> From<Structure<V>> for Source<V> {
    fn from(structure: Structure<V>) -> Self {
        Source::Structure(structure)
    }
}

impl<V> From<Vec<V>> for Source<V> {
    fn from(values: Vec<V>) -> Self {
        Source::Structure(Structure::from_values(values))
    }
}

impl<V: 'static> From<Fields<V>> for Source<V> {
    fn from(fields: Fields<V>) -> Self {
        Source::Record(Box::new(fields))
    }
}

impl<V: 'static> From<BTreeMap<String, V>> for Source<V> {
    fn from(map: BTreeMap<String, V>) -> Self {
        Source::Record(Box::new(map))
    }
}

impl<V> From<Rc<dyn Aggregate<V>>> for Source<V> {
    fn from(aggregate: Rc<dyn Aggregate<V>>) -> Self {
        Source::Aggregate(aggregate)
    }
}

impl<V> From<Box<dyn EntryIterator<V>>> for Source<V> {
    fn from(iterator: Box<dyn EntryIterator<V>>) -> Self {
        Source::Iterator(iterator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usize_keys_never_wrap() {
        assert_eq!(Key::from(42usize), Key::Index(42));
        assert_eq!(Key::from(i64::MAX as usize), Key::Index(i64::MAX));
        assert_eq!(Key::from(usize::MAX), Key::Name(usize::MAX.to_string()));
    }

    #[test]
    fn test_identities_are_unique() {
        let a = Identity::fresh();
        let b = Identity::fresh();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_classification() {
        let structure: Source<i32> = vec![1, 2, 3].into();
        assert_eq!(structure.kind(), SourceKind::Structure);
        assert_eq!(structure.try_count(), Some(3));
        assert!(structure.identity().is_none());
        assert!(structure.inner().is_none());

        let lazy: Source<i32> = Source::lazy((0..4).map(|i| (Key::from(i), i)));
        assert!(lazy.is_iterator());
        assert!(!lazy.is_countable());
        assert!(lazy.identity().is_some());

        let wrapped = aggregate(|| Source::from(vec!["x", "y"]));
        assert!(wrapped.is_aggregate());
        assert!(!wrapped.is_countable());
        let inner = wrapped.inner().expect("aggregate exposes inner source");
        assert_eq!(inner.try_count(), Some(2));
    }

    #[test]
    fn test_record_from_btree_map() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        let source = Source::from(map);
        assert_eq!(source.kind(), SourceKind::Record);
        assert_eq!(source.try_count(), Some(2));

        match source {
            Source::Record(record) => {
                let entries = record.into_entries();
                assert_eq!(entries, vec![(Key::from("a"), 1), (Key::from("b"), 2)]);
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_subject_display() {
        let identity = Identity::fresh();
        let subject = Subject::new(SourceKind::Aggregate, Some(identity));
        assert_eq!(subject.to_string(), format!("aggregate #{}", identity.get()));
        assert_eq!(Subject::new(SourceKind::Record, None).to_string(), "record");
    }
}
