//! Windowed mapping
//!
//! Applies a transform to the entries of a normalized source that fall
//! inside a positional window, collecting results under the original keys.

use std::collections::HashMap;

use tracing::debug;

use crate::normalize::Normalizer;
use crate::source::{EntryIterator, Key, Source, SourceKind};
use crate::util::{non_negative, IntLike, IntNormalizer, StrictIntNormalizer};
use crate::{InvocationError, IterableConfig, IterableError};

/// Positional window `[start, start + count)`; `count == 0` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// Zero-based position of the first entry
    pub start: usize,
    /// Maximum number of entries, `0` for no upper bound
    pub count: usize,
}

impl Window {
    /// Window of `count` entries from `start`
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// Every entry
    pub fn all() -> Self {
        Self::default()
    }

    /// Exclusive end position, `None` when unbounded
    pub fn end(&self) -> Option<usize> {
        (self.count > 0).then(|| self.start.saturating_add(self.count))
    }

    /// Whether `position` falls inside the window
    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && self.end().map_or(true, |end| position < end)
    }
}

/// Ordered key → result mapping
///
/// Inserting an existing key replaces its value without moving it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Mapping<R> {
    entries: Vec<(Key, R)>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    positions: HashMap<Key, usize>,
}

impl<R> Default for Mapping<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<R> Mapping<R> {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the replaced value
    pub fn insert(&mut self, key: Key, value: R) -> Option<R> {
        if let Some(&position) = self.positions.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Value stored under `key`
    pub fn get(&self, key: &Key) -> Option<&R> {
        self.positions
            .get(key)
            .map(|&position| &self.entries[position].1)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &R)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Consume into ordered entries
    pub fn into_entries(self) -> Vec<(Key, R)> {
        self.entries
    }
}

impl<R> IntoIterator for Mapping<R> {
    type Item = (Key, R);
    type IntoIter = std::vec::IntoIter<(Key, R)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Maps the entries inside a window of a source
#[derive(Debug, Clone)]
pub struct WindowedMapper<N = StrictIntNormalizer> {
    normalizer: Normalizer,
    ints: N,
}

impl WindowedMapper {
    /// Mapper using the strict integer normalizer
    pub fn new(config: IterableConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
            ints: StrictIntNormalizer,
        }
    }
}

impl<N: IntNormalizer> WindowedMapper<N> {
    /// Mapper using a custom integer normalizer for window bounds
    pub fn with_normalizer(config: IterableConfig, ints: N) -> Self {
        Self {
            normalizer: Normalizer::new(config),
            ints,
        }
    }

    /// Transform the entries of `iterable` inside `[start, start + count)`
    /// into `out`, under their original keys and in encounter order.
    ///
    /// `transform` receives each value, its key, and the shape of the source
    /// it came from. Entries outside the window never reach it.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `iterable` cannot be normalized, or `start`
    ///   or `count` is not a non-negative integer; checked in that order,
    ///   before any entry is visited
    /// - `Invocation` carrying the transform's own error, unchanged; entries
    ///   already written to `out` stay there
    pub fn map_iterable<V, R, F>(
        &self,
        iterable: Source<V>,
        transform: F,
        start: impl Into<IntLike>,
        count: impl Into<IntLike>,
        out: &mut Mapping<R>,
    ) -> Result<(), IterableError>
    where
        V: 'static,
        F: FnMut(V, &Key, SourceKind) -> Result<R, InvocationError>,
    {
        let kind = iterable.kind();
        let entries = self.normalizer.normalize(iterable)?;
        let start = non_negative(&self.ints, &start.into(), "start")?;
        let count = non_negative(&self.ints, &count.into(), "count")?;
        walk(entries, kind, Window::new(start, count), transform, out)
    }

    /// Like [`WindowedMapper::map_iterable`] with a typed window, returning a
    /// fresh mapping
    pub fn map_window<V, R, F>(
        &self,
        iterable: Source<V>,
        transform: F,
        window: Window,
    ) -> Result<Mapping<R>, IterableError>
    where
        V: 'static,
        F: FnMut(V, &Key, SourceKind) -> Result<R, InvocationError>,
    {
        let kind = iterable.kind();
        let entries = self.normalizer.normalize(iterable)?;
        let mut out = Mapping::new();
        walk(entries, kind, window, transform, &mut out)?;
        Ok(out)
    }
}

fn walk<V, R, F>(
    entries: Box<dyn EntryIterator<V>>,
    kind: SourceKind,
    window: Window,
    mut transform: F,
    out: &mut Mapping<R>,
) -> Result<(), IterableError>
where
    F: FnMut(V, &Key, SourceKind) -> Result<R, InvocationError>,
{
    debug!(start = window.start, count = window.count, %kind, "mapping window");
    let mut emitted = 0;
    for (key, value) in entries.skip(window.start) {
        let result = transform(value, &key, kind)?;
        out.insert(key, result);
        emitted += 1;
        // Stop before pulling anything past the window.
        if window.count > 0 && emitted == window.count {
            break;
        }
    }
    debug!(emitted, "window mapped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        let unbounded = Window::all();
        assert_eq!(unbounded.end(), None);
        assert!(unbounded.contains(0));
        assert!(unbounded.contains(usize::MAX));

        let window = Window::new(2, 3);
        assert_eq!(window.end(), Some(5));
        assert!(!window.contains(1));
        assert!(window.contains(2));
        assert!(window.contains(4));
        assert!(!window.contains(5));

        assert_eq!(Window::new(usize::MAX, 2).end(), Some(usize::MAX));
    }

    #[test]
    fn test_mapping_replaces_in_place() {
        let mut mapping = Mapping::new();
        mapping.insert(Key::from("a"), 1);
        mapping.insert(Key::from("b"), 2);
        assert_eq!(mapping.insert(Key::from("a"), 3), Some(1));

        let entries = mapping.into_entries();
        assert_eq!(entries, vec![(Key::from("a"), 3), (Key::from("b"), 2)]);
    }

    #[test]
    fn test_wide_window_maps_every_entry_once() {
        let len = 50_000i64;
        let source = Source::lazy((0..len).map(|i| (Key::Index(i), i)));
        let mapper = WindowedMapper::new(IterableConfig::default());
        let out = mapper
            .map_window(source, |value, _, _| Ok(value + 1), Window::all())
            .unwrap();
        assert_eq!(out.len(), 50_000);
        assert_eq!(out.get(&Key::Index(len - 1)), Some(&len));
        assert_eq!(out.keys().next(), Some(&Key::Index(0)));
    }

    #[test]
    fn test_bounded_window_stops_on_endless_source() {
        let endless = Source::lazy((0..).map(|i: i64| (Key::Index(i), i)));
        let mapper = WindowedMapper::new(IterableConfig::default());
        let out = mapper
            .map_window(endless, |value, _, _| Ok(value * 10), Window::new(3, 2))
            .unwrap();
        assert_eq!(
            out.into_entries(),
            vec![(Key::Index(3), 30), (Key::Index(4), 40)]
        );
    }
}
