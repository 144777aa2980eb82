//! Array-backed shapes: structures, records and the iterator over them

use std::collections::HashMap;

use super::{Countable, EntryIterator, Identity, Key, Record};
use crate::IterableError;

/// Ordered indexed/associative structure
///
/// Keys are unique. Inserting an existing key replaces its value in place,
/// so encounter order is the order keys were first inserted. A key index
/// kept beside the entries makes inserts and lookups O(1) amortized.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure<V> {
    entries: Vec<(Key, V)>,
    positions: HashMap<Key, usize>,
    max_index: Option<i64>,
}

impl<V> Default for Structure<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            max_index: None,
        }
    }
}

impl<V> Structure<V> {
    /// Empty structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexed structure with keys `0..n`
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        let mut structure = Self::new();
        for (index, value) in values.into_iter().enumerate() {
            structure.insert(index, value);
        }
        structure
    }

    /// Structure from `(key, value)` pairs; later duplicates overwrite earlier ones
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut structure = Self::new();
        for (key, value) in entries {
            structure.insert(key, value);
        }
        structure
    }

    /// Insert or replace; returns the replaced value
    pub fn insert(&mut self, key: impl Into<Key>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(&position) = self.positions.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        if let Key::Index(index) = key {
            self.max_index = Some(self.max_index.map_or(index, |max| max.max(index)));
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Append under the next free index (one past the largest index key,
    /// never below zero) and return that key.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the largest index key is `i64::MAX`, leaving
    /// no next index.
    pub fn push(&mut self, value: V) -> Result<Key, IterableError> {
        let next = match self.max_index {
            None => 0,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                IterableError::invalid_argument(format!(
                    "cannot append: the next index after {max} is out of range"
                ))
            })?,
        };
        let key = Key::Index(next.max(0));
        self.insert(key.clone(), value);
        Ok(key)
    }

    /// Value stored under `key`
    pub fn get(&self, key: &Key) -> Option<&V> {
        self.positions
            .get(key)
            .map(|&position| &self.entries[position].1)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Consume into ordered entries
    pub fn into_entries(self) -> Vec<(Key, V)> {
        self.entries
    }
}

impl<K: Into<Key>, V> FromIterator<(K, V)> for Structure<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<V> IntoIterator for Structure<V> {
    type Item = (Key, V);
    type IntoIter = std::vec::IntoIter<(Key, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V> Countable for Structure<V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Record whose fields keep their declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Fields<V> {
    fields: Vec<(String, V)>,
}

impl<V> Fields<V> {
    /// Record with no fields
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder-style [`Fields::set`]
    pub fn with(mut self, name: impl Into<String>, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, keeping its position if it already exists
    pub fn set(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Field value by name
    pub fn get(&self, name: &str) -> Option<&V> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }
}

impl<V> Record<V> for Fields<V> {
    fn len(&self) -> usize {
        self.fields.len()
    }

    fn into_entries(self: Box<Self>) -> Vec<(Key, V)> {
        self.fields
            .into_iter()
            .map(|(name, value)| (Key::Name(name), value))
            .collect()
    }
}

/// Array-backed entry iterator
///
/// Countable: reports the entries it has not yielded yet, so a native count
/// always agrees with a traversal from the same position.
#[derive(Debug)]
pub struct ArrayIterator<V> {
    identity: Identity,
    entries: std::vec::IntoIter<(Key, V)>,
}

impl<V> ArrayIterator<V> {
    /// Iterator over owned entries
    pub fn new(entries: Vec<(Key, V)>) -> Self {
        Self {
            identity: Identity::fresh(),
            entries: entries.into_iter(),
        }
    }
}

impl<V> From<Structure<V>> for ArrayIterator<V> {
    fn from(structure: Structure<V>) -> Self {
        Self::new(structure.into_entries())
    }
}

impl<V> Iterator for ArrayIterator<V> {
    type Item = (Key, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<V> Countable for ArrayIterator<V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<V> EntryIterator<V> for ArrayIterator<V> {
    fn as_countable(&self) -> Option<&dyn Countable> {
        Some(self)
    }

    fn identity(&self) -> Option<Identity> {
        Some(self.identity)
    }
}
