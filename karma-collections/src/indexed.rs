//! Insertion-ordered map with positional lookup.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A map that answers both `get(&key)` and `get_index(position)`.
///
/// Entries keep the order they were inserted in. Re-inserting an existing key
/// replaces the value in place without moving the entry. Removal shifts the
/// entries behind it, so positions stay dense and ordered.
///
/// Keys are cloned into the positional index, so `K` must be `Clone`; keyed
/// lookups are `O(1)`, removal is `O(n)` in the number of entries behind the
/// removed one.
///
/// # Example
///
/// ```
/// use karma_collections::IndexedMap;
///
/// let mut routes: IndexedMap<&str, u16> = IndexedMap::new();
/// routes.insert("first", 10);
/// routes.insert("second", 20);
/// routes.insert("third", 30);
///
/// assert_eq!(routes.get(&"second"), Some(&20));
/// assert_eq!(routes.get_index(1), Some((&"second", &20)));
/// assert_eq!(routes.index_of(&"third"), Some(2));
///
/// routes.shift_remove(&"first");
/// assert_eq!(routes.get_index(0), Some((&"second", &20)));
/// ```
pub struct IndexedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> IndexedMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates an empty map with pre-allocated storage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a key-value pair.
    ///
    /// An existing key keeps its position; the previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let pos = *self.index.get(key)?;
        Some(&self.entries[pos].1)
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let pos = *self.index.get(key)?;
        Some(&mut self.entries[pos].1)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the entry at `position` in insertion order.
    pub fn get_index(&self, position: usize) -> Option<(&K, &V)> {
        self.entries.get(position).map(|(k, v)| (k, v))
    }

    /// Returns the position of `key` in insertion order.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Removes `key`, shifting the entries behind it down one position.
    ///
    /// Preserves the relative order of the remaining entries.
    pub fn shift_remove(&mut self, key: &K) -> Option<V> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for (k, _) in &self.entries[pos..] {
            if let Some(p) = self.index.get_mut(k) {
                *p -= 1;
            }
        }
        Some(value)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Returns an iterator over entries in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Returns an iterator over keys in insertion order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over values in insertion order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: Eq + Hash + Clone, V> Default for IndexedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IndexedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for IndexedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
