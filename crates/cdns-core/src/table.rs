//! Content-addressed block tables.
//!
//! Every repeated entity in a C-DNS block (addresses, names, signatures,
//! question and RR lists, ...) is stored once in a [`DedupTable`] and
//! referenced elsewhere by its [`Index`]. Indexes are handed out in
//! insertion order, so reading [`DedupTable::values`] front to back yields
//! the table exactly as it must be serialized.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Position of an entry in a block table.
///
/// Only meaningful relative to the block that owns the table, and invalid
/// once that block is cleared.
pub type Index = usize;

/// Identity of a value stored in a [`DedupTable`].
///
/// Fixed-layout entities return themselves; wrapper types such as byte
/// strings and index lists return the wrapped contents, which lets callers
/// look entries up without building the wrapper first.
pub trait TableKey {
    /// Lookup key type
    type Key: Hash + Eq + Clone;

    /// Key used for deduplication
    fn key(&self) -> &Self::Key;
}

/// Generic deduplicating table assigning sequential indexes.
#[derive(Debug, Clone)]
pub struct DedupTable<T: TableKey> {
    lookup: HashMap<T::Key, Index>,
    values: Vec<T>,
}

impl<T: TableKey> Default for DedupTable<T> {
    fn default() -> Self {
        Self {
            lookup: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<T: TableKey> DedupTable<T> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` unless an equal entry exists; return its index either way
    pub fn add(&mut self, value: T) -> Index {
        if let Some(&index) = self.lookup.get(value.key()) {
            return index;
        }

        let index = self.values.len();
        self.lookup.insert(value.key().clone(), index);
        self.values.push(value);
        index
    }

    /// Look `key` up and only build the value with `make` when it is missing
    pub fn add_by_key<Q>(&mut self, key: &Q, make: impl FnOnce() -> T) -> Index
    where
        T::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.find(key) {
            Some(index) => index,
            None => self.add(make()),
        }
    }

    /// Find the index of the entry with the given key, without inserting
    pub fn find<Q>(&self, key: &Q) -> Option<Index>
    where
        T::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.get(key).copied()
    }

    /// Entry stored at `index`
    #[must_use]
    pub fn get(&self, index: Index) -> Option<&T> {
        self.values.get(index)
    }

    /// Number of distinct entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the table holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in index order
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over entries in index order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Drop every entry; the next insert gets index 0 again
    pub fn clear(&mut self) {
        self.lookup.clear();
        self.values.clear();
    }
}

impl<'a, T: TableKey> IntoIterator for &'a DedupTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Pair(u16, u16);

    impl TableKey for Pair {
        type Key = Self;

        fn key(&self) -> &Self {
            self
        }
    }

    #[derive(Debug, Clone)]
    struct Bytes {
        data: Vec<u8>,
    }

    impl TableKey for Bytes {
        type Key = Vec<u8>;

        fn key(&self) -> &Vec<u8> {
            &self.data
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut table = DedupTable::new();
        let first = table.add(Pair(1, 1));
        let second = table.add(Pair(1, 1));
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_indexes_follow_insertion_order() {
        let mut table = DedupTable::new();
        let values = [Pair(28, 1), Pair(1, 1), Pair(15, 1), Pair(1, 3)];
        for (i, value) in values.iter().enumerate() {
            assert_eq!(table.add(value.clone()), i);
        }
        // Re-adding in a different order hands back the original indexes.
        assert_eq!(table.add(Pair(15, 1)), 2);
        assert_eq!(table.add(Pair(28, 1)), 0);
        assert_eq!(table.values(), &values);
    }

    #[test]
    fn test_find_does_not_insert() {
        let mut table: DedupTable<Pair> = DedupTable::new();
        assert_eq!(table.find(&Pair(1, 1)), None);
        assert!(table.is_empty());

        table.add(Pair(1, 1));
        assert_eq!(table.find(&Pair(1, 1)), Some(0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_derived_key_lookup() {
        let mut table = DedupTable::new();
        let a = table.add_by_key(&[192u8, 0, 2, 1][..], || Bytes {
            data: vec![192, 0, 2, 1],
        });
        let mut built = false;
        let b = table.add_by_key(&[192u8, 0, 2, 1][..], || {
            built = true;
            Bytes {
                data: vec![192, 0, 2, 1],
            }
        });
        assert_eq!(a, b);
        assert!(!built, "existing entry must not be rebuilt");
        assert_eq!(table.find(&[192u8, 0, 2, 1][..]), Some(0));
        assert_eq!(table.get(0).map(|v| v.data.len()), Some(4));
    }

    #[test]
    fn test_clear_resets_indexes() {
        let mut table = DedupTable::new();
        table.add(Pair(1, 1));
        table.add(Pair(2, 1));
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.find(&Pair(2, 1)), None);
        assert_eq!(table.add(Pair(2, 1)), 0);
    }
}
