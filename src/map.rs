//! Insertion-ordered string map for translation entries.
//!
//! Key order in a language file is meaningful and must survive a full
//! load/merge/serialize round trip, which rules out plain hash maps.
//! `LanguageMap` keeps entries in a vector and maintains a separate
//! key-to-position index for O(1) lookup.

use std::collections::HashMap;

/// An ordered map of translation keys to their text.
///
/// Iteration yields entries in insertion order. Updating an existing key
/// keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct LanguageMap {
    /// Entries in insertion order.
    entries: Vec<(String, String)>,
    /// Key to position in `entries`.
    index: HashMap<String, usize>,
}

impl LanguageMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a key/value pair.
    ///
    /// A new key is appended at the end; an existing key is updated in
    /// place and keeps its position. Returns the previous value if the
    /// key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(&pos) = self.index.get(&key) {
            self.entries
                .get_mut(pos)
                .map(|entry| std::mem::replace(&mut entry.1, value))
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
            None
        }
    }

    /// Look up the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .and_then(|&pos| self.entries.get(pos))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// A copy of this map with entries sorted lexicographically by key.
    ///
    /// Values are unchanged. Used by the fingerprinter so that two maps
    /// with the same pairs in different order digest identically.
    #[must_use]
    pub fn sorted_by_key(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries.into_iter().collect()
    }
}

impl PartialEq for LanguageMap {
    /// Order-sensitive equality: same pairs in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for LanguageMap {}

impl FromIterator<(String, String)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[googletest::test]
    fn test_insert_preserves_order() {
        let mut map = LanguageMap::new();
        map.insert("b", "2");
        map.insert("a", "1");
        map.insert("c", "3");

        let keys: Vec<_> = map.keys().collect();
        expect_that!(keys, eq(&vec!["b", "a", "c"]));
    }

    #[googletest::test]
    fn test_insert_updates_in_place() {
        let mut map = LanguageMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        let previous = map.insert("a", "updated");

        assert_eq!(previous, Some("1".to_string()));
        expect_that!(map.get("a"), some(eq("updated")));

        let keys: Vec<_> = map.keys().collect();
        expect_that!(keys, eq(&vec!["a", "b"]));
    }

    #[googletest::test]
    fn test_get_missing_key() {
        let map = LanguageMap::new();
        expect_that!(map.get("missing"), none());
        expect_that!(map.contains_key("missing"), eq(false));
    }

    #[googletest::test]
    fn test_sorted_by_key() {
        let map: LanguageMap = [("c", "3"), ("a", "1"), ("b", "2")].into_iter().collect();

        let sorted = map.sorted_by_key();

        let keys: Vec<_> = sorted.keys().collect();
        expect_that!(keys, eq(&vec!["a", "b", "c"]));
        expect_that!(sorted.get("c"), some(eq("3")));
        // 元のマップは変更されない
        expect_that!(map.keys().next(), some(eq("c")));
    }

    #[googletest::test]
    fn test_equality_is_order_sensitive() {
        let a: LanguageMap = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: LanguageMap = [("y", "2"), ("x", "1")].into_iter().collect();
        let c: LanguageMap = [("x", "1"), ("y", "2")].into_iter().collect();

        expect_that!(a == b, eq(false));
        expect_that!(a == c, eq(true));
    }

    #[rstest]
    #[case(&[], 0, true)]
    #[case(&[("a", "1")], 1, false)]
    #[case(&[("a", "1"), ("b", "2"), ("c", "3")], 3, false)]
    fn test_len_and_is_empty(
        #[case] pairs: &[(&str, &str)],
        #[case] len: usize,
        #[case] empty: bool,
    ) {
        let map: LanguageMap = pairs.iter().copied().collect();
        assert_eq!(map.len(), len);
        assert_eq!(map.is_empty(), empty);
    }
}
