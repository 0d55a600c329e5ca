//! Set-based classification of differences between two maps.

use std::collections::BTreeSet;

use crate::map::LanguageMap;

/// Keys classified by how they changed between an old and a new map.
///
/// The four sets are pairwise disjoint and jointly cover the union of
/// both key sets: `deleted ∪ modified ∪ unchanged ⊆ keys(old)` and
/// `added ∪ modified ∪ unchanged ⊆ keys(new)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Keys only in the new map.
    pub added: BTreeSet<String>,
    /// Keys in both maps with differing values.
    pub modified: BTreeSet<String>,
    /// Keys only in the old map.
    pub deleted: BTreeSet<String>,
    /// Keys in both maps with equal values.
    pub unchanged: BTreeSet<String>,
}

impl DiffResult {
    /// Whether anything was added, modified or deleted.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty() || !self.deleted.is_empty()
    }

    /// Total number of changed keys.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Whether the key was added or modified.
    #[must_use]
    pub fn is_changed_key(&self, key: &str) -> bool {
        self.added.contains(key) || self.modified.contains(key)
    }
}

impl std::fmt::Display for DiffResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{} ~{} -{}", self.added.len(), self.modified.len(), self.deleted.len())
    }
}

/// Classify every key of `old` and `new` into exactly one set.
///
/// Pure set arithmetic, O(n); empty and fully-disjoint inputs need no
/// special casing.
#[must_use]
pub fn diff(old: &LanguageMap, new: &LanguageMap) -> DiffResult {
    let old_keys: BTreeSet<&str> = old.keys().collect();
    let new_keys: BTreeSet<&str> = new.keys().collect();

    let added = new_keys.difference(&old_keys).map(|k| (*k).to_string()).collect();
    let deleted = old_keys.difference(&new_keys).map(|k| (*k).to_string()).collect();

    let mut modified = BTreeSet::new();
    let mut unchanged = BTreeSet::new();
    for key in old_keys.intersection(&new_keys) {
        if old.get(key) == new.get(key) {
            unchanged.insert((*key).to_string());
        } else {
            modified.insert((*key).to_string());
        }
    }

    DiffResult { added, modified, deleted, unchanged }
}
