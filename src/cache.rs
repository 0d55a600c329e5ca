//! Persisted fingerprint history used to skip owners whose language
//! files have not changed since the last successful sync.
//!
//! The store is version-tagged with the crate release. A version
//! mismatch, unreadable file or parse failure silently rebuilds an
//! empty store — wrongly skipping a needed sync is worse than losing
//! cache warmth. Mutation is not internally synchronized; callers keep
//! all reads and writes on one coordinating thread.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// File name of the persisted store, relative to the resource pack root.
pub const CACHE_FILE_NAME: &str = ".mc-i18n-sync-cache.json";

/// Store format version; entries from other releases are not trusted.
const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error persisting the cache store. Loading never fails — corruption
/// self-heals to an empty store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Creating the parent directory failed.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing the store failed.
    #[error("failed to save cache to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Encoding the store failed.
    #[error("failed to encode cache: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fingerprints recorded for one owner at its last successful sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Name of the artifact the payloads came from (e.g. a jar file).
    pub artifact_name: String,
    /// Fingerprint of the incoming reference map, if one was present.
    pub reference_fp: Option<Fingerprint>,
    /// Fingerprint of the incoming dependent map, if one was present.
    pub dependent_fp: Option<Fingerprint>,
    /// When the owner was last synced.
    pub last_sync: DateTime<Utc>,
}

/// The process-wide cache store, keyed by owner id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStore {
    version: String,
    last_updated: DateTime<Utc>,
    owners: BTreeMap<String, CacheEntry>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            last_updated: Utc::now(),
            owners: BTreeMap::new(),
        }
    }
}

impl CacheStore {
    /// Create an empty store tagged with the current version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from disk, rebuilding an empty one on any problem.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read cache, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_slice::<Self>(&bytes) {
            Ok(store) if store.version == CACHE_VERSION => {
                tracing::debug!(path = %path.display(), owners = store.owners.len(), "loaded cache");
                store
            }
            Ok(store) => {
                tracing::warn!(
                    expected = CACHE_VERSION,
                    found = %store.version,
                    "cache version mismatch, starting empty"
                );
                Self::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache is corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Persist the store, stamping the update time and creating missing
    /// parent directories.
    ///
    /// # Errors
    /// [`CacheError`] on I/O or encoding failure.
    pub fn save(&mut self, path: &Path) -> Result<(), CacheError> {
        self.last_updated = Utc::now();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        std::fs::write(path, text).map_err(|source| CacheError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), owners = self.owners.len(), "saved cache");
        Ok(())
    }

    /// Whether the owner needs syncing.
    ///
    /// True for an unknown owner, or when any *provided* fingerprint
    /// differs from the stored one. An omitted fingerprint contributes
    /// no information either way.
    #[must_use]
    pub fn is_changed(
        &self,
        owner: &str,
        reference_fp: Option<&Fingerprint>,
        dependent_fp: Option<&Fingerprint>,
    ) -> bool {
        let Some(entry) = self.owners.get(owner) else {
            return true;
        };

        if let Some(fp) = reference_fp {
            if entry.reference_fp.as_ref() != Some(fp) {
                return true;
            }
        }
        if let Some(fp) = dependent_fp {
            if entry.dependent_fp.as_ref() != Some(fp) {
                return true;
            }
        }
        false
    }

    /// Overwrite the owner's entry, stamping the current time.
    pub fn update(
        &mut self,
        owner: impl Into<String>,
        artifact_name: impl Into<String>,
        reference_fp: Option<Fingerprint>,
        dependent_fp: Option<Fingerprint>,
    ) {
        self.owners.insert(
            owner.into(),
            CacheEntry {
                artifact_name: artifact_name.into(),
                reference_fp,
                dependent_fp,
                last_sync: Utc::now(),
            },
        );
    }

    /// Delete the owner's entry if present.
    pub fn remove(&mut self, owner: &str) {
        self.owners.remove(owner);
    }

    /// Owner ids currently tracked.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.owners.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::map::LanguageMap;

    fn fp(pairs: &[(&str, &str)]) -> Fingerprint {
        let map: LanguageMap = pairs.iter().copied().collect();
        fingerprint(&map)
    }

    #[googletest::test]
    fn test_gating_scenario() {
        let mut store = CacheStore::new();
        let h1 = fp(&[("a", "1")]);
        let h2 = fp(&[("b", "2")]);
        let h3 = fp(&[("c", "3")]);

        // Unseen owner is always changed
        expect_that!(store.is_changed("somemod", Some(&h1), Some(&h2)), eq(true));

        store.update("somemod", "somemod-1.0.jar", Some(h1.clone()), Some(h2.clone()));

        expect_that!(store.is_changed("somemod", Some(&h1), Some(&h2)), eq(false));
        expect_that!(store.is_changed("somemod", Some(&h1), Some(&h3)), eq(true));
    }

    #[googletest::test]
    fn test_omitted_fingerprint_contributes_nothing() {
        let mut store = CacheStore::new();
        let h1 = fp(&[("a", "1")]);
        let h2 = fp(&[("b", "2")]);

        store.update("somemod", "somemod.jar", Some(h1.clone()), Some(h2));

        expect_that!(store.is_changed("somemod", None, None), eq(false));
        expect_that!(store.is_changed("somemod", Some(&h1), None), eq(false));
    }

    #[googletest::test]
    fn test_provided_fingerprint_against_stored_none_is_changed() {
        let mut store = CacheStore::new();
        let h1 = fp(&[("a", "1")]);

        store.update("somemod", "somemod.jar", Some(h1.clone()), None);

        expect_that!(store.is_changed("somemod", Some(&h1), Some(&h1)), eq(true));
    }

    #[googletest::test]
    fn test_update_overwrites() {
        let mut store = CacheStore::new();
        let h1 = fp(&[("a", "1")]);
        let h2 = fp(&[("a", "2")]);

        store.update("somemod", "v1.jar", Some(h1), None);
        store.update("somemod", "v2.jar", Some(h2.clone()), None);

        expect_that!(store.is_changed("somemod", Some(&h2), None), eq(false));
        expect_that!(store.owners().count(), eq(1));
    }

    #[googletest::test]
    fn test_remove_is_noop_for_unknown_owner() {
        let mut store = CacheStore::new();
        store.update("somemod", "x.jar", None, None);

        store.remove("other");
        expect_that!(store.owners().count(), eq(1));

        store.remove("somemod");
        expect_that!(store.owners().count(), eq(0));
    }

    #[googletest::test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        let h1 = fp(&[("a", "1")]);

        let mut store = CacheStore::new();
        store.update("somemod", "somemod.jar", Some(h1.clone()), None);
        store.save(&path).unwrap();

        let loaded = CacheStore::load(&path);

        expect_that!(loaded.is_changed("somemod", Some(&h1), None), eq(false));
    }

    #[googletest::test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();

        let store = CacheStore::load(&dir.path().join("nope.json"));

        expect_that!(store.owners().count(), eq(0));
    }

    #[googletest::test]
    fn test_load_corrupt_file_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let store = CacheStore::load(&path);

        expect_that!(store.owners().count(), eq(0));
    }

    #[googletest::test]
    fn test_load_version_mismatch_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);

        let mut store = CacheStore::new();
        store.update("somemod", "x.jar", None, None);
        store.save(&path).unwrap();

        // Rewrite the version tag to an older release
        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replace(CACHE_VERSION, "0.0.0-old");
        std::fs::write(&path, tampered).unwrap();

        let loaded = CacheStore::load(&path);

        expect_that!(loaded.owners().count(), eq(0));
    }

    #[googletest::test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("deep/nested").join(CACHE_FILE_NAME);

        CacheStore::new().save(&path).unwrap();

        expect_that!(path.exists(), eq(true));
    }

    #[googletest::test]
    fn test_clear() {
        let mut store = CacheStore::new();
        store.update("a", "a.jar", None, None);
        store.update("b", "b.jar", None, None);

        store.clear();

        expect_that!(store.owners().count(), eq(0));
    }
}
