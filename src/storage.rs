//! Resource pack persistence.
//!
//! Language files live at `assets/<owner>/lang/<language>.json` under
//! the pack root; the change-detection cache sits next to `assets/` at
//! the root. Reading a missing file is not an error — it simply means
//! there is no prior state for that owner/language yet.

use std::path::{
    Path,
    PathBuf,
};

use crate::cache::CACHE_FILE_NAME;
use crate::json::{
    self,
    ParseError,
    WriteError,
};
use crate::map::LanguageMap;

/// A resource pack directory holding synchronized language files.
#[derive(Debug, Clone)]
pub struct ResourcePack {
    root: PathBuf,
}

impl ResourcePack {
    /// Wrap a pack root directory (it does not need to exist yet).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The pack root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one owner's language file.
    #[must_use]
    pub fn lang_path(&self, owner: &str, language: &str) -> PathBuf {
        self.root.join("assets").join(owner).join("lang").join(format!("{language}.json"))
    }

    /// Path of the persisted change-detection cache.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.root.join(CACHE_FILE_NAME)
    }

    /// Load the stored map for an owner/language, `None` if absent.
    ///
    /// # Errors
    /// [`ParseError`] when the stored file exists but cannot be parsed.
    pub fn load(&self, owner: &str, language: &str) -> Result<Option<LanguageMap>, ParseError> {
        let path = self.lang_path(owner, language);
        if !path.exists() {
            return Ok(None);
        }
        let map = json::load_file(&path)?;
        tracing::debug!(owner, language, keys = map.len(), "loaded stored language file");
        Ok(Some(map))
    }

    /// Write a merged map to its conventional path.
    ///
    /// # Errors
    /// [`WriteError`] on I/O failure.
    pub fn save(&self, owner: &str, language: &str, map: &LanguageMap) -> Result<(), WriteError> {
        let path = self.lang_path(owner, language);
        json::write_file(&path, map)?;
        tracing::debug!(owner, language, keys = map.len(), "saved language file");
        Ok(())
    }

    /// Owners that currently have a `lang/` directory in the pack.
    #[must_use]
    pub fn owners(&self) -> Vec<String> {
        let assets = self.root.join("assets");
        let Ok(entries) = std::fs::read_dir(&assets) else {
            return Vec::new();
        };

        let mut owners: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().join("lang").is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        owners.sort();
        owners
    }
}
