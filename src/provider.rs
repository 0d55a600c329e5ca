//! Payload sources: where incoming language data comes from.
//!
//! The scanner that digs language files out of mod archives is an
//! external collaborator; the sync core only sees its output — an owner
//! id, the artifact it came from, and raw bytes per language code. The
//! in-tree [`DirectorySource`] reads the same shape from a plain
//! directory tree (`<owner>/<language>.json`), which is what the
//! integration tests and the binary use.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use thiserror::Error;

/// One owner's incoming payloads, assembled fresh per pass.
///
/// Only merged maps and fingerprints persist; the unit itself never
/// does.
#[derive(Debug, Clone)]
pub struct SyncUnit {
    /// Owner the payloads belong to.
    pub owner: String,
    /// Name of the artifact that provided them.
    pub artifact_name: String,
    /// Raw bytes per language code.
    pub payloads: Vec<(String, Vec<u8>)>,
}

impl SyncUnit {
    /// The raw payload for a language code, if the artifact carried one.
    #[must_use]
    pub fn payload(&self, language: &str) -> Option<&[u8]> {
        self.payloads
            .iter()
            .find(|(code, _)| code == language)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

/// Error enumerating payloads from a source.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The source location cannot be read.
    #[error("failed to read payload source {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An internal file pattern failed to compile.
    #[error("invalid payload pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// Supplies the incoming sync units for one pass.
pub trait PayloadSource {
    /// Enumerate every owner's payloads.
    ///
    /// # Errors
    /// [`ProviderError`] when the source itself cannot be enumerated;
    /// per-owner payload problems are left for the loader to surface.
    fn units(&self) -> Result<Vec<SyncUnit>, ProviderError>;
}

/// Directory-backed payload source: one subdirectory per owner, one
/// `<language>.json` file per payload.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Wrap a payload directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn payload_patterns() -> Result<GlobSet, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("*/*.json")?);
        builder.build()
    }
}

impl PayloadSource for DirectorySource {
    fn units(&self) -> Result<Vec<SyncUnit>, ProviderError> {
        if !self.root.is_dir() {
            return Err(ProviderError::Io {
                path: self.root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "payload directory not found",
                ),
            });
        }

        let patterns = Self::payload_patterns()?;
        let mut by_owner: BTreeMap<String, Vec<(String, Vec<u8>)>> = BTreeMap::new();

        for result in WalkBuilder::new(&self.root).hidden(false).build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "failed to read payload directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if !patterns.is_match(relative) {
                continue;
            }
            let Some((owner, language)) = split_owner_language(relative) else {
                continue;
            };

            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(source) => {
                    return Err(ProviderError::Io { path: path.to_path_buf(), source });
                }
            };
            by_owner.entry(owner).or_default().push((language, bytes));
        }

        let units = by_owner
            .into_iter()
            .map(|(owner, mut payloads)| {
                payloads.sort_by(|(a, _), (b, _)| a.cmp(b));
                SyncUnit { artifact_name: owner.clone(), owner, payloads }
            })
            .collect();
        Ok(units)
    }
}

/// `somemod/en_us.json` → `("somemod", "en_us")`.
fn split_owner_language(relative: &Path) -> Option<(String, String)> {
    let mut components = relative.components();
    let owner = components.next()?.as_os_str().to_str()?.to_string();
    let language = relative.file_stem()?.to_str()?.to_string();
    Some((owner, language))
}
