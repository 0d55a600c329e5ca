//! Order-independent content digests for change detection.
//!
//! A fingerprint is the SHA-256 of the canonical serialization with keys
//! sorted lexicographically, so storage order never affects it. It is a
//! cheap equality oracle, not a security primitive.

use serde::{
    Deserialize,
    Serialize,
};
use sha2::{
    Digest,
    Sha256,
};

use crate::json;
use crate::map::LanguageMap;

/// Hex-encoded SHA-256 digest of a map's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the content fingerprint of a map.
#[must_use]
pub fn fingerprint(map: &LanguageMap) -> Fingerprint {
    let canonical = json::serialize(&map.sorted_by_key());
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Fingerprint(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn test_order_does_not_affect_fingerprint() {
        let a: LanguageMap = [("x", "1"), ("y", "2"), ("z", "3")].into_iter().collect();
        let b: LanguageMap = [("z", "3"), ("x", "1"), ("y", "2")].into_iter().collect();

        expect_that!(fingerprint(&a), eq(&fingerprint(&b)));
    }

    #[googletest::test]
    fn test_content_change_changes_fingerprint() {
        let a: LanguageMap = [("x", "1")].into_iter().collect();
        let b: LanguageMap = [("x", "2")].into_iter().collect();
        let c: LanguageMap = [("y", "1")].into_iter().collect();

        expect_that!(fingerprint(&a), not(eq(&fingerprint(&b))));
        expect_that!(fingerprint(&a), not(eq(&fingerprint(&c))));
    }

    #[googletest::test]
    fn test_fingerprint_is_hex_sha256() {
        let map: LanguageMap = [("k", "v")].into_iter().collect();

        let fp = fingerprint(&map);

        expect_that!(fp.as_str().len(), eq(64));
        expect_that!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()), eq(true));
    }

    #[googletest::test]
    fn test_empty_map_fingerprint_is_stable() {
        expect_that!(fingerprint(&LanguageMap::new()), eq(&fingerprint(&LanguageMap::new())));
    }
}
