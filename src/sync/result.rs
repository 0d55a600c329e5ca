//! Per-owner and per-pass synchronization outcomes.

/// Outcome of synchronizing one owner's language files.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Owner the result belongs to.
    pub owner: String,
    /// The owner was up to date and nothing was touched.
    pub skipped: bool,
    /// Keys added across the merged files.
    pub added: usize,
    /// Keys whose reference text changed.
    pub modified: usize,
    /// Keys removed across the merged files.
    pub deleted: usize,
    /// Failure message when the owner's sync did not complete.
    pub error: Option<String>,
}

impl SyncResult {
    /// An owner skipped by cache gating or absence of payloads.
    #[must_use]
    pub fn skipped(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            skipped: true,
            added: 0,
            modified: 0,
            deleted: 0,
            error: None,
        }
    }

    /// A completed sync with its change counts.
    #[must_use]
    pub fn synced(owner: impl Into<String>, added: usize, modified: usize, deleted: usize) -> Self {
        Self { owner: owner.into(), skipped: false, added, modified, deleted, error: None }
    }

    /// A failed sync.
    #[must_use]
    pub fn failed(owner: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            skipped: false,
            added: 0,
            modified: 0,
            deleted: 0,
            error: Some(error.into()),
        }
    }

    /// Whether the sync completed (skipped counts as success).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Total number of changed keys.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.added + self.modified + self.deleted
    }
}

impl std::fmt::Display for SyncResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.skipped {
            return write!(f, "{}: skipped (no changes)", self.owner);
        }
        match &self.error {
            Some(error) => write!(f, "{}: failed ({error})", self.owner),
            None => {
                write!(f, "{}: +{} ~{} -{}", self.owner, self.added, self.modified, self.deleted)
            }
        }
    }
}

/// Aggregated results of one synchronization pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// One entry per processed owner.
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    /// Number of owners that were actually merged and written.
    #[must_use]
    pub fn synced(&self) -> usize {
        self.results.iter().filter(|r| !r.skipped && r.success()).count()
    }

    /// Number of owners skipped as unchanged.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.skipped).count()
    }

    /// Number of owners that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success()).count()
    }

    /// Sum of change counts over all owners.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.results.iter().map(SyncResult::total_changes).sum()
    }
}
