//! Coordinating layer driving one synchronization pass.
//!
//! Parsing, merging and persistence run on parallel worker threads, one
//! owner at a time per worker. The cache is the only shared mutable
//! resource and is never handed to a worker: gating reads and update
//! writes happen between the parallel stages, on the coordinator's own
//! thread.
//!
//! A failure in one owner (malformed payload, unwritable file) is
//! recorded in that owner's result and never aborts the batch.

use std::collections::{
    BTreeSet,
    VecDeque,
};
use std::sync::{
    Mutex,
    mpsc,
};

use thiserror::Error;

use crate::cache::{
    CacheError,
    CacheStore,
};
use crate::config::SyncSettings;
use crate::fingerprint::{
    Fingerprint,
    fingerprint,
};
use crate::json::{
    self,
    ParseError,
    WriteError,
};
use crate::map::LanguageMap;
use crate::provider::{
    PayloadSource,
    ProviderError,
    SyncUnit,
};
use crate::storage::ResourcePack;
use crate::sync::engine;
use crate::sync::result::{
    SyncReport,
    SyncResult,
};

/// Error aborting a whole pass (per-owner problems stay in the report).
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Failure of a single owner's sync.
#[derive(Error, Debug)]
enum OwnerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// One incoming dependent payload, parsed.
struct IncomingDependent {
    language: String,
    map: LanguageMap,
    fp: Fingerprint,
}

/// Parsed payloads of one owner.
struct IncomingMaps {
    reference: Option<(LanguageMap, Fingerprint)>,
    /// Configured dependents present in the unit, in configuration order.
    dependents: Vec<IncomingDependent>,
}

impl IncomingMaps {
    fn dependent(&self, language: &str) -> Option<&LanguageMap> {
        self.dependents.iter().find(|d| d.language == language).map(|d| &d.map)
    }

    fn reference_fp(&self) -> Option<&Fingerprint> {
        self.reference.as_ref().map(|(_, fp)| fp)
    }

    fn primary_dependent_fp(&self, settings: &SyncSettings) -> Option<&Fingerprint> {
        let primary = settings.primary_dependent()?;
        self.dependents.iter().find(|d| d.language == primary).map(|d| &d.fp)
    }
}

/// Output of the parallel parse stage.
struct LoadedUnit {
    owner: String,
    artifact_name: String,
    maps: Result<IncomingMaps, ParseError>,
}

/// A unit that passed cache gating and will be merged.
struct GatedUnit {
    owner: String,
    artifact_name: String,
    maps: IncomingMaps,
}

/// Cache mutation a worker requests; applied by the coordinator.
struct CacheUpdate {
    reference_fp: Option<Fingerprint>,
    dependent_fp: Option<Fingerprint>,
}

/// Result of merging one owner, plus the requested cache update.
struct OwnerOutcome {
    result: SyncResult,
    cache_update: Option<(String, String, CacheUpdate)>,
}

/// Drives synchronization passes against one resource pack.
#[derive(Debug)]
pub struct SyncCoordinator<'a> {
    settings: &'a SyncSettings,
    pack: ResourcePack,
}

impl<'a> SyncCoordinator<'a> {
    #[must_use]
    pub const fn new(settings: &'a SyncSettings, pack: ResourcePack) -> Self {
        Self { settings, pack }
    }

    /// Run one full pass: enumerate payloads, parse, gate against the
    /// cache, merge, persist, update and save the cache.
    ///
    /// # Errors
    /// [`SyncError`] when the payload source cannot be enumerated or
    /// the cache cannot be saved; per-owner failures are reported in
    /// the returned [`SyncReport`] instead.
    pub fn run(
        &self,
        source: &dyn PayloadSource,
        cache: &mut CacheStore,
    ) -> Result<SyncReport, SyncError> {
        let units = source.units()?;
        let workers = self.settings.worker_count();
        tracing::info!(owners = units.len(), workers, "starting synchronization pass");
        if self.settings.dry_run {
            tracing::warn!("dry run: no files will be written");
        }

        let loaded = run_parallel(units, workers, |unit| self.load_unit(unit));

        let mut report = SyncReport::default();
        let mut present = BTreeSet::new();
        let mut gated = Vec::new();
        for unit in loaded {
            present.insert(unit.owner.clone());
            self.gate_unit(unit, cache, &mut report, &mut gated);
        }

        let outcomes = run_parallel(gated, workers, |unit| self.sync_owner(&unit));
        for outcome in outcomes {
            if let Some((owner, artifact_name, update)) = outcome.cache_update {
                cache.update(owner, artifact_name, update.reference_fp, update.dependent_fp);
            }
            match (&outcome.result.error, outcome.result.skipped) {
                (Some(_), _) => tracing::error!("{}", outcome.result),
                (None, false) => tracing::info!("{}", outcome.result),
                (None, true) => tracing::debug!("{}", outcome.result),
            }
            report.results.push(outcome.result);
        }
        report.results.sort_by(|a, b| a.owner.cmp(&b.owner));

        if self.settings.prune_stale {
            prune_stale(cache, &present);
        }
        if !self.settings.dry_run {
            cache.save(&self.pack.cache_path())?;
        }

        tracing::info!(
            synced = report.synced(),
            skipped = report.skipped(),
            failed = report.failed(),
            changes = report.total_changes(),
            "synchronization pass finished"
        );
        Ok(report)
    }

    /// Parse one unit's payloads (parallel stage).
    fn load_unit(&self, unit: SyncUnit) -> LoadedUnit {
        let maps = self.parse_payloads(&unit);
        LoadedUnit { owner: unit.owner, artifact_name: unit.artifact_name, maps }
    }

    fn parse_payloads(&self, unit: &SyncUnit) -> Result<IncomingMaps, ParseError> {
        let reference = unit
            .payload(&self.settings.reference_language)
            .map(json::load_bytes)
            .transpose()?
            .map(|map| {
                let fp = fingerprint(&map);
                (map, fp)
            });

        let mut dependents = Vec::new();
        for language in &self.settings.dependent_languages {
            if let Some(bytes) = unit.payload(language) {
                let map = json::load_bytes(bytes)?;
                let fp = fingerprint(&map);
                dependents.push(IncomingDependent { language: language.clone(), map, fp });
            }
        }

        Ok(IncomingMaps { reference, dependents })
    }

    /// Decide an owner's fate from the cache (coordinator thread only).
    fn gate_unit(
        &self,
        unit: LoadedUnit,
        cache: &CacheStore,
        report: &mut SyncReport,
        gated: &mut Vec<GatedUnit>,
    ) {
        let maps = match unit.maps {
            Ok(maps) => maps,
            Err(e) => {
                tracing::error!(owner = %unit.owner, error = %e, "failed to parse incoming payloads");
                report.results.push(SyncResult::failed(unit.owner, e.to_string()));
                return;
            }
        };

        if maps.reference.is_none() && maps.dependents.is_empty() {
            tracing::debug!(owner = %unit.owner, "no relevant language payloads");
            report.results.push(SyncResult::skipped(unit.owner));
            return;
        }

        let unchanged = !self.settings.force
            && !cache.is_changed(
                &unit.owner,
                maps.reference_fp(),
                maps.primary_dependent_fp(self.settings),
            );
        if unchanged {
            tracing::debug!(owner = %unit.owner, "unchanged since last sync");
            report.results.push(SyncResult::skipped(unit.owner));
        } else {
            gated.push(GatedUnit { owner: unit.owner, artifact_name: unit.artifact_name, maps });
        }
    }

    /// Merge and persist one owner (parallel stage).
    fn sync_owner(&self, unit: &GatedUnit) -> OwnerOutcome {
        let merged = if unit.maps.reference.is_some() {
            self.sync_with_reference(unit)
        } else {
            self.sync_primary_dependents(unit)
        };

        merged.unwrap_or_else(|e| {
            tracing::debug!(owner = %unit.owner, error = %e, "owner sync failed");
            OwnerOutcome {
                result: SyncResult::failed(unit.owner.clone(), e.to_string()),
                cache_update: None,
            }
        })
    }

    /// Normal mode: the incoming reference drives the key lifecycle.
    fn sync_with_reference(&self, unit: &GatedUnit) -> Result<OwnerOutcome, OwnerError> {
        let Some((reference, _)) = &unit.maps.reference else {
            return self.sync_primary_dependents(unit);
        };

        let prior_reference = self.pack.load(&unit.owner, &self.settings.reference_language)?;
        let (merged_reference, reference_diff) =
            engine::synchronize_reference(reference, prior_reference.as_ref());

        let mut counts = ChangeCounts {
            added: reference_diff.added.len(),
            modified: reference_diff.modified.len(),
            deleted: reference_diff.deleted.len(),
        };
        let mut dependents_dirty = false;
        let mut writes = Vec::new();
        for language in &self.settings.dependent_languages {
            let prior = self.pack.load(&unit.owner, language)?;
            let merged = engine::synchronize_dependent(
                &merged_reference,
                unit.maps.dependent(language),
                prior_reference.as_ref(),
                prior.as_ref(),
                &reference_diff,
            );
            if let Some(prior) = &prior {
                counts.count_dependent_churn(prior, &merged);
                if *prior != merged {
                    dependents_dirty = true;
                }
            }
            writes.push((language.as_str(), merged));
        }

        let up_to_date =
            prior_reference.is_some() && !reference_diff.has_changes() && !dependents_dirty;
        if up_to_date {
            return Ok(OwnerOutcome {
                result: SyncResult::skipped(unit.owner.clone()),
                cache_update: Some(self.cache_update(unit)),
            });
        }
        if self.settings.dry_run {
            return Ok(OwnerOutcome { result: counts.into_result(&unit.owner), cache_update: None });
        }

        self.pack.save(&unit.owner, &self.settings.reference_language, &merged_reference)?;
        for (language, merged) in &writes {
            self.pack.save(&unit.owner, language, merged)?;
        }

        Ok(OwnerOutcome {
            result: counts.into_result(&unit.owner),
            cache_update: Some(self.cache_update(unit)),
        })
    }

    /// Fallback mode: the artifact carries only dependent payloads, so
    /// each one is authoritative for its own language.
    fn sync_primary_dependents(&self, unit: &GatedUnit) -> Result<OwnerOutcome, OwnerError> {
        let mut counts = ChangeCounts::default();
        let mut dirty = false;
        let mut writes = Vec::new();
        for incoming in &unit.maps.dependents {
            let prior = self.pack.load(&unit.owner, &incoming.language)?;
            let (merged, diff_result) =
                engine::synchronize_primary_dependent(&incoming.map, prior.as_ref());
            counts.added += diff_result.added.len();
            counts.modified += diff_result.modified.len();
            counts.deleted += diff_result.deleted.len();
            if prior.is_none() || diff_result.has_changes() {
                dirty = true;
            }
            writes.push((incoming.language.as_str(), merged));
        }

        if !dirty {
            return Ok(OwnerOutcome {
                result: SyncResult::skipped(unit.owner.clone()),
                cache_update: Some(self.cache_update(unit)),
            });
        }
        if self.settings.dry_run {
            return Ok(OwnerOutcome { result: counts.into_result(&unit.owner), cache_update: None });
        }

        for (language, merged) in &writes {
            self.pack.save(&unit.owner, language, merged)?;
        }

        Ok(OwnerOutcome {
            result: counts.into_result(&unit.owner),
            cache_update: Some(self.cache_update(unit)),
        })
    }

    fn cache_update(&self, unit: &GatedUnit) -> (String, String, CacheUpdate) {
        (
            unit.owner.clone(),
            unit.artifact_name.clone(),
            CacheUpdate {
                reference_fp: unit.maps.reference_fp().cloned(),
                dependent_fp: unit.maps.primary_dependent_fp(self.settings).cloned(),
            },
        )
    }
}

/// Change counts accumulated across the reference and dependent merges.
#[derive(Default)]
struct ChangeCounts {
    added: usize,
    modified: usize,
    deleted: usize,
}

impl ChangeCounts {
    /// Add keys a dependent merge created or orphaned relative to its
    /// stored prior state.
    fn count_dependent_churn(&mut self, prior: &LanguageMap, merged: &LanguageMap) {
        self.added += merged.keys().filter(|k| !prior.contains_key(k)).count();
        self.deleted += prior.keys().filter(|k| !merged.contains_key(k)).count();
    }

    fn into_result(self, owner: &str) -> SyncResult {
        SyncResult::synced(owner, self.added, self.modified, self.deleted)
    }
}

/// Remove cache entries for owners no longer supplied by the source.
fn prune_stale(cache: &mut CacheStore, present: &BTreeSet<String>) {
    let stale: Vec<String> =
        cache.owners().filter(|o| !present.contains(*o)).map(str::to_string).collect();
    for owner in stale {
        tracing::info!(owner = %owner, "removing cache entry for missing owner");
        cache.remove(&owner);
    }
}

/// Run `f` over `items` on `workers` threads, one item per worker turn.
///
/// Results arrive in completion order.
fn run_parallel<T, R>(items: Vec<T>, workers: usize, f: impl Fn(T) -> R + Sync) -> Vec<R>
where
    T: Send,
    R: Send,
{
    if items.is_empty() {
        return Vec::new();
    }

    let queue = Mutex::new(VecDeque::from(items));
    let (tx, rx) = mpsc::channel();
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let f = &f;
            scope.spawn(move || {
                loop {
                    let item = queue.lock().ok().and_then(|mut q| q.pop_front());
                    let Some(item) = item else { break };
                    if tx.send(f(item)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);
        rx.iter().collect()
    })
}
