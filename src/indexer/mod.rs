//! Index orchestration
//!
//! The Indexer owns the live snapshot for the whole run. It decides whether
//! the cached snapshot can be trusted, fans scans out to one blocking worker
//! per root directory, and persists the result after every change.
//!
//! Lifecycle:
//! - `start` loads and validates the cache (Start -> Ready | NeedsFullScan)
//! - `full_scan` builds the index from a directory list (NeedsFullScan -> Ready)
//! - `add_directory` scans one more root and merges it in
//! - `refresh` rebuilds everything from the known roots
//! - `files_moved` refreshes after a move took photos out of their roots

pub mod scanner;

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

use crate::error::{IndexError, Result};
use crate::fileops::FileOpReport;
use crate::media::year::resolve_year;
use crate::state::data::{IndexSnapshot, IndexedDirectories, PhotoIndex};
use crate::state::shared::SharedPhotoIndex;
use crate::state::store::{DiskFilesystem, IndexStore};
use scanner::scan_directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerState {
    /// Nothing loaded yet
    Start,
    /// No usable cache; a directory list must be scanned
    NeedsFullScan,
    /// The index can be displayed
    Ready,
}

/// What happened when the cached snapshot was opened
#[derive(Debug)]
pub enum Startup {
    Ready {
        /// Validation removed vanished photos or directories
        changed: bool,
        removed_photos: usize,
        removed_directories: usize,
        /// Set when the cleaned snapshot could not be written back
        save_error: Option<IndexError>,
    },
    NeedsFullScan {
        /// The load failure, or `None` if the cache validated to an empty index
        cause: Option<IndexError>,
    },
}

/// Summary of a finished scan
#[derive(Debug)]
pub struct ScanReport {
    /// Roots that were scanned (after dropping missing ones)
    pub roots: Vec<PathBuf>,
    /// Photos newly added to the index by this scan
    pub added: usize,
    /// Photos in the index afterwards
    pub total: usize,
    /// Set when the snapshot could not be saved; the in-memory index is still valid
    pub save_error: Option<IndexError>,
}

pub struct Indexer {
    store: IndexStore,
    snapshot: IndexSnapshot,
    state: IndexerState,
}

impl Indexer {
    pub fn new(store: IndexStore) -> Self {
        Self {
            store,
            snapshot: IndexSnapshot::new(),
            state: IndexerState::Start,
        }
    }

    pub fn state(&self) -> IndexerState {
        self.state
    }

    pub fn index(&self) -> &PhotoIndex {
        &self.snapshot.photo_index
    }

    pub fn indexed_directories(&self) -> &IndexedDirectories {
        &self.snapshot.indexed_directories
    }

    pub fn last_index_time(&self) -> Option<DateTime<Utc>> {
        self.snapshot.last_index_time
    }

    /// Load the cached snapshot and check it against the filesystem.
    ///
    /// A missing, corrupt or (after cleaning) empty snapshot leaves the
    /// indexer in `NeedsFullScan`. A snapshot that validation changed is
    /// written back straight away.
    pub fn start(&mut self) -> Startup {
        let loaded = match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                if let IndexError::NotFound(_) = error {
                    log::info!("📁 No index snapshot yet, a full scan is needed");
                } else {
                    log::warn!("⚠️  Discarding index snapshot: {}", error);
                }
                self.state = IndexerState::NeedsFullScan;
                return Startup::NeedsFullScan { cause: Some(error) };
            }
        };

        let validated = self.store.validate(loaded, &DiskFilesystem);
        if !validated.is_usable() {
            log::warn!("⚠️  Cached index is empty after validation, a full scan is needed");
            self.state = IndexerState::NeedsFullScan;
            return Startup::NeedsFullScan { cause: None };
        }

        self.snapshot = validated.snapshot;
        self.state = IndexerState::Ready;

        let save_error = if validated.changed {
            self.persist().err()
        } else {
            None
        };

        Startup::Ready {
            changed: validated.changed,
            removed_photos: validated.removed_photos,
            removed_directories: validated.removed_directories,
            save_error,
        }
    }

    /// Build the index from scratch out of `directories`.
    ///
    /// Paths that do not exist are dropped silently; if none are left the
    /// scan does not start.
    pub async fn full_scan(&mut self, directories: Vec<PathBuf>) -> Result<ScanReport> {
        let roots = existing_roots(directories);
        if roots.is_empty() {
            return Err(IndexError::NoDirectoriesProvided);
        }

        log::info!("🔍 Full scan of {} directories", roots.len());
        let scanned = scan_concurrently(&roots).await?;
        let added = scanned.len();

        self.snapshot.photo_index.rebuild_from(scanned.into_entries());
        self.snapshot.indexed_directories = IndexedDirectories::new();

        Ok(self.finish_scan(roots, added))
    }

    /// Scan one more root and merge it into the existing index.
    pub async fn add_directory(&mut self, directory: PathBuf) -> Result<ScanReport> {
        let roots = existing_roots(vec![directory]);
        if roots.is_empty() {
            return Err(IndexError::NoDirectoriesProvided);
        }

        if self.snapshot.indexed_directories.contains(&roots[0]) {
            log::info!("➕ {} is already indexed, looking for new photos", roots[0].display());
        } else {
            log::info!("➕ Adding {}", roots[0].display());
        }
        let scanned = scan_concurrently(&roots).await?;

        let mut added = 0;
        for (year, path) in scanned.into_entries() {
            if self.snapshot.photo_index.merge(year, path) {
                added += 1;
            }
        }

        Ok(self.finish_scan(roots, added))
    }

    /// Discard the index and rescan every known root from scratch.
    ///
    /// Roots that vanished since they were indexed are forgotten.
    pub async fn refresh(&mut self) -> Result<ScanReport> {
        let known = self.snapshot.indexed_directories.to_vec();
        let roots = existing_roots(known);
        if roots.is_empty() {
            return Err(IndexError::NoDirectoriesProvided);
        }

        log::info!("🔄 Reindexing {} directories", roots.len());
        let scanned = scan_concurrently(&roots).await?;
        let added = scanned.len();

        self.snapshot.photo_index.rebuild_from(scanned.into_entries());
        self.snapshot.indexed_directories = IndexedDirectories::new();

        Ok(self.finish_scan(roots, added))
    }

    /// React to a finished move batch.
    ///
    /// Moved photos can only leave the index through a rebuild, so any
    /// completed move triggers `refresh`. Returns `None` if nothing moved.
    pub async fn files_moved(&mut self, report: &FileOpReport) -> Result<Option<ScanReport>> {
        if report.completed.is_empty() {
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    /// Save the current snapshot. Failures are logged and returned, the
    /// in-memory index stays authoritative either way.
    ///
    /// Nothing is written before the index is ready, so an unloaded indexer
    /// never overwrites the cache with an empty snapshot.
    pub fn persist(&self) -> Result<()> {
        if self.state != IndexerState::Ready {
            log::debug!("Index not ready, skipping save");
            return Ok(());
        }
        self.store.save(&self.snapshot).inspect_err(|error| {
            log::error!("❌ {}", error);
        })
    }

    fn finish_scan(&mut self, roots: Vec<PathBuf>, added: usize) -> ScanReport {
        for root in &roots {
            self.snapshot.indexed_directories.insert(root.clone());
        }
        self.snapshot.last_index_time = Some(Utc::now());
        self.state = IndexerState::Ready;

        let total = self.snapshot.photo_index.len();
        log::info!(
            "✅ Index ready: {} photos in {} years ({} new)",
            total,
            self.snapshot.photo_index.years().len(),
            added
        );

        ScanReport {
            roots,
            added,
            total,
            save_error: self.persist().err(),
        }
    }
}

/// Keep the directories that exist, in canonical form, without duplicates.
///
/// Roots that are not valid UTF-8 cannot be stored in the snapshot and are
/// ignored like missing ones.
fn existing_roots(directories: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut roots = BTreeSet::new();

    for directory in directories {
        if !directory.is_dir() {
            log::debug!("Ignoring missing directory {}", directory.display());
            continue;
        }
        match fs::canonicalize(&directory) {
            Ok(root) if root.to_str().is_none() => {
                log::warn!("⚠️  Ignoring non UTF-8 directory {}", root.display());
            }
            Ok(root) => {
                roots.insert(root);
            }
            Err(error) => {
                log::debug!("Ignoring directory {}: {}", directory.display(), error);
            }
        }
    }

    roots.into_iter().collect()
}

/// Scan every root on its own blocking worker and wait for all of them.
///
/// Workers only touch the shared index through `SharedPhotoIndex::merge`.
/// If any worker fails, nothing it or its siblings found is returned.
async fn scan_concurrently(roots: &[PathBuf]) -> Result<PhotoIndex> {
    let shared = Arc::new(SharedPhotoIndex::default());

    let workers: Vec<_> = roots
        .iter()
        .map(|root| {
            let worker_root = root.clone();
            let worker_index = Arc::clone(&shared);
            let handle = task::spawn_blocking(move || index_directory(&worker_root, &worker_index));
            (root.clone(), handle)
        })
        .collect();

    let mut failure = None;
    for (root, handle) in workers {
        match handle.await {
            Ok(found) => log::info!("📸 Indexed {} photos under {}", found, root.display()),
            Err(error) => {
                log::error!("❌ Scan of {} failed: {}", root.display(), error);
                failure.get_or_insert(IndexError::ScanWorker {
                    root,
                    reason: error.to_string(),
                });
            }
        }
    }

    if let Some(error) = failure {
        return Err(error);
    }

    Ok(match Arc::try_unwrap(shared) {
        Ok(shared) => shared.into_inner(),
        Err(shared) => shared.snapshot(),
    })
}

/// Body of one scan worker: enumerate, resolve years, merge.
fn index_directory(root: &Path, index: &SharedPhotoIndex) -> usize {
    let mut merged = 0;
    for path in scan_directory(root) {
        let year = resolve_year(&path);
        if index.merge(year, path) {
            merged += 1;
        }
    }
    merged
}
