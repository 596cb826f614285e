use serde::Deserialize;
use std::fs;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::data::{IndexSnapshot, SNAPSHOT_VERSION};
use crate::error::{IndexError, Result};

/// Existence checks against the live filesystem.
///
/// Validation only needs these two questions answered, which keeps it
/// testable without touching the disk.
pub trait LiveFilesystem {
    fn file_exists(&self, path: &Path) -> bool;
    fn dir_exists(&self, path: &Path) -> bool;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFilesystem;

impl LiveFilesystem for DiskFilesystem {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Result of checking a loaded snapshot against the filesystem
#[derive(Debug, Clone)]
pub struct Validated {
    /// The snapshot with vanished photos and directories removed
    pub snapshot: IndexSnapshot,
    /// Whether anything was removed (the cleaned snapshot should be saved)
    pub changed: bool,
    pub removed_photos: usize,
    pub removed_directories: usize,
}

impl Validated {
    /// An empty index is no usable cache, even if it loaded fine.
    pub fn is_usable(&self) -> bool {
        !self.snapshot.photo_index.is_empty()
    }
}

/// Only the version is read first, so a snapshot written by a newer schema
/// is reported as such instead of as a missing field.
#[derive(Deserialize)]
struct SnapshotHeader {
    version: u32,
}

/// The IndexStore owns the snapshot file on disk.
///
/// The file is JSON and is always replaced atomically: a new snapshot is
/// written to a temporary file next to the target and then renamed over it.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write the snapshot to disk.
    ///
    /// Creates the parent directory if needed. Readers see either the old
    /// file or the complete new one, never a partial write.
    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        let write_error = |source: io::Error| IndexError::StorageWrite {
            path: self.path.clone(),
            source,
        };

        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(write_error)?;

        let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .map_err(|error| write_error(error.into()))?;
            writer.flush().map_err(write_error)?;
        }
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(&self.path)
            .map_err(|error| write_error(error.error))?;

        log::debug!(
            "💾 Saved index snapshot to {} ({} photos, {} directories)",
            self.path.display(),
            snapshot.photo_index.len(),
            snapshot.indexed_directories.len()
        );

        Ok(())
    }

    /// Read a previously saved snapshot.
    ///
    /// Fails with `NotFound` when there is no file and with `CorruptSnapshot`
    /// when the file cannot be read, is not valid JSON, has an unknown
    /// version, or breaks the index invariants.
    pub fn load(&self) -> Result<IndexSnapshot> {
        let corrupt = |reason: String| IndexError::CorruptSnapshot {
            path: self.path.clone(),
            reason,
        };

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(IndexError::NotFound(self.path.clone()));
            }
            Err(error) => return Err(corrupt(error.to_string())),
        };

        let header: SnapshotHeader =
            serde_json::from_slice(&bytes).map_err(|error| corrupt(error.to_string()))?;
        if header.version != SNAPSHOT_VERSION {
            return Err(corrupt(format!(
                "unsupported snapshot version {} (expected {})",
                header.version, SNAPSHOT_VERSION
            )));
        }

        let snapshot: IndexSnapshot =
            serde_json::from_slice(&bytes).map_err(|error| corrupt(error.to_string()))?;

        log::info!(
            "📁 Loaded index snapshot from {} ({} photos)",
            self.path.display(),
            snapshot.photo_index.len()
        );

        Ok(snapshot)
    }

    /// Drop directories and photos that no longer exist.
    pub fn validate<F>(&self, mut snapshot: IndexSnapshot, live: &F) -> Validated
    where
        F: LiveFilesystem + ?Sized,
    {
        let removed_directories = snapshot
            .indexed_directories
            .retain(|root| live.dir_exists(root));

        let before = snapshot.photo_index.len();
        snapshot.photo_index.prune_missing(|path| live.file_exists(path));
        let removed_photos = before - snapshot.photo_index.len();

        let changed = removed_directories > 0 || removed_photos > 0;
        if changed {
            log::warn!(
                "⚠️  Removed {} missing photos and {} missing directories from the index",
                removed_photos,
                removed_directories
            );
        }

        Validated {
            snapshot,
            changed,
            removed_photos,
            removed_directories,
        }
    }
}
