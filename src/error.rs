//! Error types for the photo index
//!
//! Only whole-operation failures live here. Per-file problems (unreadable
//! directory entries, missing or malformed EXIF data) are absorbed where they
//! happen and never become an `IndexError`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The snapshot could not be written. The in-memory index is still valid.
    #[error("failed to write index snapshot to {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file exists but is unreadable or fails its checks.
    #[error("index snapshot at {path} is corrupt: {reason}")]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("no index snapshot at {0}")]
    NotFound(PathBuf),

    #[error("no valid directories provided")]
    NoDirectoriesProvided,

    /// A scan worker panicked or was aborted before finishing its directory.
    #[error("scan worker for {root} failed: {reason}")]
    ScanWorker { root: PathBuf, reason: String },

    #[error("failed to {action} {path}: {source}")]
    FileOperation {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IndexError>;
