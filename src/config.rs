//! Runtime configuration
//!
//! Where the snapshot lives and which directories to scan when there is no
//! usable snapshot. Both come from the command line (or its environment
//! variables), with a per-user data directory as the default cache location.

use std::path::PathBuf;

/// File name of the snapshot inside the application data directory
const CACHE_FILE_NAME: &str = "photo_index.json";
const APP_DIR_NAME: &str = "photo-index";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Location of the index snapshot
    pub cache_path: PathBuf,
    /// Directories to scan when a full scan is needed
    pub directories: Vec<PathBuf>,
}

impl Settings {
    /// Resolve settings from optional overrides.
    ///
    /// `directories` is the comma-separated list form, e.g.
    /// `"/photos/2020, /mnt/camera"`.
    pub fn resolve(cache_path: Option<PathBuf>, directories: Option<&str>) -> Self {
        Self {
            cache_path: cache_path.unwrap_or_else(default_cache_path),
            directories: directories.map(parse_directory_list).unwrap_or_default(),
        }
    }
}

/// Get the default path of the snapshot file
///
/// - Linux: ~/.local/share/photo-index/photo_index.json
/// - macOS: ~/Library/Application Support/photo-index/photo_index.json
/// - Windows: %APPDATA%\photo-index\photo_index.json
///
/// Falls back to the home directory, then the working directory.
pub fn default_cache_path() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    path.push(APP_DIR_NAME);
    path.push(CACHE_FILE_NAME);
    path
}

/// Split a comma-separated directory list.
///
/// Items are trimmed; empty items and paths that are not existing
/// directories are dropped without complaint.
pub fn parse_directory_list(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(PathBuf::from)
        .filter(|path| {
            let exists = path.is_dir();
            if !exists {
                log::debug!("Dropping {} from directory list: not a directory", path.display());
            }
            exists
        })
        .collect()
}
