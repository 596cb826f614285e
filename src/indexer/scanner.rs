use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::media::classify::is_image;

/// Recursively collect every supported image under `root`.
///
/// Entries that cannot be read (permission denied, broken links, loops)
/// are skipped; they never abort the walk. Paths that are not valid UTF-8
/// are skipped too, since the snapshot stores paths as JSON strings. The
/// order of the result is whatever the filesystem yields.
pub fn scan_directory(root: &Path) -> Vec<PathBuf> {
    let mut images = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                log::debug!("Skipping unreadable entry under {}: {}", root.display(), error);
                skipped += 1;
                continue;
            }
        };

        // Only process files (not directories)
        if !entry.file_type().is_file() {
            continue;
        }

        if !is_image(entry.path()) {
            continue;
        }

        if entry.path().to_str().is_none() {
            log::debug!("Skipping non UTF-8 path {}", entry.path().display());
            skipped += 1;
            continue;
        }

        images.push(entry.into_path());
    }

    if skipped > 0 {
        log::debug!("⚠️  Skipped {} unreadable or non UTF-8 entries under {}", skipped, root.display());
    }

    images
}
