//! Copy and move operations on selected photos
//!
//! Each file is handled on its own: a failure is recorded in the report and
//! the rest of the batch continues. A destination file keeps the source's
//! file name. Copies overwrite existing files; moves never do.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// Outcome of a copy or move batch
#[derive(Debug, Default)]
pub struct FileOpReport {
    /// `(source, destination)` for every file that was handled
    pub completed: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<IndexError>,
}

impl FileOpReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Copy `files` into the `destination` directory, overwriting existing files.
pub fn copy_files(files: &[PathBuf], destination: &Path) -> Result<FileOpReport> {
    run_batch("copy", files, destination, |source, target| {
        fs::copy(source, target).map(|_| ())
    })
}

/// Move `files` into the `destination` directory.
///
/// A file whose target already exists is left in place and reported.
pub fn move_files(files: &[PathBuf], destination: &Path) -> Result<FileOpReport> {
    run_batch("move", files, destination, move_file)
}

fn run_batch<F>(
    action: &'static str,
    files: &[PathBuf],
    destination: &Path,
    mut operation: F,
) -> Result<FileOpReport>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    if !destination.is_dir() {
        return Err(IndexError::FileOperation {
            action: "use destination",
            path: destination.to_path_buf(),
            source: io::Error::new(ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut report = FileOpReport::default();

    for source in files {
        let outcome = target_path(source, destination)
            .and_then(|target| operation(source, &target).map(|()| target));

        match outcome {
            Ok(target) => report.completed.push((source.clone(), target)),
            Err(error) => {
                log::warn!("⚠️  Could not {} {}: {}", action, source.display(), error);
                report.failed.push(IndexError::FileOperation {
                    action,
                    path: source.clone(),
                    source: error,
                });
            }
        }
    }

    log::info!(
        "📦 {} finished: {} done, {} failed",
        action,
        report.completed.len(),
        report.failed.len()
    );

    Ok(report)
}

fn target_path(source: &Path, destination: &Path) -> io::Result<PathBuf> {
    source
        .file_name()
        .map(|name| destination.join(name))
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "path has no file name"))
}

fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        ));
    }

    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::CrossesDevices => copy_then_remove(source, target),
        Err(error) => Err(error),
    }
}

/// Move across filesystems. On any failure the target is removed again, so
/// the file is never left in both places.
fn copy_then_remove(source: &Path, target: &Path) -> io::Result<()> {
    let outcome = fs::copy(source, target).and_then(|_| fs::remove_file(source));
    if outcome.is_err() {
        let _ = fs::remove_file(target);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_overwrites_and_keeps_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let photo = src.path().join("a.jpg");
        fs::write(&photo, b"new").unwrap();
        fs::write(dst.path().join("a.jpg"), b"old").unwrap();

        let report = copy_files(&[photo.clone()], dst.path()).unwrap();

        assert!(report.is_complete());
        assert!(photo.exists());
        assert_eq!(fs::read(dst.path().join("a.jpg")).unwrap(), b"new");
    }

    #[test]
    fn test_move_relocates_and_reports_failures() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let moved = src.path().join("moved.jpg");
        let blocked = src.path().join("blocked.jpg");
        let missing = src.path().join("missing.jpg");
        fs::write(&moved, b"x").unwrap();
        fs::write(&blocked, b"x").unwrap();
        fs::write(dst.path().join("blocked.jpg"), b"already here").unwrap();

        let report = move_files(&[moved.clone(), blocked.clone(), missing], dst.path()).unwrap();

        assert_eq!(report.completed, vec![(moved.clone(), dst.path().join("moved.jpg"))]);
        assert_eq!(report.failed.len(), 2);
        assert!(!moved.exists());
        assert!(blocked.exists());
        assert_eq!(fs::read(dst.path().join("blocked.jpg")).unwrap(), b"already here");
    }

    #[test]
    fn test_copy_then_remove_relocates_file() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("a.jpg");
        let target = dst.path().join("a.jpg");
        fs::write(&source, b"photo").unwrap();

        copy_then_remove(&source, &target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"photo");
    }

    #[test]
    fn test_copy_then_remove_cleans_up_on_failure() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let target = dst.path().join("missing.jpg");

        assert!(copy_then_remove(&src.path().join("missing.jpg"), &target).is_err());
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_move_from_read_only_directory_leaves_no_copy() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let locked = src.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        let photo = locked.join("a.jpg");
        fs::write(&photo, b"x").unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores permission bits; the rename would just succeed
        let enforced = fs::write(locked.join("canary"), b"").is_err();
        let report = move_files(&[photo.clone()], dst.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert_eq!(report.failed.len(), 1);
            assert!(photo.exists());
            assert!(!dst.path().join("a.jpg").exists());
        } else {
            assert!(report.is_complete());
        }
    }

    #[test]
    fn test_destination_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let result = copy_files(&[], &dir.path().join("nowhere"));
        assert!(matches!(result, Err(IndexError::FileOperation { .. })));
    }
}
