//! Shared data structures for the index state
//!
//! These structs represent the data model that flows between
//! the scan workers, the snapshot file and the display layer.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Current snapshot schema version. Bump when the layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Photos grouped by the year they were taken.
///
/// Each year maps to an insertion-ordered set of paths. A path lives in at
/// most one bucket: once indexed under a year it stays there until the index
/// is rebuilt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<i32, Vec<PathBuf>>",
    into = "BTreeMap<i32, Vec<PathBuf>>"
)]
pub struct PhotoIndex {
    buckets: BTreeMap<i32, IndexSet<PathBuf>>,
    /// Reverse lookup, keeps the one-bucket-per-path invariant cheap to check
    years_by_path: HashMap<PathBuf, i32>,
}

impl PhotoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `path` under `year` unless it is already indexed.
    ///
    /// Returns `true` if the path was added. A path already filed under a
    /// different year is left where it is.
    pub fn merge(&mut self, year: i32, path: PathBuf) -> bool {
        if let Some(&existing) = self.years_by_path.get(&path) {
            if existing != year {
                log::debug!(
                    "{} already indexed under {}, ignoring {}",
                    path.display(),
                    existing,
                    year
                );
            }
            return false;
        }

        self.years_by_path.insert(path.clone(), year);
        self.buckets.entry(year).or_default().insert(path);
        true
    }

    /// Replace the whole index with freshly computed entries.
    pub fn rebuild_from<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (i32, PathBuf)>,
    {
        let mut fresh = PhotoIndex::new();
        for (year, path) in entries {
            fresh.merge(year, path);
        }
        *self = fresh;
    }

    /// Years present in the index, newest first
    pub fn years(&self) -> Vec<i32> {
        self.buckets.keys().rev().copied().collect()
    }

    /// Photos filed under `year`, in insertion order
    pub fn photos(&self, year: i32) -> impl Iterator<Item = &Path> + '_ {
        self.buckets
            .get(&year)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(PathBuf::as_path))
    }

    /// Year groups for display, newest year first
    pub fn groups(&self) -> impl Iterator<Item = (i32, Vec<&Path>)> + '_ {
        self.buckets
            .iter()
            .rev()
            .map(|(year, bucket)| (*year, bucket.iter().map(PathBuf::as_path).collect()))
    }

    /// Every `(year, path)` pair in the index
    pub fn entries(&self) -> impl Iterator<Item = (i32, &Path)> + '_ {
        self.buckets
            .iter()
            .flat_map(|(year, bucket)| bucket.iter().map(move |path| (*year, path.as_path())))
    }

    /// Consume the index, yielding every `(year, path)` pair
    pub fn into_entries(self) -> impl Iterator<Item = (i32, PathBuf)> {
        self.buckets
            .into_iter()
            .flat_map(|(year, bucket)| bucket.into_iter().map(move |path| (year, path)))
    }

    /// Remove every path for which `exists` returns false.
    ///
    /// Buckets left empty are dropped. Returns whether anything was removed.
    pub fn prune_missing<F>(&mut self, mut exists: F) -> bool
    where
        F: FnMut(&Path) -> bool,
    {
        let mut removed = Vec::new();

        for bucket in self.buckets.values_mut() {
            bucket.retain(|path| {
                let keep = exists(path);
                if !keep {
                    removed.push(path.clone());
                }
                keep
            });
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());

        for path in &removed {
            self.years_by_path.remove(path);
        }

        !removed.is_empty()
    }

    pub fn year_of(&self, path: &Path) -> Option<i32> {
        self.years_by_path.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.years_by_path.contains_key(path)
    }

    /// Total number of indexed photos
    pub fn len(&self) -> usize {
        self.years_by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years_by_path.is_empty()
    }
}

/// Two indexes are equal when every year holds the same set of paths.
/// Insertion order inside a bucket is not compared.
impl PartialEq for PhotoIndex {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl TryFrom<BTreeMap<i32, Vec<PathBuf>>> for PhotoIndex {
    type Error = String;

    fn try_from(raw: BTreeMap<i32, Vec<PathBuf>>) -> Result<Self, Self::Error> {
        let mut index = PhotoIndex::new();

        for (year, paths) in raw {
            for path in paths {
                if let Some(existing) = index.year_of(&path).filter(|&existing| existing != year) {
                    return Err(format!(
                        "{} listed under both {} and {}",
                        path.display(),
                        existing,
                        year
                    ));
                }
                index.merge(year, path);
            }
        }

        Ok(index)
    }
}

impl From<PhotoIndex> for BTreeMap<i32, Vec<PathBuf>> {
    fn from(index: PhotoIndex) -> Self {
        index
            .buckets
            .into_iter()
            .map(|(year, bucket)| (year, bucket.into_iter().collect()))
            .collect()
    }
}

/// Root directories that have been fully scanned into the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexedDirectories(BTreeSet<PathBuf>);

impl IndexedDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scanned root. Returns `true` if it was not known yet.
    pub fn insert(&mut self, root: PathBuf) -> bool {
        self.0.insert(root)
    }

    pub fn contains(&self, root: &Path) -> bool {
        self.0.contains(root)
    }

    /// Keep only the roots for which `keep` returns true.
    /// Returns how many were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Path) -> bool,
    {
        let before = self.0.len();
        self.0.retain(|root| keep(root));
        before - self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> + '_ {
        self.0.iter().map(PathBuf::as_path)
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.0.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PathBuf> for IndexedDirectories {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The persisted unit: index, known roots and when they were last scanned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub photo_index: PhotoIndex,
    pub indexed_directories: IndexedDirectories,
    /// `None` until the first scan completes
    pub last_index_time: Option<DateTime<Utc>>,
}

impl Default for IndexSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            photo_index: PhotoIndex::new(),
            indexed_directories: IndexedDirectories::new(),
            last_index_time: None,
        }
    }
}

impl IndexSnapshot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut index = PhotoIndex::new();

        assert!(index.merge(2021, p("/photos/a.jpg")));
        assert!(!index.merge(2021, p("/photos/a.jpg")));

        assert_eq!(index.len(), 1);
        assert_eq!(index.photos(2021).count(), 1);
    }

    #[test]
    fn test_merge_keeps_path_in_one_year() {
        let mut index = PhotoIndex::new();
        index.merge(2020, p("/photos/a.jpg"));

        assert!(!index.merge(2021, p("/photos/a.jpg")));
        assert_eq!(index.year_of(Path::new("/photos/a.jpg")), Some(2020));
        assert_eq!(index.years(), vec![2020]);
    }

    #[test]
    fn test_years_descending_and_bucket_order_stable() {
        let mut index = PhotoIndex::new();
        index.merge(2019, p("/b.jpg"));
        index.merge(2023, p("/c.jpg"));
        index.merge(2019, p("/a.jpg"));
        index.merge(2021, p("/d.jpg"));

        assert_eq!(index.years(), vec![2023, 2021, 2019]);

        let bucket: Vec<&Path> = index.photos(2019).collect();
        assert_eq!(bucket, vec![Path::new("/b.jpg"), Path::new("/a.jpg")]);

        let group_years: Vec<i32> = index.groups().map(|(year, _)| year).collect();
        assert_eq!(group_years, vec![2023, 2021, 2019]);
    }

    #[test]
    fn test_prune_missing_drops_empty_buckets() {
        let mut index = PhotoIndex::new();
        index.merge(2020, p("/gone.jpg"));
        index.merge(2021, p("/kept.jpg"));
        index.merge(2021, p("/also-gone.jpg"));

        let changed = index.prune_missing(|path| path == Path::new("/kept.jpg"));

        assert!(changed);
        assert_eq!(index.years(), vec![2021]);
        assert_eq!(index.len(), 1);
        assert!(!index.contains(Path::new("/gone.jpg")));

        // A second pass has nothing left to remove
        assert!(!index.prune_missing(|_| true));
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut index = PhotoIndex::new();
        index.merge(2010, p("/old.jpg"));

        index.rebuild_from(vec![(2022, p("/new.jpg")), (2022, p("/new.jpg"))]);

        assert_eq!(index.years(), vec![2022]);
        assert_eq!(index.len(), 1);
        assert!(!index.contains(Path::new("/old.jpg")));
    }

    #[test]
    fn test_equality_ignores_bucket_order() {
        let mut first = PhotoIndex::new();
        first.merge(2020, p("/a.jpg"));
        first.merge(2020, p("/b.jpg"));

        let mut second = PhotoIndex::new();
        second.merge(2020, p("/b.jpg"));
        second.merge(2020, p("/a.jpg"));

        assert_eq!(first, second);
    }

    #[test]
    fn test_deserialize_rejects_path_in_two_years() {
        let json = r#"{"2020": ["/a.jpg"], "2021": ["/a.jpg"]}"#;
        let result: Result<PhotoIndex, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_drops_empty_buckets() {
        let json = r#"{"2019": [], "2020": ["/a.jpg", "/a.jpg"]}"#;
        let index: PhotoIndex = serde_json::from_str(json).unwrap();

        assert_eq!(index.years(), vec![2020]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_indexed_directories_retain() {
        let mut dirs: IndexedDirectories = vec![p("/a"), p("/b"), p("/c")].into_iter().collect();
        assert!(!dirs.insert(p("/a")));

        let dropped = dirs.retain(|root| root != Path::new("/b"));

        assert_eq!(dropped, 1);
        assert_eq!(dirs.to_vec(), vec![p("/a"), p("/c")]);
    }
}
