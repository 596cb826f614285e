use parking_lot::Mutex;
use std::path::PathBuf;

use super::data::PhotoIndex;

/// A `PhotoIndex` that scan workers can merge into concurrently.
///
/// Every mutation takes the lock for the duration of one insert-if-absent,
/// so concurrent workers never lose or duplicate entries.
#[derive(Debug, Default)]
pub struct SharedPhotoIndex {
    inner: Mutex<PhotoIndex>,
}

impl SharedPhotoIndex {
    /// Insert `path` under `year` if it is not indexed yet
    pub fn merge(&self, year: i32, path: PathBuf) -> bool {
        self.inner.lock().merge(year, path)
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> PhotoIndex {
        self.inner.lock().clone()
    }

    pub fn into_inner(self) -> PhotoIndex {
        self.inner.into_inner()
    }
}
