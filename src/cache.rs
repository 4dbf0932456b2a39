//! Filename-keyed cache of built surfel hierarchies.
//!
//! A [`HierarchyCache`] is owned by the caller's render session and passed to
//! whatever needs hierarchies; there is no process-wide instance. Loading and
//! building happen at most once per filename until [`HierarchyCache::clear`].
//! Failed loads are remembered too, so a missing file is not retried.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::octree::PointOctree;
use crate::pointcloud::PointArray;
use crate::util::Result;

/// Source of surfel arrays for the cache.
///
/// Implemented for any `Fn(&Path) -> Result<PointArray>`.
pub trait PointCloudLoader {
    fn load(&self, path: &Path) -> Result<PointArray>;
}

impl<F> PointCloudLoader for F
where
    F: Fn(&Path) -> Result<PointArray>,
{
    fn load(&self, path: &Path) -> Result<PointArray> {
        self(path)
    }
}

/// Thread-safe map from point cloud filename to its hierarchy.
///
/// `None` entries record a failed load.
#[derive(Default)]
pub struct HierarchyCache {
    entries: RwLock<HashMap<PathBuf, Option<Arc<PointOctree>>>>,
}

impl HierarchyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached hierarchy for `path`, loading and building it on first use.
    ///
    /// Returns `None` if the load failed, now or on an earlier call.
    ///
    /// Loads are serialized across the whole cache, not per filename: while
    /// one loader runs, other callers with uncached names wait for it. Lookups
    /// of already cached names proceed meanwhile. The loader must not call
    /// `get_or_load`, `insert` or `clear` on the same cache for an uncached
    /// name, or it deadlocks.
    pub fn get_or_load<L: PointCloudLoader + ?Sized>(&self, path: &Path, loader: &L) -> Option<Arc<PointOctree>> {
        if let Some(entry) = self.entries.read().get(path) {
            return entry.clone();
        }

        let entries = self.entries.upgradable_read();
        // Another caller may have loaded it while we waited.
        if let Some(entry) = entries.get(path) {
            return entry.clone();
        }

        let entry = match loader.load(path) {
            Ok(points) => {
                let tree = PointOctree::build(&points);
                tracing::info!(path = %path.display(), points = tree.len(), "loaded point cloud");
                Some(Arc::new(tree))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load point cloud");
                None
            }
        };

        let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
        entries.insert(path.to_path_buf(), entry.clone());
        entry
    }

    /// Register an already built hierarchy under `path`, replacing any entry.
    pub fn insert(&self, path: impl Into<PathBuf>, tree: Arc<PointOctree>) {
        self.entries.write().insert(path.into(), Some(tree));
    }

    /// True if `path` has an entry, including a failed-load entry.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.read().contains_key(path)
    }

    /// Number of entries, failed loads included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry; later lookups reload.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
