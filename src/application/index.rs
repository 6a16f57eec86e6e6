//! Shared, swappable routing snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::domain::{AssetCatalog, PathIndex};

/// A catalog together with the path index built from it.
#[derive(Debug, Default)]
pub struct RoutingSnapshot {
    pub catalog: AssetCatalog,
    pub index: PathIndex,
}

/// Holds the current [`RoutingSnapshot`].
///
/// Readers clone the `Arc` and keep using their snapshot while a rebuild
/// swaps in the next one.
pub struct PathIndexHandle {
    current: RwLock<Arc<RoutingSnapshot>>,
    max_hops: usize,
}

impl PathIndexHandle {
    /// Handle with an empty catalog; routes appear after the first
    /// [`rebuild`](Self::rebuild).
    #[must_use]
    pub fn new(max_hops: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(RoutingSnapshot::default())),
            max_hops,
        }
    }

    #[must_use]
    pub fn from_catalog(catalog: AssetCatalog, max_hops: usize) -> Self {
        let handle = Self::new(max_hops);
        handle.rebuild(catalog);
        handle
    }

    /// Upper bound on path length the index is built for.
    #[must_use]
    pub const fn max_hops(&self) -> usize {
        self.max_hops
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<RoutingSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Build the index for `catalog` and make it current.
    pub fn rebuild(&self, catalog: AssetCatalog) {
        let index = PathIndex::build(&catalog, self.max_hops);
        info!(
            catalog_version = catalog.version(),
            assets = catalog.assets().count(),
            hops = catalog.hops().count(),
            routes = index.len(),
            "Path index rebuilt"
        );
        *self.current.write() = Arc::new(RoutingSnapshot { catalog, index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, Hop, HopId};

    fn catalog() -> AssetCatalog {
        let x = Asset::native("x");
        let y = Asset::native("y");
        AssetCatalog::from_parts(
            vec![x.clone(), y.clone()],
            vec![Hop::try_new(HopId::new(1), x, y).unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn starts_empty() {
        let handle = PathIndexHandle::new(3);
        assert!(handle.snapshot().index.is_empty());
    }

    #[test]
    fn rebuild_swaps_snapshot_without_touching_readers() {
        let handle = PathIndexHandle::new(3);
        let before = handle.snapshot();

        handle.rebuild(catalog());

        let after = handle.snapshot();
        assert!(before.index.is_empty());
        let paths = after
            .index
            .find_paths(&Asset::native("x"), &Asset::native("y"), 3);
        assert_eq!(paths.len(), 1);
        assert_eq!(after.index.max_hops(), 3);
    }
}
