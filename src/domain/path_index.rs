//! Precomputed routes between every ordered pair of whitelisted assets.
//!
//! The index is built once per catalog version and never mutated; rebuilds
//! produce a fresh index that callers swap in atomically.

use std::collections::HashMap;

use super::asset::Asset;
use super::catalog::AssetCatalog;
use super::hop::Direction;
use super::id::HopId;
use super::path::{Path, PathStep};

/// Every hop-simple route of up to `max_hops` hops, keyed by `(start, end)`.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    routes: HashMap<(Asset, Asset), Vec<Path>>,
    max_hops: usize,
    catalog_version: u64,
}

#[derive(Debug, Clone)]
struct Edge {
    hop: HopId,
    direction: Direction,
    to: Asset,
}

impl PathIndex {
    /// Enumerate every path in `catalog` of at most `max_hops` hops.
    ///
    /// Hops are undirected; a path never uses the same hop twice but may
    /// revisit an asset, including its own end point. Within each
    /// `(start, end)` bucket paths are in lexicographic hop-id order with
    /// prefixes first.
    #[must_use]
    pub fn build(catalog: &AssetCatalog, max_hops: usize) -> Self {
        let mut adjacency: HashMap<&Asset, Vec<Edge>> = HashMap::new();
        for hop in catalog.hops() {
            adjacency.entry(hop.offer()).or_default().push(Edge {
                hop: hop.id(),
                direction: Direction::Forward,
                to: hop.ask().clone(),
            });
            adjacency.entry(hop.ask()).or_default().push(Edge {
                hop: hop.id(),
                direction: Direction::Inverse,
                to: hop.offer().clone(),
            });
        }
        for edges in adjacency.values_mut() {
            edges.sort_by_key(|e| e.hop);
        }

        let mut routes: HashMap<(Asset, Asset), Vec<Path>> = HashMap::new();
        if max_hops > 0 {
            for start in catalog.assets() {
                let mut walk = Walk {
                    adjacency: &adjacency,
                    start,
                    max_hops,
                    steps: Vec::with_capacity(max_hops),
                    routes: &mut routes,
                };
                walk.extend(start);
            }
        }

        Self {
            routes,
            max_hops,
            catalog_version: catalog.version(),
        }
    }

    /// Paths from `start` to `target` of at most `max_len` hops.
    ///
    /// `max_len` above the built bound is clamped to it. `start == target`
    /// and unknown assets yield an empty list.
    #[must_use]
    pub fn find_paths(&self, start: &Asset, target: &Asset, max_len: usize) -> Vec<Path> {
        if start == target {
            return Vec::new();
        }
        let limit = max_len.min(self.max_hops);
        self.routes
            .get(&(start.clone(), target.clone()))
            .map(|paths| paths.iter().filter(|p| p.len() <= limit).cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Version of the catalog this index was built from.
    #[must_use]
    pub const fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    /// Total number of indexed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

struct Walk<'a> {
    adjacency: &'a HashMap<&'a Asset, Vec<Edge>>,
    start: &'a Asset,
    max_hops: usize,
    steps: Vec<PathStep>,
    routes: &'a mut HashMap<(Asset, Asset), Vec<Path>>,
}

impl Walk<'_> {
    fn extend(&mut self, at: &Asset) {
        if self.steps.len() == self.max_hops {
            return;
        }
        let adjacency = self.adjacency;
        let Some(edges) = adjacency.get(at) else {
            return;
        };
        for edge in edges {
            if self.steps.iter().any(|s| s.hop == edge.hop) {
                continue;
            }
            self.steps.push(PathStep {
                hop: edge.hop,
                direction: edge.direction,
            });
            if &edge.to != self.start {
                // Steps are hop-unique by construction.
                if let Ok(path) = Path::new(self.steps.clone()) {
                    self.routes
                        .entry((self.start.clone(), edge.to.clone()))
                        .or_default()
                        .push(path);
                }
            }
            self.extend(&edge.to);
            self.steps.pop();
        }
    }
}
