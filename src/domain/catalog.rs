//! In-memory snapshot of whitelisted assets and the hops between them.

use std::collections::{BTreeMap, BTreeSet};

use super::asset::Asset;
use super::error::DomainError;
use super::hop::{pair_key, Hop};
use super::id::HopId;
use super::path::Path;

/// One concrete swap: sell `offer`, receive `ask`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwapOperation {
    pub offer: Asset,
    pub ask: Asset,
}

/// Whitelisted assets and hops.
///
/// Every mutation bumps [`version`](Self::version) so derived structures
/// such as the path index can tell when they are stale.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    assets: BTreeMap<String, Asset>,
    hops: BTreeMap<HopId, Hop>,
    by_pair: BTreeMap<String, HopId>,
    version: u64,
}

impl AssetCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a store snapshot.
    ///
    /// # Errors
    /// Fails if a hop references an asset not in `assets` or duplicates a
    /// pair key.
    pub fn from_parts(
        assets: impl IntoIterator<Item = Asset>,
        hops: impl IntoIterator<Item = Hop>,
    ) -> Result<Self, DomainError> {
        let mut catalog = Self::new();
        for asset in assets {
            catalog.add_asset(asset);
        }
        for hop in hops {
            catalog.add_hop(hop)?;
        }
        Ok(catalog)
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_whitelisted(&self, asset: &Asset) -> bool {
        self.assets.get(asset.id()) == Some(asset)
    }

    /// Look up a whitelisted asset by denom or contract address.
    #[must_use]
    pub fn asset(&self, identifier: &str) -> Option<&Asset> {
        self.assets.get(identifier)
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    #[must_use]
    pub fn hop(&self, id: HopId) -> Option<&Hop> {
        self.hops.get(&id)
    }

    #[must_use]
    pub fn hop_by_pair(&self, a: &Asset, b: &Asset) -> Option<&Hop> {
        self.by_pair
            .get(&pair_key(a, b))
            .and_then(|id| self.hops.get(id))
    }

    /// Hops in ascending id order.
    pub fn hops(&self) -> impl Iterator<Item = &Hop> {
        self.hops.values()
    }

    /// Hops with `asset` as an endpoint, in ascending id order.
    #[must_use]
    pub fn hops_of(&self, asset: &Asset) -> BTreeSet<&Hop> {
        self.hops.values().filter(|h| h.touches(asset)).collect()
    }

    /// Whitelist an asset. Re-adding an existing asset is a no-op.
    pub fn add_asset(&mut self, asset: Asset) {
        if self.is_whitelisted(&asset) {
            return;
        }
        self.assets.insert(asset.id().to_string(), asset);
        self.version += 1;
    }

    /// Un-whitelist an asset, dropping every hop that touches it.
    ///
    /// Returns the removed hops.
    pub fn remove_asset(&mut self, asset: &Asset) -> Vec<Hop> {
        if self.assets.remove(asset.id()).is_none() {
            return Vec::new();
        }
        let doomed: Vec<HopId> = self
            .hops
            .values()
            .filter(|h| h.offer().id() == asset.id() || h.ask().id() == asset.id())
            .map(Hop::id)
            .collect();
        let removed = doomed
            .into_iter()
            .filter_map(|id| self.detach_hop(id))
            .collect();
        self.version += 1;
        removed
    }

    /// Add a hop between two whitelisted assets.
    ///
    /// # Errors
    /// Rejects non-whitelisted endpoints, a pair that already has a hop and a
    /// hop id that is already taken.
    pub fn add_hop(&mut self, hop: Hop) -> Result<(), DomainError> {
        for endpoint in [hop.offer(), hop.ask()] {
            if !self.is_whitelisted(endpoint) {
                return Err(DomainError::AssetNotWhitelisted {
                    asset: endpoint.id().to_string(),
                });
            }
        }
        let key = hop.pair_key();
        if self.by_pair.contains_key(&key) {
            return Err(DomainError::DuplicateHop { pair_key: key });
        }
        if self.hops.contains_key(&hop.id()) {
            return Err(DomainError::HopIdTaken { id: hop.id() });
        }
        self.by_pair.insert(key, hop.id());
        self.hops.insert(hop.id(), hop);
        self.version += 1;
        Ok(())
    }

    pub fn remove_hop(&mut self, id: HopId) -> Option<Hop> {
        let removed = self.detach_hop(id)?;
        self.version += 1;
        Some(removed)
    }

    fn detach_hop(&mut self, id: HopId) -> Option<Hop> {
        let hop = self.hops.remove(&id)?;
        self.by_pair.remove(&hop.pair_key());
        Some(hop)
    }

    /// Walk `path` from `start` and produce the concrete swap operations.
    ///
    /// # Errors
    /// [`DomainError::UnknownHop`] when a hop id is missing,
    /// [`DomainError::BrokenPath`] when a step does not begin where the
    /// previous one ended.
    pub fn resolve(&self, path: &Path, start: &Asset) -> Result<Vec<SwapOperation>, DomainError> {
        let mut current = start;
        let mut operations = Vec::with_capacity(path.len());
        for (step_index, step) in path.steps().iter().enumerate() {
            let hop = self
                .hop(step.hop)
                .ok_or(DomainError::UnknownHop { id: step.hop })?;
            let (offer, ask) = hop.endpoints(step.direction);
            if offer != current {
                return Err(DomainError::BrokenPath {
                    step: step_index,
                    expected: current.id().to_string(),
                    found: offer.id().to_string(),
                });
            }
            operations.push(SwapOperation {
                offer: offer.clone(),
                ask: ask.clone(),
            });
            current = ask;
        }
        Ok(operations)
    }
}
