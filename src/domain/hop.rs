//! Hops: undirected tradable pairs between two whitelisted assets.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::error::DomainError;
use super::id::HopId;

/// Direction a hop is traversed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// offer -> ask
    Forward,
    /// ask -> offer
    Inverse,
}

/// A tradable pair.
///
/// `offer` and `ask` are stored as first seen and define the forward
/// direction. A hop and its reverse are the same entity: both share one
/// [`pair_key`](Self::pair_key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hop {
    id: HopId,
    offer: Asset,
    ask: Asset,
}

impl Hop {
    /// Create a hop.
    ///
    /// # Errors
    /// Returns [`DomainError::IdenticalHopEndpoints`] when `offer == ask`.
    pub fn try_new(id: HopId, offer: Asset, ask: Asset) -> Result<Self, DomainError> {
        if offer.id() == ask.id() {
            return Err(DomainError::IdenticalHopEndpoints {
                asset: offer.id().to_string(),
            });
        }
        Ok(Self { id, offer, ask })
    }

    #[must_use]
    pub const fn id(&self) -> HopId {
        self.id
    }

    #[must_use]
    pub const fn offer(&self) -> &Asset {
        &self.offer
    }

    #[must_use]
    pub const fn ask(&self) -> &Asset {
        &self.ask
    }

    #[must_use]
    pub fn pair_key(&self) -> String {
        pair_key(&self.offer, &self.ask)
    }

    /// `(from, to)` when traversed in `direction`.
    #[must_use]
    pub const fn endpoints(&self, direction: Direction) -> (&Asset, &Asset) {
        match direction {
            Direction::Forward => (&self.offer, &self.ask),
            Direction::Inverse => (&self.ask, &self.offer),
        }
    }

    /// Direction that leaves `from`, if `from` is an endpoint.
    #[must_use]
    pub fn direction_from(&self, from: &Asset) -> Option<Direction> {
        if &self.offer == from {
            Some(Direction::Forward)
        } else if &self.ask == from {
            Some(Direction::Inverse)
        } else {
            None
        }
    }

    #[must_use]
    pub fn touches(&self, asset: &Asset) -> bool {
        &self.offer == asset || &self.ask == asset
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}<>{}", self.id, self.offer, self.ask)
    }
}

// Hops order by id.
impl PartialOrd for Hop {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hop {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id()
            .cmp(&other.id())
            .then_with(|| self.offer().cmp(other.offer()))
            .then_with(|| self.ask().cmp(other.ask()))
    }
}

/// Canonical key of the unordered pair `{a, b}`: identifiers sorted and
/// joined with `-`.
#[must_use]
pub fn pair_key(a: &Asset, b: &Asset) -> String {
    let (lo, hi) = if a.id() <= b.id() {
        (a.id(), b.id())
    } else {
        (b.id(), a.id())
    };
    format!("{lo}-{hi}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_endpoints_rejected() {
        let err = Hop::try_new(HopId::new(1), Asset::native("a"), Asset::native("a")).unwrap_err();
        assert!(matches!(err, DomainError::IdenticalHopEndpoints { .. }));
    }

    #[test]
    fn pair_key_ignores_order() {
        let forward = Hop::try_new(HopId::new(1), Asset::native("b"), Asset::native("a")).unwrap();
        let reverse = Hop::try_new(HopId::new(2), Asset::native("a"), Asset::native("b")).unwrap();
        assert_eq!(forward.pair_key(), "a-b");
        assert_eq!(forward.pair_key(), reverse.pair_key());
    }

    #[test]
    fn endpoints_and_direction_agree() {
        let hop = Hop::try_new(HopId::new(1), Asset::native("x"), Asset::native("y")).unwrap();
        assert_eq!(hop.direction_from(&Asset::native("x")), Some(Direction::Forward));
        assert_eq!(hop.direction_from(&Asset::native("y")), Some(Direction::Inverse));
        assert_eq!(hop.direction_from(&Asset::native("z")), None);

        let (from, to) = hop.endpoints(Direction::Inverse);
        assert_eq!(from, &Asset::native("y"));
        assert_eq!(to, &Asset::native("x"));
    }
}
