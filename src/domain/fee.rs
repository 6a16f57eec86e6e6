//! Bot fee apportioning.
//!
//! The bot charges a flat fee per hop, payable in any whitelisted fee asset.
//! A user's tip balances are drained in priority order: each balance pays
//! for as many whole hops as it can before the next one is consulted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::asset::{Amount, Asset, AssetAmount};
use super::error::DomainError;

/// Per-hop fee for each whitelisted fee asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    per_hop: BTreeMap<Asset, Amount>,
}

impl FeeSchedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fee(mut self, asset: Asset, per_hop: Amount) -> Self {
        self.set(asset, per_hop);
        self
    }

    pub fn set(&mut self, asset: Asset, per_hop: Amount) {
        self.per_hop.insert(asset, per_hop);
    }

    /// Fee per hop, or `None` when `asset` cannot pay fees.
    #[must_use]
    pub fn per_hop(&self, asset: &Asset) -> Option<Amount> {
        self.per_hop.get(asset).copied().filter(|fee| *fee > 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Asset, Amount)> {
        self.per_hop.iter().map(|(asset, fee)| (asset, *fee))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_hop.is_empty()
    }
}

impl FromIterator<(Asset, Amount)> for FeeSchedule {
    fn from_iter<I: IntoIterator<Item = (Asset, Amount)>>(iter: I) -> Self {
        Self {
            per_hop: iter.into_iter().collect(),
        }
    }
}

/// Split the fee for `hops_needed` hops across `balances`, in order.
///
/// Balances whose asset has no (or a zero) per-hop fee are skipped. The
/// result never charges a balance more than it holds and always pays for
/// exactly `hops_needed` hops.
///
/// # Errors
/// [`DomainError::InsufficientFeeFunds`] when the balances run out first.
///
/// ```
/// use dcabot::domain::asset::{Asset, AssetAmount};
/// use dcabot::domain::fee::{build_fee_redeem, FeeSchedule};
///
/// let fee = Asset::native("uusd");
/// let schedule = FeeSchedule::new().with_fee(fee.clone(), 100);
/// let balances = [AssetAmount::new(fee.clone(), 350)];
///
/// let redeem = build_fee_redeem(&balances, &schedule, 3).unwrap();
/// assert_eq!(redeem, vec![AssetAmount::new(fee, 300)]);
/// ```
pub fn build_fee_redeem(
    balances: &[AssetAmount],
    schedule: &FeeSchedule,
    hops_needed: usize,
) -> Result<Vec<AssetAmount>, DomainError> {
    let mut redeem = Vec::new();
    let mut remaining = hops_needed as u128;

    for balance in balances {
        if remaining == 0 {
            break;
        }
        let Some(fee) = schedule.per_hop(&balance.asset) else {
            continue;
        };
        let covered = balance.amount / fee;
        if covered >= remaining {
            redeem.push(AssetAmount::new(balance.asset.clone(), remaining * fee));
            remaining = 0;
        } else if covered > 0 {
            redeem.push(AssetAmount::new(balance.asset.clone(), covered * fee));
            remaining -= covered;
        }
    }

    if remaining > 0 {
        return Err(DomainError::InsufficientFeeFunds {
            hops_needed,
            hops_uncovered: usize::try_from(remaining).unwrap_or(hops_needed),
        });
    }
    Ok(redeem)
}

/// Number of whole hops paid for by `redeem` under `schedule`.
#[must_use]
pub fn hops_covered(redeem: &[AssetAmount], schedule: &FeeSchedule) -> u128 {
    redeem
        .iter()
        .filter_map(|leg| schedule.per_hop(&leg.asset).map(|fee| leg.amount / fee))
        .sum()
}
