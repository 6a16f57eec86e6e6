//! Fixed-price [`PriceOracle`].

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::Asset;
use crate::error::{ExecutionError, Result};
use crate::port::outbound::oracle::PriceOracle;

/// Answers with the unit prices it was given; anything else is unavailable.
#[derive(Default)]
pub struct FixedPriceOracle {
    prices: RwLock<HashMap<Asset, Decimal>>,
}

impl FixedPriceOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// USD per smallest unit of `asset`.
    #[must_use]
    pub fn with(self, asset: Asset, unit_price: Decimal) -> Self {
        self.prices.write().insert(asset, unit_price);
        self
    }

    pub fn remove(&self, asset: &Asset) {
        self.prices.write().remove(asset);
    }
}

#[async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn unit_price_usd(&self, asset: &Asset) -> Result<Decimal> {
        self.prices.read().get(asset).copied().ok_or_else(|| {
            ExecutionError::PricingUnavailable {
                asset: asset.id().to_string(),
            }
            .into()
        })
    }
}
