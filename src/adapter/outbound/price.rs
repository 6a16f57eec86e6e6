//! Price oracle backed by the persisted token price table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::Asset;
use crate::error::{ExecutionError, Result};
use crate::port::outbound::oracle::PriceOracle;
use crate::port::outbound::store::Store;

/// Reads USD prices from the store.
///
/// A price older than `max_age` counts as missing.
pub struct StoredPriceOracle {
    store: Arc<dyn Store>,
    max_age: Option<Duration>,
}

impl StoredPriceOracle {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, max_age: Option<Duration>) -> Self {
        Self { store, max_age }
    }
}

#[async_trait]
impl PriceOracle for StoredPriceOracle {
    async fn unit_price_usd(&self, asset: &Asset) -> Result<Decimal> {
        let unavailable = || ExecutionError::PricingUnavailable {
            asset: asset.id().to_string(),
        };

        let Some(price) = self.store.price(asset).await? else {
            return Err(unavailable().into());
        };
        if let Some(max_age) = self.max_age {
            let age = Utc::now() - price.updated_at;
            if age > max_age {
                debug!(asset = %asset, age_secs = age.num_seconds(), "Stored price is stale");
                return Err(unavailable().into());
            }
        }
        price.unit_price().ok_or_else(|| unavailable().into())
    }
}
