//! Price port.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::Asset;
use crate::error::Result;

/// Source of USD prices.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD per smallest unit of `asset`.
    ///
    /// Fails with `ExecutionError::PricingUnavailable` when no usable price
    /// is known.
    async fn unit_price_usd(&self, asset: &Asset) -> Result<Decimal>;
}
