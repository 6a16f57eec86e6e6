//! USD pricing of on-chain amounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::{Amount, Asset};

/// Last known USD price of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub asset: Asset,
    /// USD per whole token.
    pub price_usd: Decimal,
    /// Smallest units per whole token, e.g. `1_000_000` for six decimals.
    pub conversion: u64,
    pub updated_at: DateTime<Utc>,
}

impl TokenPrice {
    /// USD per smallest unit.
    ///
    /// `None` for a zero conversion factor.
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        if self.conversion == 0 {
            return None;
        }
        self.price_usd.checked_div(Decimal::from(self.conversion))
    }
}

/// `amount * unit_price`, or `None` if it does not fit a `Decimal`.
#[must_use]
pub fn usd_value(amount: Amount, unit_price: Decimal) -> Option<Decimal> {
    let amount = i128::try_from(amount).ok()?;
    let amount = Decimal::try_from_i128_with_scale(amount, 0).ok()?;
    amount.checked_mul(unit_price)
}
