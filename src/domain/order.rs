//! DCA orders and their scheduling state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::asset::{Amount, Asset};
use super::id::{OrderId, UserAddress};

/// Scheduling state of an order.
///
/// Storage keeps this as a `scheduled` flag plus a nullable `next_run_at`;
/// the two are set together or cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleState {
    Unscheduled,
    Armed { next_run_at: DateTime<Utc> },
}

impl ScheduleState {
    #[must_use]
    pub const fn next_run_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unscheduled => None,
            Self::Armed { next_run_at } => Some(*next_run_at),
        }
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }
}

/// A user's recurring purchase of `target` paid for with `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserAddress,
    /// Per-user order number on the DCA contract.
    pub chain_id: u64,
    pub source: Asset,
    /// Source amount still to be spent.
    pub remaining: Amount,
    pub token_allowance: Amount,
    pub target: Asset,
    /// Seconds between purchases.
    pub interval_secs: u64,
    /// Source amount spent per purchase.
    pub purchase_amount: Amount,
    pub max_hops: usize,
    /// Passed through to the contract unchanged.
    pub max_spread: String,
    pub last_purchase_at: DateTime<Utc>,
    pub schedule: ScheduleState,
}

impl Order {
    #[must_use]
    pub fn interval(&self) -> Duration {
        i64::try_from(self.interval_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// The regular next purchase time, `last_purchase_at + interval`.
    ///
    /// `None` when the sum is not representable.
    #[must_use]
    pub fn regular_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_purchase_at.checked_add_signed(self.interval())
    }

    /// Unscheduled, or armed for a time that has already passed.
    #[must_use]
    pub fn needs_arming(&self, now: DateTime<Utc>) -> bool {
        match self.schedule {
            ScheduleState::Unscheduled => true,
            ScheduleState::Armed { next_run_at } => next_run_at <= now,
        }
    }

    /// Source amount the next purchase spends.
    #[must_use]
    pub fn next_purchase_amount(&self) -> Amount {
        self.purchase_amount.min(self.remaining)
    }

    #[must_use]
    pub const fn due_at(&self) -> Option<DateTime<Utc>> {
        self.schedule.next_run_at()
    }
}
