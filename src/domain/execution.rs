//! Purchase attempts: the route chosen, what was sent, and what happened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::{Amount, Asset, AssetAmount};
use super::catalog::SwapOperation;
use super::id::{OrderId, UserAddress};
use super::path::Path;

/// The route picked for one purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChoice {
    pub path: Path,
    pub operations: Vec<SwapOperation>,
    pub fee_redeem: Vec<AssetAmount>,
    /// Net USD value of the route. `None` when it was the only affordable
    /// candidate and no simulation was needed.
    pub execution_value: Option<Decimal>,
}

/// Everything the DCA contract needs to execute one purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub user: UserAddress,
    pub chain_order_id: u64,
    pub operations: Vec<SwapOperation>,
    pub fee_redeem: Vec<AssetAmount>,
}

/// Append-only record of a purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub source: Asset,
    pub target: Asset,
    /// Source amount the attempt tried to spend.
    pub amount: Amount,
    pub remaining_before: Amount,
    /// `None` when no route was chosen.
    pub path: Option<Path>,
    pub fee_redeem: Vec<AssetAmount>,
    pub success: bool,
    pub error: Option<String>,
    /// Transaction reference returned by the chain on success.
    pub tx_ref: Option<String>,
}

/// Result of one purchase attempt as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The order no longer exists.
    Skipped,
    Succeeded { tx_ref: String },
    Failed { reason: String },
}

impl PurchaseOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A failure worth keeping for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub created_at: DateTime<Utc>,
    pub order_id: Option<OrderId>,
    pub user: Option<UserAddress>,
    /// Operation that failed, e.g. `purchase` or `sync_user`.
    pub method: String,
    pub message: String,
}
