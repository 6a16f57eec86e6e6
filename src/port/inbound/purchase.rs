//! Purchase entry point used by the scheduler.

use async_trait::async_trait;

use crate::domain::{OrderId, PurchaseOutcome};

/// Runs one purchase attempt for an order.
///
/// Per-order failures are reported in the outcome, never as an error, so a
/// bad order cannot stop the scheduler.
#[async_trait]
pub trait PurchaseRunner: Send + Sync {
    async fn purchase(&self, order: &OrderId) -> PurchaseOutcome;
}
