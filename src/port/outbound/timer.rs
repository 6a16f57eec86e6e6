//! Timer port: at most one pending fire per order.

use chrono::{DateTime, Utc};

use crate::domain::OrderId;

/// Registry of pending order timers.
///
/// Implementations deliver fires out of band (the tokio adapter sends the
/// order id on a channel).
pub trait Timers: Send + Sync {
    /// Fire for `order` at `at`, replacing any timer already pending for it.
    fn schedule_at(&self, order: &OrderId, at: DateTime<Utc>);

    /// Drop the pending timer for `order`. Returns whether one existed.
    fn cancel(&self, order: &OrderId) -> bool;

    fn is_pending(&self, order: &OrderId) -> bool;

    fn pending_orders(&self) -> Vec<OrderId>;
}
