//! [`Timers`] that only remember what was asked of them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::OrderId;
use crate::port::outbound::timer::Timers;

/// Records deadlines instead of sleeping. Tests drive fires by hand.
#[derive(Default)]
pub struct RecordingTimers {
    pending: Mutex<HashMap<OrderId, DateTime<Utc>>>,
    scheduled: Mutex<Vec<(OrderId, DateTime<Utc>)>>,
}

impl RecordingTimers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline of the pending timer for `order`.
    #[must_use]
    pub fn deadline(&self, order: &OrderId) -> Option<DateTime<Utc>> {
        self.pending.lock().get(order).copied()
    }

    /// Every `schedule_at` call, in order.
    #[must_use]
    pub fn history(&self) -> Vec<(OrderId, DateTime<Utc>)> {
        self.scheduled.lock().clone()
    }
}

impl Timers for RecordingTimers {
    fn schedule_at(&self, order: &OrderId, at: DateTime<Utc>) {
        self.pending.lock().insert(order.clone(), at);
        self.scheduled.lock().push((order.clone(), at));
    }

    fn cancel(&self, order: &OrderId) -> bool {
        self.pending.lock().remove(order).is_some()
    }

    fn is_pending(&self, order: &OrderId) -> bool {
        self.pending.lock().contains_key(order)
    }

    fn pending_orders(&self) -> Vec<OrderId> {
        let mut orders: Vec<_> = self.pending.lock().keys().cloned().collect();
        orders.sort();
        orders
    }
}
