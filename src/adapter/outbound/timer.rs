//! Tokio-backed order timers.
//!
//! Each pending timer is a sleeping tokio task registered in a `DashMap`
//! keyed by order. Scheduling again for the same order aborts the previous
//! task under the map entry, so an order never has two live timers. When a
//! timer fires it removes its own entry (unless it has been superseded) and
//! sends the order id on the fire channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::domain::OrderId;
use crate::port::outbound::timer::Timers;

struct TimerEntry {
    generation: u64,
    task: JoinHandle<()>,
}

/// [`Timers`] implementation on the tokio runtime.
pub struct TokioTimers {
    entries: Arc<DashMap<OrderId, TimerEntry>>,
    generation: AtomicU64,
    fires: mpsc::UnboundedSender<OrderId>,
    runtime: Handle,
}

impl TokioTimers {
    /// Create the registry and the receiver its fires are delivered on.
    #[must_use]
    pub fn new(runtime: Handle) -> (Self, mpsc::UnboundedReceiver<OrderId>) {
        let (fires, rx) = mpsc::unbounded_channel();
        let timers = Self {
            entries: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            fires,
            runtime,
        };
        (timers, rx)
    }

    fn spawn_timer(&self, order: OrderId, at: DateTime<Utc>, generation: u64) -> JoinHandle<()> {
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let entries = Arc::clone(&self.entries);
        let fires = self.fires.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            entries.remove_if(&order, |_, entry| entry.generation == generation);
            trace!(order_id = %order, "Order timer fired");
            // The receiver is gone only during shutdown.
            let _ = fires.send(order);
        })
    }
}

impl Timers for TokioTimers {
    fn schedule_at(&self, order: &OrderId, at: DateTime<Utc>) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        match self.entries.entry(order.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get().task.abort();
                let task = self.spawn_timer(order.clone(), at, generation);
                occupied.insert(TimerEntry { generation, task });
            }
            Entry::Vacant(vacant) => {
                let task = self.spawn_timer(order.clone(), at, generation);
                vacant.insert(TimerEntry { generation, task });
            }
        }
    }

    fn cancel(&self, order: &OrderId) -> bool {
        match self.entries.remove(order) {
            Some((_, entry)) => {
                entry.task.abort();
                true
            }
            None => false,
        }
    }

    fn is_pending(&self, order: &OrderId) -> bool {
        self.entries.contains_key(order)
    }

    fn pending_orders(&self) -> Vec<OrderId> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for entry in self.entries.iter() {
            entry.task.abort();
        }
    }
}
