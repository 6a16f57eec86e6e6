//! Per-order scheduling: arming, reconciling and handling timer fires.
//!
//! ```text
//!            arm_next / reconcile
//! Unscheduled ─────────────────────▶ Armed(next_run_at)
//!      ▲                                  │ timer fires
//!      │ remaining decreased (trigger)    ▼
//!      └──────────────────────────── purchase ──▶ deleted when remaining hits 0
//! ```
//!
//! Arming is a compare-and-set in the store, so a reconcile sweep and a
//! timer fire racing on the same order cannot both win. The timer is only
//! registered by the side whose write went through.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use dashmap::DashSet;
use tracing::{debug, info, warn};

use crate::domain::{Order, OrderId};
use crate::error::Result;
use crate::port::inbound::purchase::PurchaseRunner;
use crate::port::outbound::store::Store;
use crate::port::outbound::timer::Timers;

/// Sub-second digits the store keeps for `next_run_at`. Timers are
/// registered at the same truncated instant so memory and disk agree.
const SCHEDULE_SUBSEC_DIGITS: u16 = 6;

/// Spacing for overdue orders armed in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub increment: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::seconds(10),
            increment: Duration::seconds(5),
        }
    }
}

/// Batch-local backoff counter.
///
/// The n-th overdue order of a batch (from zero) is delayed by
/// `base + n * increment`.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    taken: i32,
}

impl Backoff {
    #[must_use]
    pub const fn new(policy: BackoffPolicy) -> Self {
        Self { policy, taken: 0 }
    }

    /// Delay for the next overdue order.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.base + self.policy.increment * self.taken;
        self.taken = self.taken.saturating_add(1);
        delay
    }
}

/// What one [`OrderScheduler::reconcile`] sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub armed: usize,
    pub failed: usize,
    /// Armed orders whose missing local timer was registered again.
    pub restored: usize,
    /// Local timers dropped because their order is gone.
    pub cancelled: usize,
}

/// Removes the order from the in-flight set when the fire is done.
struct InFlight<'a> {
    set: &'a DashSet<OrderId>,
    order: OrderId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.order);
    }
}

pub struct OrderScheduler {
    store: Arc<dyn Store>,
    timers: Arc<dyn Timers>,
    runner: Arc<dyn PurchaseRunner>,
    policy: BackoffPolicy,
    /// Fires earlier than `next_run_at - early_fire_tolerance` only
    /// re-register the timer.
    early_fire_tolerance: Duration,
    in_flight: DashSet<OrderId>,
}

impl OrderScheduler {
    pub fn new(
        store: Arc<dyn Store>,
        timers: Arc<dyn Timers>,
        runner: Arc<dyn PurchaseRunner>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            store,
            timers,
            runner,
            policy,
            early_fire_tolerance: Duration::milliseconds(500),
            in_flight: DashSet::new(),
        }
    }

    /// Arm `order` for its next run and register the timer.
    ///
    /// The next run is `last_purchase_at + interval`, or `now` plus the next
    /// backoff delay when that is already past. Returns the armed time, or
    /// `None` when another writer changed the order first.
    ///
    /// # Errors
    /// Propagates store errors.
    pub async fn arm_next(&self, order: &Order, backoff: &mut Backoff) -> Result<Option<DateTime<Utc>>> {
        let now = Utc::now();
        let at = match order.regular_run_at() {
            Some(at) if at > now => at,
            _ => now + backoff.next_delay(),
        };
        self.arm_at(order, now, at).await
    }

    async fn arm_at(&self, order: &Order, now: DateTime<Utc>, at: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let at = at.trunc_subsecs(SCHEDULE_SUBSEC_DIGITS);
        let armed = self
            .store
            .arm_order(&order.id, order.last_purchase_at, now, at)
            .await?;
        if !armed {
            debug!(order_id = %order.id, "Order changed before it could be armed");
            return Ok(None);
        }
        self.timers.schedule_at(&order.id, at);
        debug!(order_id = %order.id, next_run_at = %at, "Order armed");
        Ok(Some(at))
    }

    /// Arm every order that needs it, restore timers lost across a restart
    /// and drop timers whose order is gone. One order failing does not stop
    /// the sweep.
    ///
    /// # Errors
    /// Fails only when the order lists cannot be read.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let now = Utc::now();
        let mut report = ReconcileReport::default();
        let mut backoff = Backoff::new(self.policy);

        for order in self.store.orders_needing_arming(now).await? {
            if self.in_flight.contains(&order.id) {
                continue;
            }
            match self.arm_next(&order, &mut backoff).await {
                Ok(Some(_)) => report.armed += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Failed to arm order");
                    report.failed += 1;
                }
            }
        }

        for order in self.store.armed_orders(now).await? {
            if let Some(at) = order.due_at() {
                if !self.timers.is_pending(&order.id) {
                    self.timers.schedule_at(&order.id, at);
                    report.restored += 1;
                }
            }
        }

        let existing: HashSet<OrderId> = self
            .store
            .list_orders(None)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();
        for pending in self.timers.pending_orders() {
            if !existing.contains(&pending) && self.timers.cancel(&pending) {
                report.cancelled += 1;
            }
        }

        if report != ReconcileReport::default() {
            info!(
                armed = report.armed,
                failed = report.failed,
                restored = report.restored,
                cancelled = report.cancelled,
                "Reconciled orders"
            );
        }
        Ok(report)
    }

    /// Handle a timer fire for `order_id`: purchase, then re-arm.
    ///
    /// A failed attempt re-arms at `now + interval` so the order waits a
    /// full interval rather than retrying at once.
    pub async fn handle_fire(&self, order_id: &OrderId) {
        if !self.in_flight.insert(order_id.clone()) {
            debug!(order_id = %order_id, "Purchase already in flight");
            return;
        }
        let _guard = InFlight {
            set: &self.in_flight,
            order: order_id.clone(),
        };

        let order = match self.store.get_order(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                self.timers.cancel(order_id);
                return;
            }
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Failed to load fired order");
                return;
            }
        };
        if let Some(at) = order.due_at() {
            if at - self.early_fire_tolerance > Utc::now() {
                self.timers.schedule_at(order_id, at);
                return;
            }
        }

        let outcome = self.runner.purchase(order_id).await;

        let order = match self.store.get_order(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                self.timers.cancel(order_id);
                debug!(order_id = %order_id, "Order completed");
                return;
            }
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Failed to reload order; reconcile will re-arm");
                return;
            }
        };

        let now = Utc::now();
        if !order.needs_arming(now) {
            if let Some(at) = order.due_at() {
                if !self.timers.is_pending(order_id) {
                    self.timers.schedule_at(order_id, at);
                }
            }
            return;
        }

        let rearmed = if outcome.is_failure() {
            let at = now.checked_add_signed(order.interval()).unwrap_or(now);
            self.arm_at(&order, now, at).await
        } else {
            self.arm_next(&order, &mut Backoff::new(self.policy)).await
        };
        if let Err(e) = rearmed {
            warn!(order_id = %order_id, error = %e, "Failed to re-arm order; reconcile will retry");
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::adapter::outbound::sqlite::SqliteStore;
    use crate::domain::{PurchaseOutcome, ScheduleState};
    use crate::port::outbound::store::OrderStore;
    use crate::testkit::domain::{
        memory_store, order, seed_catalog, seed_order, user, uluna, uusd, whole_seconds,
    };
    use crate::testkit::RecordingTimers;

    /// Runner that spends a fixed slice of the order, or fails.
    struct ScriptedRunner {
        store: Arc<SqliteStore>,
        fail: bool,
        calls: Mutex<Vec<OrderId>>,
    }

    #[async_trait]
    impl PurchaseRunner for ScriptedRunner {
        async fn purchase(&self, order: &OrderId) -> PurchaseOutcome {
            self.calls.lock().push(order.clone());
            if self.fail {
                return PurchaseOutcome::Failed {
                    reason: "no route".into(),
                };
            }
            self.store
                .record_consumption(order, 500_000, Utc::now())
                .await
                .unwrap();
            PurchaseOutcome::Succeeded {
                tx_ref: "tx".into(),
            }
        }
    }

    struct Fixture {
        store: Arc<SqliteStore>,
        timers: Arc<RecordingTimers>,
        runner: Arc<ScriptedRunner>,
        scheduler: OrderScheduler,
    }

    async fn fixture(fail: bool) -> Fixture {
        let store = memory_store();
        seed_catalog(&store, &[uusd(), uluna()], &[(uusd(), uluna())]).await;
        let timers = Arc::new(RecordingTimers::new());
        let runner = Arc::new(ScriptedRunner {
            store: store.clone(),
            fail,
            calls: Mutex::new(Vec::new()),
        });
        let scheduler = OrderScheduler::new(
            store.clone(),
            timers.clone(),
            runner.clone(),
            BackoffPolicy::default(),
        );
        Fixture {
            store,
            timers,
            runner,
            scheduler,
        }
    }

    fn order_n(n: u64) -> Order {
        order(&user("terra1user"), n, uusd(), uluna())
    }

    // ---- backoff ----

    #[test]
    fn backoff_grows_per_order() {
        let mut backoff = Backoff::new(BackoffPolicy {
            base: Duration::seconds(10),
            increment: Duration::seconds(5),
        });
        assert_eq!(backoff.next_delay(), Duration::seconds(10));
        assert_eq!(backoff.next_delay(), Duration::seconds(15));
        assert_eq!(backoff.next_delay(), Duration::seconds(20));
    }

    // ---- arming ----

    #[tokio::test]
    async fn arm_next_uses_regular_interval_when_in_future() {
        let f = fixture(false).await;
        let mut order = order_n(1);
        order.last_purchase_at = whole_seconds(Utc::now() - Duration::minutes(10));
        seed_order(&f.store, &order).await;

        let at = f
            .scheduler
            .arm_next(&order, &mut Backoff::new(BackoffPolicy::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(Some(at), order.regular_run_at());
        assert_eq!(f.timers.deadline(&order.id), Some(at));
        let stored = f.store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.schedule, ScheduleState::Armed { next_run_at: at });
    }

    #[tokio::test]
    async fn timer_and_store_agree_on_sub_second_deadline() {
        let f = fixture(false).await;
        let mut order = order_n(1);
        // Nanosecond precision, as `Utc::now()` gives on most platforms.
        order.last_purchase_at = whole_seconds(Utc::now() - Duration::minutes(10))
            + Duration::nanoseconds(123_456_789);
        seed_order(&f.store, &order).await;

        let at = f
            .scheduler
            .arm_next(&order, &mut Backoff::new(BackoffPolicy::default()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(at.timestamp_subsec_nanos() % 1_000, 0);
        let stored = f.store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.due_at(), Some(at));
        assert_eq!(f.timers.deadline(&order.id), Some(at));
    }

    #[tokio::test]
    async fn overdue_orders_are_spread_within_a_batch() {
        let f = fixture(false).await;
        for n in 1..=3 {
            seed_order(&f.store, &order_n(n)).await;
        }

        let before = Utc::now();
        let report = f.scheduler.reconcile().await.unwrap();
        assert_eq!(report.armed, 3);

        let deadlines: Vec<DateTime<Utc>> = (1..=3)
            .map(|n| f.timers.deadline(&order_n(n).id).unwrap())
            .collect();
        assert!(deadlines[0] >= before + Duration::seconds(10));
        assert!(deadlines[1] - deadlines[0] >= Duration::seconds(4));
        assert!(deadlines[2] - deadlines[1] >= Duration::seconds(4));
    }

    #[tokio::test]
    async fn reconcile_rearms_elapsed_schedule() {
        let f = fixture(false).await;
        let order = order_n(1);
        seed_order(&f.store, &order).await;
        let past = Utc::now() - Duration::minutes(1);
        f.store
            .arm_order(&order.id, order.last_purchase_at, past - Duration::minutes(1), past)
            .await
            .unwrap();

        f.scheduler.reconcile().await.unwrap();

        let stored = f.store.get_order(&order.id).await.unwrap().unwrap();
        let next = stored.due_at().unwrap();
        assert!(next > Utc::now());
        assert_eq!(f.timers.deadline(&order.id), Some(next));
    }

    #[tokio::test]
    async fn losing_the_arm_race_registers_no_timer() {
        let f = fixture(false).await;
        let order = order_n(1);
        seed_order(&f.store, &order).await;
        let mut backoff = Backoff::new(BackoffPolicy::default());

        let first = f.scheduler.arm_next(&order, &mut backoff).await.unwrap();
        let history_len = f.timers.history().len();
        let second = f.scheduler.arm_next(&order, &mut backoff).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(f.timers.history().len(), history_len);
    }

    #[tokio::test]
    async fn reconcile_restores_and_cancels_timers() {
        let f = fixture(false).await;
        let kept = order_n(1);
        seed_order(&f.store, &kept).await;
        let future = Utc::now() + Duration::hours(1);
        f.store
            .arm_order(&kept.id, kept.last_purchase_at, Utc::now(), future)
            .await
            .unwrap();
        let ghost = order_n(9).id;
        f.timers.schedule_at(&ghost, future);

        let report = f.scheduler.reconcile().await.unwrap();

        assert_eq!(report.restored, 1);
        assert_eq!(report.cancelled, 1);
        assert_eq!(f.timers.pending_orders(), vec![kept.id]);
    }

    // ---- fires ----

    #[tokio::test]
    async fn fire_purchases_and_rearms_at_next_interval() {
        let f = fixture(false).await;
        let order = order_n(1);
        seed_order(&f.store, &order).await;
        f.scheduler.reconcile().await.unwrap();
        let armed_at = f.timers.deadline(&order.id).unwrap();
        // Pretend the deadline has come.
        f.store
            .arm_order(&order.id, order.last_purchase_at, armed_at, Utc::now())
            .await
            .unwrap();

        f.scheduler.handle_fire(&order.id).await;

        assert_eq!(f.runner.calls.lock().len(), 1);
        let stored = f.store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.remaining, 500_000);
        let next = stored.due_at().unwrap();
        assert!(next > Utc::now() + Duration::minutes(59));
        assert_eq!(f.timers.deadline(&order.id), Some(next));
        assert_eq!(f.scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn exhausted_order_is_forgotten() {
        let f = fixture(false).await;
        let mut order = order_n(1);
        order.remaining = 500_000;
        seed_order(&f.store, &order).await;
        f.timers.schedule_at(&order.id, Utc::now());

        f.scheduler.handle_fire(&order.id).await;

        assert!(f.store.get_order(&order.id).await.unwrap().is_none());
        assert!(!f.timers.is_pending(&order.id));
    }

    #[tokio::test]
    async fn failed_purchase_waits_a_full_interval() {
        let f = fixture(true).await;
        let order = order_n(1);
        seed_order(&f.store, &order).await;

        let before = Utc::now();
        f.scheduler.handle_fire(&order.id).await;

        let stored = f.store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.remaining, order.remaining);
        let next = stored.due_at().unwrap();
        assert!(next >= before + Duration::hours(1));
        assert_eq!(f.timers.deadline(&order.id), Some(next));
    }

    #[tokio::test]
    async fn early_fire_only_reregisters_timer() {
        let f = fixture(false).await;
        let mut order = order_n(1);
        order.last_purchase_at = Utc::now() - Duration::minutes(10);
        seed_order(&f.store, &order).await;
        let at = f
            .scheduler
            .arm_next(&order, &mut Backoff::new(BackoffPolicy::default()))
            .await
            .unwrap()
            .unwrap();
        f.timers.cancel(&order.id);

        f.scheduler.handle_fire(&order.id).await;

        assert!(f.runner.calls.lock().is_empty());
        assert_eq!(f.timers.deadline(&order.id), Some(at));
    }

    #[tokio::test]
    async fn fire_for_deleted_order_cancels_timer() {
        let f = fixture(false).await;
        let id = order_n(4).id;
        f.timers.schedule_at(&id, Utc::now());

        f.scheduler.handle_fire(&id).await;

        assert!(!f.timers.is_pending(&id));
        assert!(f.runner.calls.lock().is_empty());
    }
}
