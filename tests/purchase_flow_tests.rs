//! Scheduler, pipeline and store working together on a file-backed
//! database: sync, arm, fire, purchase, re-arm, finish.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};

use dcabot::application::scheduler::BackoffPolicy;
use dcabot::application::{OrderScheduler, PurchasePipeline};
use dcabot::domain::{OrderId, SwapOperation};
use dcabot::infrastructure::bootstrap::Services;
use dcabot::port::{ErrorLogStore, ExecutionStore, OrderStore, Timers};
use dcabot::testkit::domain::{astro, chain_order, uluna, uusd};
use dcabot::testkit::{FakeChain, RecordingTimers};
use support::market::{alice, fund, market, seed_prices};
use support::temp_db::TempDb;

fn no_backoff() -> BackoffPolicy {
    BackoffPolicy {
        base: Duration::zero(),
        increment: Duration::zero(),
    }
}

fn op(offer: dcabot::domain::Asset, ask: dcabot::domain::Asset) -> SwapOperation {
    SwapOperation { offer, ask }
}

struct Flow {
    chain: Arc<FakeChain>,
    services: Services,
    timers: Arc<RecordingTimers>,
    scheduler: OrderScheduler,
    order: OrderId,
}

impl Flow {
    fn scheduler(services: &Services, timers: Arc<RecordingTimers>) -> OrderScheduler {
        let pipeline = PurchasePipeline::new(
            services.store.clone(),
            Arc::clone(&services.chain),
            services.selector(),
        );
        OrderScheduler::new(services.store.clone(), timers, Arc::new(pipeline), no_backoff())
    }
}

/// Alice buys uluna with 1,000,000 uusd in two slices of 500,000. The
/// detour through astro simulates better than the direct pool.
async fn flow(db: &TempDb, tip: u128) -> Flow {
    let chain = market();
    fund(&chain, &alice(), tip);
    chain.set_user_orders(
        &alice(),
        vec![chain_order(1, uusd(), 1_000_000, uluna(), 500_000)],
    );
    chain.simulate(vec![op(uusd(), uluna())], 900);
    chain.simulate(vec![op(uusd(), astro()), op(astro(), uluna())], 1_200);

    let services = db.services(chain.clone()).await;
    services.synchronizer.sync_config().await.unwrap();
    services.synchronizer.sync_user(&alice()).await.unwrap();
    seed_prices(services.store.as_ref()).await;

    let timers = Arc::new(RecordingTimers::new());
    let scheduler = Flow::scheduler(&services, timers.clone());
    Flow {
        chain,
        services,
        timers,
        scheduler,
        order: OrderId::new(&alice(), 1),
    }
}

#[tokio::test]
async fn overdue_order_runs_twice_then_disappears() {
    let db = TempDb::create();
    let f = flow(&db, 1_000).await;

    let report = f.scheduler.reconcile().await.unwrap();
    assert_eq!(report.armed, 1);
    assert!(f.timers.is_pending(&f.order));

    f.scheduler.handle_fire(&f.order).await;

    let submissions = f.chain.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].operations,
        vec![op(uusd(), astro()), op(astro(), uluna())]
    );
    assert_eq!(submissions[0].fee_redeem.len(), 1);
    assert_eq!(submissions[0].fee_redeem[0].amount, 200);

    let order = f.services.store.get_order(&f.order).await.unwrap().unwrap();
    assert_eq!(order.remaining, 500_000);
    let next = f.timers.deadline(&f.order).unwrap();
    let expected = Utc::now() + Duration::hours(1);
    assert!((next - expected).num_seconds().abs() <= 5);

    let history = f.services.store.executions(Some(&f.order), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].success);
    assert_eq!(history[0].tx_ref.as_deref(), Some("tx-1"));

    // Pull the second slice forward.
    assert!(f
        .services
        .store
        .arm_order(
            &f.order,
            order.last_purchase_at,
            Utc::now() + Duration::hours(2),
            Utc::now(),
        )
        .await
        .unwrap());
    f.scheduler.handle_fire(&f.order).await;

    assert_eq!(f.chain.submissions().len(), 2);
    assert!(f.services.store.get_order(&f.order).await.unwrap().is_none());
    assert!(f
        .services
        .store
        .executions(Some(&f.order), 10)
        .await
        .unwrap()
        .is_empty());
    assert!(!f.timers.is_pending(&f.order));
}

#[tokio::test]
async fn unaffordable_purchase_waits_a_full_interval() {
    let db = TempDb::create();
    let f = flow(&db, 0).await;

    f.scheduler.reconcile().await.unwrap();
    f.scheduler.handle_fire(&f.order).await;

    assert!(f.chain.submissions().is_empty());
    let order = f.services.store.get_order(&f.order).await.unwrap().unwrap();
    assert_eq!(order.remaining, 1_000_000);

    let errors = f.services.store.recent_errors(10).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].method, "purchase");
    assert_eq!(errors[0].order_id.as_ref(), Some(&f.order));

    let history = f.services.store.executions(Some(&f.order), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].success);

    let next = f.timers.deadline(&f.order).unwrap();
    let expected = Utc::now() + Duration::hours(1);
    assert!((next - expected).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn restarted_scheduler_restores_armed_timers() {
    let db = TempDb::create();
    let f = flow(&db, 1_000).await;
    f.scheduler.reconcile().await.unwrap();
    f.scheduler.handle_fire(&f.order).await;
    let armed_for = f.timers.deadline(&f.order).unwrap();

    // A new process: same database, no timers.
    let services = db.services(f.chain.clone()).await;
    let timers = Arc::new(RecordingTimers::new());
    let scheduler = Flow::scheduler(&services, timers.clone());

    let report = scheduler.reconcile().await.unwrap();
    assert_eq!(report.armed, 0);
    assert_eq!(report.restored, 1);
    let restored = timers.deadline(&f.order).unwrap();
    assert!((restored - armed_for).num_milliseconds().abs() < 1);
}
