//! Mirroring the DCA contract into a file-backed store.

mod support;

use dcabot::domain::AssetAmount;
use dcabot::port::{BalanceStore, CatalogStore, ErrorLogStore, OrderStore, UserStore};
use dcabot::testkit::domain::{astro, chain_order, dca_config, uluna, uusd};
use support::market::{alice, bob, fund, market};
use support::temp_db::TempDb;

#[tokio::test]
async fn hop_ids_survive_a_resync() {
    let db = TempDb::create();
    let chain = market();
    let services = db.services(chain.clone()).await;

    let first = services.synchronizer.sync_config().await.unwrap();
    assert_eq!(first.assets, 3);
    assert_eq!(first.hops, 3);
    let before = services.store.list_hops().await.unwrap();

    let second = services.synchronizer.sync_config().await.unwrap();
    assert_eq!(second.hops_removed, 0);
    let after = services.store.list_hops().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn delisted_pool_drops_its_hop() {
    let db = TempDb::create();
    let chain = market();
    let services = db.services(chain.clone()).await;
    services.synchronizer.sync_config().await.unwrap();

    chain.set_pools(&[(uusd(), uluna()), (uluna(), astro())]);
    let report = services.synchronizer.sync_config().await.unwrap();

    assert_eq!(report.hops, 2);
    assert_eq!(report.hops_removed, 1);
    let snapshot = services.index.snapshot();
    // Direct route gone, the detour through uluna remains.
    let paths = snapshot.index.find_paths(&uusd(), &astro(), 3);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 2);
}

#[tokio::test]
async fn unwhitelisting_an_asset_cascades_to_hops_and_orders() {
    let db = TempDb::create();
    let chain = market();
    let services = db.services(chain.clone()).await;
    services.synchronizer.sync_config().await.unwrap();

    chain.set_user_orders(
        &alice(),
        vec![
            chain_order(1, uusd(), 1_000, uluna(), 100),
            chain_order(2, uusd(), 1_000, astro(), 100),
        ],
    );
    let report = services.synchronizer.sync_user(&alice()).await.unwrap();
    assert_eq!(report.orders, 2);

    chain.set_config(dca_config(
        vec![uusd(), uluna()],
        vec![AssetAmount::new(uusd(), 100)],
    ));
    let report = services.synchronizer.sync_config().await.unwrap();
    assert_eq!(report.assets_removed, 1);
    assert_eq!(report.hops, 1);

    let orders = services.store.list_orders(Some(&alice())).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].target, uluna());
    assert!(services
        .index
        .snapshot()
        .index
        .find_paths(&uusd(), &astro(), 3)
        .is_empty());
}

#[tokio::test]
async fn user_sync_mirrors_orders_and_tip_balance() {
    let db = TempDb::create();
    let chain = market();
    let services = db.services(chain.clone()).await;
    services.synchronizer.sync_config().await.unwrap();

    fund(&chain, &alice(), 1_000);
    chain.set_user_orders(
        &alice(),
        vec![
            chain_order(1, uusd(), 1_000, uluna(), 100),
            chain_order(2, uusd(), 1_000, uluna(), 100),
        ],
    );
    services.synchronizer.sync_user(&alice()).await.unwrap();
    assert_eq!(
        services.store.fee_balances(&alice()).await.unwrap(),
        vec![AssetAmount::new(uusd(), 1_000)]
    );

    // Order 2 was cancelled on chain.
    chain.set_user_orders(&alice(), vec![chain_order(1, uusd(), 900, uluna(), 100)]);
    let report = services.synchronizer.sync_user(&alice()).await.unwrap();
    assert_eq!(report.orders, 1);
    assert_eq!(report.orders_removed, 1);

    let orders = services.store.list_orders(Some(&alice())).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].chain_id, 1);
    assert_eq!(orders[0].remaining, 900);
    assert_eq!(orders[0].max_hops, 3);
}

#[tokio::test]
async fn orders_for_unlisted_assets_are_skipped() {
    let db = TempDb::create();
    let chain = market();
    let services = db.services(chain.clone()).await;
    services.synchronizer.sync_config().await.unwrap();

    let doge = dcabot::domain::Asset::native("udoge");
    chain.set_user_orders(
        &alice(),
        vec![
            chain_order(1, uusd(), 1_000, doge, 100),
            chain_order(2, uusd(), 0, uluna(), 100),
            chain_order(3, uusd(), 1_000, uluna(), 100),
        ],
    );
    let report = services.synchronizer.sync_user(&alice()).await.unwrap();

    assert_eq!(report.orders, 1);
    assert_eq!(report.skipped, 2);
}

#[tokio::test]
async fn unreachable_user_is_logged_and_others_still_sync() {
    let db = TempDb::create();
    let chain = market();
    let services = db.services(chain.clone()).await;
    services.synchronizer.sync_config().await.unwrap();

    services.store.add_user(&alice()).await.unwrap();
    services.store.add_user(&bob()).await.unwrap();
    chain.set_user_orders(&alice(), vec![chain_order(1, uusd(), 1_000, uluna(), 100)]);
    chain.make_unreachable(&bob());

    let report = services.synchronizer.sync_users().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.failed, 1);

    let errors = services.store.recent_errors(10).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].method, "sync_user");
    assert_eq!(errors[0].user.as_ref(), Some(&bob()));
    assert_eq!(services.store.list_orders(Some(&alice())).await.unwrap().len(), 1);
}
