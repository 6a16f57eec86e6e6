//! Mirror the DCA contract into the local store.
//!
//! Config sync refreshes the whitelist, fee schedule and hops, then rebuilds
//! the path index. User sync refreshes one user's tip balances and orders.
//! Anything no longer present upstream is deleted locally and the store's
//! cascades take care of dependent rows.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::index::PathIndexHandle;
use crate::domain::contract::{ChainOrder, DcaConfig};
use crate::domain::{Asset, ErrorLogEntry, FeeSchedule, Order, OrderId, ScheduleState, UserAddress};
use crate::error::Result;
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::store::Store;

/// Contract-wide settings users fall back to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContractDefaults {
    max_hops: usize,
    max_spread: String,
}

impl From<&DcaConfig> for ContractDefaults {
    fn from(config: &DcaConfig) -> Self {
        Self {
            max_hops: usize::try_from(config.max_hops).unwrap_or(usize::MAX),
            max_spread: config.max_spread.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfigSyncReport {
    pub assets: usize,
    pub assets_removed: usize,
    pub hops: usize,
    pub hops_removed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserSyncReport {
    pub orders: usize,
    /// Upstream orders left out: non-whitelisted assets or nothing left.
    pub skipped: usize,
    pub orders_removed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsersSyncReport {
    pub synced: usize,
    pub failed: usize,
}

pub struct Synchronizer {
    store: Arc<dyn Store>,
    chain: Arc<dyn ChainClient>,
    index: Arc<PathIndexHandle>,
    defaults: RwLock<Option<ContractDefaults>>,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn Store>, chain: Arc<dyn ChainClient>, index: Arc<PathIndexHandle>) -> Self {
        Self {
            store,
            chain,
            index,
            defaults: RwLock::new(None),
        }
    }

    /// Refresh whitelisted assets, the fee schedule and hops, then rebuild
    /// the path index from the stored catalog.
    ///
    /// # Errors
    /// Fails on chain or store errors; the index is left as it was.
    pub async fn sync_config(&self) -> Result<ConfigSyncReport> {
        let config = self.chain.dca_config().await?;
        *self.defaults.write() = Some(ContractDefaults::from(&config));

        for asset in &config.whitelisted_tokens {
            self.store.upsert_asset(asset).await?;
        }
        let assets_removed = self.store.retain_assets(&config.whitelisted_tokens).await?;

        let schedule: FeeSchedule = config
            .whitelisted_fee_assets
            .iter()
            .map(|fee| (fee.asset.clone(), fee.amount))
            .collect();
        self.store.replace_fee_schedule(&schedule).await?;

        let whitelisted: HashSet<&Asset> = config.whitelisted_tokens.iter().collect();
        let pools = self.chain.list_pools().await?;
        let mut keep = Vec::with_capacity(pools.len());
        for pool in &pools {
            let [a, b] = &pool.assets;
            if a == b || !whitelisted.contains(a) || !whitelisted.contains(b) {
                continue;
            }
            let hop = self.store.upsert_hop(a, b).await?;
            keep.push(hop.pair_key());
        }
        let hops_removed = self.store.retain_hops(&keep).await?;

        let catalog = self.store.load_catalog().await?;
        let report = ConfigSyncReport {
            assets: config.whitelisted_tokens.len(),
            assets_removed,
            hops: catalog.hops().count(),
            hops_removed,
        };
        self.index.rebuild(catalog);

        info!(
            assets = report.assets,
            assets_removed = report.assets_removed,
            hops = report.hops,
            hops_removed = report.hops_removed,
            pools = pools.len(),
            "Config synced"
        );
        Ok(report)
    }

    /// Refresh `user`'s tip balances and orders.
    ///
    /// # Errors
    /// Fails on chain or store errors.
    pub async fn sync_user(&self, user: &UserAddress) -> Result<UserSyncReport> {
        self.store.add_user(user).await?;

        let user_config = self.chain.user_config(user).await?;
        self.store
            .replace_fee_balances(user, &user_config.tip_balance)
            .await?;

        let defaults = self.defaults().await?;
        let max_hops = user_config
            .max_hops
            .map_or(defaults.max_hops, |hops| usize::try_from(hops).unwrap_or(usize::MAX));
        let max_spread = user_config.max_spread.unwrap_or(defaults.max_spread);

        let whitelisted: HashSet<Asset> = self.store.list_assets().await?.into_iter().collect();
        let upstream = self.chain.user_orders(user).await?;

        let mut report = UserSyncReport::default();
        let mut keep = Vec::with_capacity(upstream.len());
        for chain_order in upstream {
            let source = &chain_order.initial_asset.asset;
            if !whitelisted.contains(source)
                || !whitelisted.contains(&chain_order.target_asset)
                || chain_order.initial_asset.amount == 0
            {
                debug!(user = %user, order = chain_order.id, "Skipping upstream order");
                report.skipped += 1;
                continue;
            }
            let order = local_order(user, chain_order, max_hops, &max_spread);
            self.store.upsert_order(&order).await?;
            keep.push(order.id);
            report.orders += 1;
        }
        report.orders_removed = self.store.retain_orders(user, &keep).await?;

        debug!(
            user = %user,
            orders = report.orders,
            skipped = report.skipped,
            removed = report.orders_removed,
            tip_assets = user_config.tip_balance.len(),
            "User synced"
        );
        Ok(report)
    }

    /// Sync every registered user. A failing user is logged to the error
    /// log and does not stop the others.
    ///
    /// # Errors
    /// Fails only if the user list cannot be read.
    pub async fn sync_users(&self) -> Result<UsersSyncReport> {
        let users = self.store.list_users().await?;
        let mut report = UsersSyncReport::default();
        for user in &users {
            match self.sync_user(user).await {
                Ok(_) => report.synced += 1,
                Err(e) => {
                    warn!(user = %user, error = %e, "User sync failed");
                    report.failed += 1;
                    let entry = ErrorLogEntry {
                        created_at: Utc::now(),
                        order_id: None,
                        user: Some(user.clone()),
                        method: "sync_user".into(),
                        message: e.to_string(),
                    };
                    if let Err(log_err) = self.store.log_error(&entry).await {
                        warn!(user = %user, error = %log_err, "Failed to record sync error");
                    }
                }
            }
        }
        info!(synced = report.synced, failed = report.failed, "Users synced");
        Ok(report)
    }

    async fn defaults(&self) -> Result<ContractDefaults> {
        let cached = self.defaults.read().clone();
        if let Some(defaults) = cached {
            return Ok(defaults);
        }
        let defaults = ContractDefaults::from(&self.chain.dca_config().await?);
        *self.defaults.write() = Some(defaults.clone());
        Ok(defaults)
    }
}

fn local_order(user: &UserAddress, upstream: ChainOrder, max_hops: usize, max_spread: &str) -> Order {
    Order {
        id: OrderId::new(user, upstream.id),
        user: user.clone(),
        chain_id: upstream.id,
        source: upstream.initial_asset.asset,
        remaining: upstream.initial_asset.amount,
        token_allowance: upstream.token_allowance,
        target: upstream.target_asset,
        interval_secs: upstream.interval_secs,
        purchase_amount: upstream.dca_amount,
        max_hops,
        max_spread: max_spread.to_string(),
        last_purchase_at: upstream.last_purchase,
        schedule: ScheduleState::Unscheduled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::SqliteStore;
    use crate::domain::contract::UserConfig;
    use crate::domain::AssetAmount;
    use crate::port::outbound::store::{
        BalanceStore, CatalogStore, ErrorLogStore, OrderStore, UserStore,
    };
    use crate::testkit::domain::{astro, chain_order, dca_config, memory_store, user, uluna, uusd};
    use crate::testkit::FakeChain;

    struct Fixture {
        store: Arc<SqliteStore>,
        chain: Arc<FakeChain>,
        index: Arc<PathIndexHandle>,
        sync: Synchronizer,
    }

    fn fixture() -> Fixture {
        let store = memory_store();
        let chain = Arc::new(FakeChain::new());
        let index = Arc::new(PathIndexHandle::new(3));
        let sync = Synchronizer::new(store.clone(), chain.clone(), Arc::clone(&index));
        chain.set_config(dca_config(
            vec![uusd(), uluna(), astro()],
            vec![AssetAmount::new(uusd(), 100)],
        ));
        chain.set_pools(&[
            (uusd(), uluna()),
            (uluna(), astro()),
            (uusd(), Asset::native("ukrw")),
        ]);
        Fixture {
            store,
            chain,
            index,
            sync,
        }
    }

    // ---- config sync ----

    #[tokio::test]
    async fn config_sync_keeps_only_whitelisted_hops() {
        let f = fixture();
        let report = f.sync.sync_config().await.unwrap();

        assert_eq!(report.assets, 3);
        assert_eq!(report.hops, 2);
        let keys: Vec<String> = f.store.list_hops().await.unwrap().iter().map(|h| h.pair_key()).collect();
        assert_eq!(keys, vec!["uluna-uusd".to_string(), "terra1astro-uluna".to_string()]);
        assert_eq!(f.store.fee_schedule().await.unwrap().per_hop(&uusd()), Some(100));
    }

    #[tokio::test]
    async fn config_sync_rebuilds_index() {
        let f = fixture();
        f.sync.sync_config().await.unwrap();

        let paths = f.index.snapshot().index.find_paths(&uusd(), &astro(), 3);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].encode(), "<1><2>");
    }

    #[tokio::test]
    async fn hop_ids_stable_across_resync() {
        let f = fixture();
        f.sync.sync_config().await.unwrap();
        let before = f.store.list_hops().await.unwrap();

        f.chain.set_pools(&[(uluna(), astro()), (uluna(), uusd())]);
        f.sync.sync_config().await.unwrap();
        let after = f.store.list_hops().await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn delisting_removes_hops_and_asset() {
        let f = fixture();
        f.sync.sync_config().await.unwrap();

        f.chain
            .set_config(dca_config(vec![uusd(), uluna()], vec![AssetAmount::new(uusd(), 100)]));
        let report = f.sync.sync_config().await.unwrap();

        assert_eq!(report.assets_removed, 1);
        assert_eq!(report.hops, 1);
        assert!(f
            .index
            .snapshot()
            .index
            .find_paths(&uusd(), &astro(), 3)
            .is_empty());
    }

    // ---- user sync ----

    #[tokio::test]
    async fn user_sync_imports_orders_and_balances() {
        let f = fixture();
        f.sync.sync_config().await.unwrap();
        let alice = user("terra1alice");
        f.chain.set_user_config(
            &alice,
            UserConfig {
                max_hops: Some(2),
                max_spread: None,
                tip_balance: vec![
                    AssetAmount::new(uluna(), 10),
                    AssetAmount::new(uusd(), 500),
                ],
            },
        );
        f.chain.set_user_orders(
            &alice,
            vec![
                chain_order(1, uusd(), 1_000_000, astro(), 500_000),
                chain_order(2, uusd(), 1_000, Asset::native("ukrw"), 100),
                chain_order(3, uusd(), 0, uluna(), 100),
            ],
        );

        let report = f.sync.sync_user(&alice).await.unwrap();

        assert_eq!(report.orders, 1);
        assert_eq!(report.skipped, 2);
        let orders = f.store.list_orders(Some(&alice)).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id.as_str(), "terra1alice-1");
        assert_eq!(orders[0].max_hops, 2);
        assert_eq!(orders[0].max_spread, "0.5");
        assert_eq!(orders[0].purchase_amount, 500_000);
        assert_eq!(
            f.store.fee_balances(&alice).await.unwrap(),
            vec![AssetAmount::new(uluna(), 10), AssetAmount::new(uusd(), 500)]
        );
    }

    #[tokio::test]
    async fn user_sync_removes_orders_gone_upstream() {
        let f = fixture();
        f.sync.sync_config().await.unwrap();
        let alice = user("terra1alice");
        f.chain.set_user_orders(
            &alice,
            vec![
                chain_order(1, uusd(), 1_000, astro(), 100),
                chain_order(2, uusd(), 1_000, uluna(), 100),
            ],
        );
        f.sync.sync_user(&alice).await.unwrap();

        f.chain
            .set_user_orders(&alice, vec![chain_order(2, uusd(), 1_000, uluna(), 100)]);
        let report = f.sync.sync_user(&alice).await.unwrap();

        assert_eq!(report.orders_removed, 1);
        let ids: Vec<String> = f
            .store
            .list_orders(Some(&alice))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id.to_string())
            .collect();
        assert_eq!(ids, vec!["terra1alice-2".to_string()]);
    }

    #[tokio::test]
    async fn user_defaults_come_from_contract() {
        let f = fixture();
        let alice = user("terra1alice");
        f.chain.set_user_orders(&alice, vec![]);

        // No config sync yet: defaults are fetched on demand.
        f.sync.sync_user(&alice).await.unwrap();
        assert_eq!(f.store.list_users().await.unwrap(), vec![alice]);
    }

    #[tokio::test]
    async fn failing_user_does_not_stop_the_rest() {
        let f = fixture();
        f.sync.sync_config().await.unwrap();
        let alice = user("terra1alice");
        let bob = user("terra1bob");
        f.store.add_user(&alice).await.unwrap();
        f.store.add_user(&bob).await.unwrap();
        f.chain.make_unreachable(&alice);
        f.chain
            .set_user_orders(&bob, vec![chain_order(1, uusd(), 1_000, astro(), 100)]);

        let report = f.sync.sync_users().await.unwrap();

        assert_eq!(report, UsersSyncReport { synced: 1, failed: 1 });
        assert_eq!(f.store.list_orders(Some(&bob)).await.unwrap().len(), 1);
        let errors = f.store.recent_errors(10).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].method, "sync_user");
        assert_eq!(errors[0].user.as_ref(), Some(&alice));
    }
}
