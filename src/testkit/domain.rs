//! Builders for domain values and seeded stores.
//!
//! Keeps test setup to a line or two: a fresh in-memory store, the usual
//! assets, an order with sensible defaults.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::adapter::outbound::sqlite::{open, SqliteStore};
use crate::domain::contract::{ChainOrder, DcaConfig};
use crate::domain::{
    Amount, Asset, AssetAmount, FeeSchedule, Hop, Order, OrderId, ScheduleState, UserAddress,
};
use crate::port::outbound::store::{BalanceStore, CatalogStore, OrderStore, UserStore};

pub fn uusd() -> Asset {
    Asset::native("uusd")
}

pub fn uluna() -> Asset {
    Asset::native("uluna")
}

pub fn astro() -> Asset {
    Asset::contract("terra1astro")
}

pub fn user(address: &str) -> UserAddress {
    UserAddress::new(address)
}

/// Fresh in-memory store with the schema applied.
///
/// # Panics
/// Panics if the in-memory database cannot be opened.
pub fn memory_store() -> Arc<SqliteStore> {
    let pool = open(":memory:").expect("in-memory database");
    Arc::new(SqliteStore::new(pool))
}

/// Whitelist `assets` and add one hop per pair, returning the hops in the
/// order given.
///
/// # Panics
/// Panics on store errors.
pub async fn seed_catalog(store: &SqliteStore, assets: &[Asset], pairs: &[(Asset, Asset)]) -> Vec<Hop> {
    for asset in assets {
        store.upsert_asset(asset).await.expect("upsert asset");
    }
    let mut hops = Vec::with_capacity(pairs.len());
    for (offer, ask) in pairs {
        hops.push(store.upsert_hop(offer, ask).await.expect("upsert hop"));
    }
    hops
}

/// Register `user` with the given tip balances and a fee schedule.
///
/// # Panics
/// Panics on store errors.
pub async fn seed_fees(
    store: &SqliteStore,
    user: &UserAddress,
    schedule: &FeeSchedule,
    balances: &[AssetAmount],
) {
    store.add_user(user).await.expect("add user");
    store.replace_fee_schedule(schedule).await.expect("fee schedule");
    store
        .replace_fee_balances(user, balances)
        .await
        .expect("fee balances");
}

/// An unscheduled order selling `source` for `target` once an hour.
pub fn order(user: &UserAddress, chain_id: u64, source: Asset, target: Asset) -> Order {
    Order {
        id: OrderId::new(user, chain_id),
        user: user.clone(),
        chain_id,
        source,
        remaining: 1_000_000,
        token_allowance: 0,
        target,
        interval_secs: 3_600,
        purchase_amount: 500_000,
        max_hops: 3,
        max_spread: "0.5".into(),
        last_purchase_at: whole_seconds(Utc::now() - Duration::hours(2)),
        schedule: ScheduleState::Unscheduled,
    }
}

/// Persist `order` after registering its user.
///
/// # Panics
/// Panics on store errors.
pub async fn seed_order(store: &SqliteStore, order: &Order) {
    store.add_user(&order.user).await.expect("add user");
    store.upsert_order(order).await.expect("upsert order");
}

/// The chain's view of an order.
pub fn chain_order(id: u64, source: Asset, amount: Amount, target: Asset, dca_amount: Amount) -> ChainOrder {
    ChainOrder {
        id,
        initial_asset: AssetAmount::new(source, amount),
        target_asset: target,
        interval_secs: 3_600,
        last_purchase: whole_seconds(Utc::now() - Duration::hours(2)),
        dca_amount,
        token_allowance: 0,
    }
}

/// DCA config whitelisting `tokens`, charging `fees` per hop.
pub fn dca_config(tokens: Vec<Asset>, fees: Vec<AssetAmount>) -> DcaConfig {
    DcaConfig {
        max_hops: 3,
        max_spread: "0.5".into(),
        whitelisted_tokens: tokens,
        whitelisted_fee_assets: fees,
        factory_address: Some("terra1factory".into()),
        router_address: Some("terra1router".into()),
    }
}

/// `at` truncated to whole seconds, the precision the chain reports.
pub fn whole_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}
