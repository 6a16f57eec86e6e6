//! Persistence ports.
//!
//! Split by concern so services can ask for exactly what they touch; the
//! [`Store`] supertrait bundles them for adapters that provide everything.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Amount, Asset, AssetAmount, AssetCatalog, ErrorLogEntry, ExecutionRecord, FeeSchedule, Hop,
    Order, OrderId, TokenPrice, UserAddress,
};
use crate::error::{Error, Result};

/// Whitelisted assets, hops and the fee schedule.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Whitelist `asset`, keeping it if already present.
    async fn upsert_asset(&self, asset: &Asset) -> Result<()>;

    /// Un-whitelist every asset not in `keep`. Hops and orders referencing
    /// removed assets go with them. Returns the number removed.
    async fn retain_assets(&self, keep: &[Asset]) -> Result<usize>;

    async fn list_assets(&self) -> Result<Vec<Asset>>;

    /// Insert a hop for the pair, or return the existing one unchanged.
    async fn upsert_hop(&self, offer: &Asset, ask: &Asset) -> Result<Hop>;

    /// Delete every hop whose pair key is not in `keep`.
    async fn retain_hops(&self, keep: &[String]) -> Result<usize>;

    /// Hops in ascending id order.
    async fn list_hops(&self) -> Result<Vec<Hop>>;

    async fn replace_fee_schedule(&self, schedule: &FeeSchedule) -> Result<()>;

    async fn fee_schedule(&self) -> Result<FeeSchedule>;

    /// Snapshot of assets and hops as an [`AssetCatalog`].
    async fn load_catalog(&self) -> Result<AssetCatalog> {
        let assets = self.list_assets().await?;
        let hops = self.list_hops().await?;
        AssetCatalog::from_parts(assets, hops).map_err(Error::from)
    }
}

/// DCA orders and their scheduling columns.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order or refresh its upstream fields. Scheduling columns of
    /// an existing order are left alone unless the remaining amount drops.
    async fn upsert_order(&self, order: &Order) -> Result<()>;

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>>;

    /// All orders, or only `user`'s.
    async fn list_orders(&self, user: Option<&UserAddress>) -> Result<Vec<Order>>;

    /// Orders that are unscheduled or armed for a time at or before `now`.
    async fn orders_needing_arming(&self, now: DateTime<Utc>) -> Result<Vec<Order>>;

    /// Orders armed for a time after `now`.
    async fn armed_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>>;

    /// Arm `id` for `next_run_at` if it still has `last_purchase_at` and is
    /// not armed for a time after `now`. Returns whether the row changed.
    async fn arm_order(
        &self,
        id: &OrderId,
        last_purchase_at: DateTime<Utc>,
        now: DateTime<Utc>,
        next_run_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Subtract `amount` from the remaining source amount and stamp the
    /// purchase time. An order that reaches zero is deleted.
    async fn record_consumption(&self, id: &OrderId, amount: Amount, at: DateTime<Utc>) -> Result<()>;

    /// Delete `user`'s orders not in `keep`.
    async fn retain_orders(&self, user: &UserAddress, keep: &[OrderId]) -> Result<usize>;

    async fn delete_order(&self, id: &OrderId) -> Result<bool>;
}

/// Per-user fee (tip) balances.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Replace `user`'s balances, keeping the given priority order.
    async fn replace_fee_balances(&self, user: &UserAddress, balances: &[AssetAmount]) -> Result<()>;

    /// Balances in priority order.
    async fn fee_balances(&self, user: &UserAddress) -> Result<Vec<AssetAmount>>;
}

/// Purchase history.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn record_execution(&self, record: &ExecutionRecord) -> Result<()>;

    /// Newest first.
    async fn executions(&self, order: Option<&OrderId>, limit: usize) -> Result<Vec<ExecutionRecord>>;
}

/// Persisted USD prices.
#[async_trait]
pub trait PriceStore: Send + Sync {
    async fn upsert_price(&self, price: &TokenPrice) -> Result<()>;

    async fn price(&self, asset: &Asset) -> Result<Option<TokenPrice>>;

    async fn list_prices(&self) -> Result<Vec<TokenPrice>>;
}

/// Users the bot serves.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns false if the user already existed.
    async fn add_user(&self, user: &UserAddress) -> Result<bool>;

    async fn list_users(&self) -> Result<Vec<UserAddress>>;

    /// Removes the user with their orders, balances and error log.
    async fn remove_user(&self, user: &UserAddress) -> Result<bool>;
}

/// Operator-facing failure log.
#[async_trait]
pub trait ErrorLogStore: Send + Sync {
    async fn log_error(&self, entry: &ErrorLogEntry) -> Result<()>;

    /// Newest first.
    async fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorLogEntry>>;
}

/// Every persistence concern in one object.
pub trait Store:
    CatalogStore + OrderStore + BalanceStore + ExecutionStore + PriceStore + UserStore + ErrorLogStore
{
}

impl<T> Store for T where
    T: CatalogStore
        + OrderStore
        + BalanceStore
        + ExecutionStore
        + PriceStore
        + UserStore
        + ErrorLogStore
{
}
