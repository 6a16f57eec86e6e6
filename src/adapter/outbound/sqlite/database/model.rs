//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{
    assets, error_log, execution_records, fee_assets, fee_balances, hops, orders, token_prices,
    users,
};

/// Database row for a user.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub address: String,
    pub created_at: String,
}

/// Database row for a whitelisted asset.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetRow {
    pub id: String,
    pub class: String,
}

/// Database row for a hop.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = hops)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HopRow {
    pub id: i32,
    pub pair_key: String,
    pub offer_id: String,
    pub ask_id: String,
}

/// Database row for a hop (insertable; the id is assigned by SQLite).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = hops)]
pub struct NewHopRow {
    pub pair_key: String,
    pub offer_id: String,
    pub ask_id: String,
}

/// Database row for a fee asset.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = fee_assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeeAssetRow {
    pub asset_id: String,
    pub class: String,
    pub fee_per_hop: String,
}

/// Database row for a user's fee balance.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = fee_balances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeeBalanceRow {
    pub user_address: String,
    pub asset_id: String,
    pub class: String,
    pub amount: String,
    pub position: i32,
}

/// Database row for an order.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderRow {
    pub id: String,
    pub user_address: String,
    pub chain_id: i64,
    pub source_id: String,
    pub source_class: String,
    pub remaining: String,
    pub token_allowance: String,
    pub target_id: String,
    pub target_class: String,
    pub interval_secs: i64,
    pub purchase_amount: String,
    pub max_hops: i32,
    pub max_spread: String,
    pub last_purchase_at: String,
    pub scheduled: i32,
    pub next_run_at: Option<String>,
}

/// Upstream fields of an order, refreshed on every user sync.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = orders)]
pub struct OrderUpstreamChangeset {
    pub source_id: String,
    pub source_class: String,
    pub remaining: String,
    pub token_allowance: String,
    pub target_id: String,
    pub target_class: String,
    pub interval_secs: i64,
    pub purchase_amount: String,
    pub max_hops: i32,
    pub max_spread: String,
    pub last_purchase_at: String,
}

/// Database row for an execution record (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = execution_records)]
pub struct NewExecutionRow {
    pub order_id: String,
    pub created_at: String,
    pub source_id: String,
    pub source_class: String,
    pub target_id: String,
    pub target_class: String,
    pub amount: String,
    pub remaining_before: String,
    pub path: Option<String>,
    pub fee_redeem: String,
    pub success: i32,
    pub error: Option<String>,
    pub tx_ref: Option<String>,
}

/// Database row for an execution record (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = execution_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExecutionRow {
    pub id: i32,
    pub order_id: String,
    pub created_at: String,
    pub source_id: String,
    pub source_class: String,
    pub target_id: String,
    pub target_class: String,
    pub amount: String,
    pub remaining_before: String,
    pub path: Option<String>,
    pub fee_redeem: String,
    pub success: i32,
    pub error: Option<String>,
    pub tx_ref: Option<String>,
}

/// Database row for a token price.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = token_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TokenPriceRow {
    pub asset_id: String,
    pub class: String,
    pub price_usd: String,
    pub conversion: i64,
    pub updated_at: String,
}

/// Database row for an error log entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = error_log)]
pub struct NewErrorLogRow {
    pub created_at: String,
    pub order_id: Option<String>,
    pub user_address: Option<String>,
    pub method: String,
    pub message: String,
}

/// Database row for an error log entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = error_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ErrorLogRow {
    pub id: i32,
    pub created_at: String,
    pub order_id: Option<String>,
    pub user_address: Option<String>,
    pub method: String,
    pub message: String,
}
