//! Views of the DCA contract and exchange state, as read from the chain.

use chrono::{DateTime, Utc};

use super::asset::{Amount, Asset, AssetAmount};

/// Global DCA contract configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcaConfig {
    pub max_hops: u32,
    pub max_spread: String,
    pub whitelisted_tokens: Vec<Asset>,
    /// Each entry's amount is the fee charged per hop in that asset.
    pub whitelisted_fee_assets: Vec<AssetAmount>,
    pub factory_address: Option<String>,
    pub router_address: Option<String>,
}

/// A user's settings on the DCA contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserConfig {
    pub max_hops: Option<u32>,
    pub max_spread: Option<String>,
    /// Fee balances in the user's priority order.
    pub tip_balance: Vec<AssetAmount>,
}

/// An order as stored on the DCA contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOrder {
    pub id: u64,
    pub initial_asset: AssetAmount,
    pub target_asset: Asset,
    pub interval_secs: u64,
    pub last_purchase: DateTime<Utc>,
    pub dca_amount: Amount,
    pub token_allowance: Amount,
}

/// A liquidity pool on the exchange; the two assets it trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub assets: [Asset; 2],
}
