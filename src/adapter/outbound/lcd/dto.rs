//! Wire types for the DCA contract, the exchange contracts and the signing
//! relay.
//!
//! Query and execute messages are externally tagged snake_case enums, the
//! shape CosmWasm contracts expect:
//!
//! ```json
//! {"user_dca_orders":{"user":"terra1..."}}
//! {"perform_dca_purchase":{"user":"terra1...","id":3,"hops":[...],"fee_redeem":[...]}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::asset::amount_string;
use crate::domain::contract::{ChainOrder, DcaConfig, Pool, UserConfig};
use crate::domain::{Amount, Asset, AssetAmount, PurchaseRequest, SwapOperation};
use crate::error::Error;

/// Smart queries understood by the DCA, factory and router contracts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Config {},
    Pairs {},
    UserConfig {
        user: String,
    },
    UserDcaOrders {
        user: String,
    },
    SimulateSwapOperations {
        #[serde(with = "amount_string")]
        offer_amount: Amount,
        operations: Vec<SwapOperationMsg>,
    },
}

/// One swap on the exchange router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapOperationMsg {
    AstroSwap {
        offer_asset_info: Asset,
        ask_asset_info: Asset,
    },
}

impl From<&SwapOperation> for SwapOperationMsg {
    fn from(op: &SwapOperation) -> Self {
        Self::AstroSwap {
            offer_asset_info: op.offer.clone(),
            ask_asset_info: op.ask.clone(),
        }
    }
}

/// Execute messages sent to the DCA contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    PerformDcaPurchase {
        user: String,
        id: u64,
        hops: Vec<SwapOperationMsg>,
        fee_redeem: Vec<AssetAmount>,
    },
}

impl From<&PurchaseRequest> for ExecuteMsg {
    fn from(request: &PurchaseRequest) -> Self {
        Self::PerformDcaPurchase {
            user: request.user.as_str().to_string(),
            id: request.chain_order_id,
            hops: request.operations.iter().map(SwapOperationMsg::from).collect(),
            fee_redeem: request.fee_redeem.clone(),
        }
    }
}

/// Envelope of every LCD smart query response.
#[derive(Debug, Deserialize)]
pub struct SmartQueryResponse<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ConfigResponse {
    pub max_hops: u32,
    pub max_spread: String,
    #[serde(default)]
    pub whitelisted_tokens: Vec<Asset>,
    #[serde(default)]
    pub whitelisted_fee_assets: Vec<AssetAmount>,
    #[serde(default)]
    pub factory_addr: Option<String>,
    #[serde(default)]
    pub router_addr: Option<String>,
}

impl From<ConfigResponse> for DcaConfig {
    fn from(raw: ConfigResponse) -> Self {
        Self {
            max_hops: raw.max_hops,
            max_spread: raw.max_spread,
            whitelisted_tokens: raw.whitelisted_tokens,
            whitelisted_fee_assets: raw.whitelisted_fee_assets,
            factory_address: raw.factory_addr,
            router_address: raw.router_addr,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PairsResponse {
    pub pairs: Vec<PairInfo>,
}

#[derive(Debug, Deserialize)]
pub struct PairInfo {
    pub asset_infos: [Asset; 2],
}

impl From<PairInfo> for Pool {
    fn from(pair: PairInfo) -> Self {
        Self {
            assets: pair.asset_infos,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserConfigResponse {
    #[serde(default)]
    pub max_hops: Option<u32>,
    #[serde(default)]
    pub max_spread: Option<String>,
    #[serde(default)]
    pub tip_balance: Vec<AssetAmount>,
}

impl From<UserConfigResponse> for UserConfig {
    fn from(raw: UserConfigResponse) -> Self {
        Self {
            max_hops: raw.max_hops,
            max_spread: raw.max_spread,
            tip_balance: raw.tip_balance,
        }
    }
}

/// One entry of the `user_dca_orders` response.
#[derive(Debug, Deserialize)]
pub struct UserDcaOrder {
    #[serde(with = "amount_string")]
    pub token_allowance: Amount,
    pub order: DcaOrder,
}

#[derive(Debug, Deserialize)]
pub struct DcaOrder {
    pub id: u64,
    pub initial_asset: AssetAmount,
    pub target_asset: Asset,
    pub interval: u64,
    /// Unix seconds.
    pub last_purchase: u64,
    #[serde(with = "amount_string")]
    pub dca_amount: Amount,
}

impl TryFrom<UserDcaOrder> for ChainOrder {
    type Error = Error;

    fn try_from(raw: UserDcaOrder) -> Result<Self, Self::Error> {
        let last_purchase = i64::try_from(raw.order.last_purchase)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| {
                Error::Parse(format!(
                    "order {} has out of range last_purchase {}",
                    raw.order.id, raw.order.last_purchase
                ))
            })?;
        Ok(Self {
            id: raw.order.id,
            initial_asset: raw.order.initial_asset,
            target_asset: raw.order.target_asset,
            interval_secs: raw.order.interval,
            last_purchase,
            dca_amount: raw.order.dca_amount,
            token_allowance: raw.token_allowance,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SimulateResponse {
    #[serde(with = "amount_string")]
    pub amount: Amount,
}

/// Body posted to the signing relay.
#[derive(Debug, Serialize)]
pub struct SignRequest<'a> {
    pub contract: &'a str,
    pub msg: &'a ExecuteMsg,
}

#[derive(Debug, Deserialize)]
pub struct SignResponse {
    pub txhash: String,
}
