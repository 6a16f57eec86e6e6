//! Chain port: DCA contract queries, route simulation and purchase submission.

use async_trait::async_trait;

use crate::domain::contract::{ChainOrder, DcaConfig, Pool, UserConfig};
use crate::domain::{Amount, PurchaseRequest, SwapOperation, UserAddress};
use crate::error::Result;

/// Access to the DCA contract and the exchange it trades on.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Global DCA contract configuration.
    async fn dca_config(&self) -> Result<DcaConfig>;

    /// Every pool the exchange factory knows about.
    async fn list_pools(&self) -> Result<Vec<Pool>>;

    async fn user_config(&self, user: &UserAddress) -> Result<UserConfig>;

    async fn user_orders(&self, user: &UserAddress) -> Result<Vec<ChainOrder>>;

    /// Output amount of swapping `amount` along `operations`.
    async fn simulate_route(&self, amount: Amount, operations: &[SwapOperation]) -> Result<Amount>;

    /// Ask the DCA contract to execute one purchase. Returns a transaction
    /// reference.
    async fn submit_purchase(&self, request: &PurchaseRequest) -> Result<String>;
}
