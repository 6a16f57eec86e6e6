//! LCD REST client for the DCA contract and the exchange.
//!
//! Queries go through the CosmWasm smart-query endpoint
//! (`/cosmwasm/wasm/v1/contract/{address}/smart/{base64 query}`), which wraps
//! the contract's answer in `{"data": ...}`. Purchases are handed to an
//! external signing relay as `{"contract", "msg"}`; the relay signs,
//! broadcasts and answers with the transaction hash.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use parking_lot::RwLock;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::dto::{
    ConfigResponse, ExecuteMsg, PairsResponse, QueryMsg, SignRequest, SignResponse,
    SimulateResponse, SmartQueryResponse, SwapOperationMsg, UserConfigResponse, UserDcaOrder,
};
use super::settings::{ChainConfig, HttpConfig};
use crate::domain::contract::{ChainOrder, DcaConfig, Pool, UserConfig};
use crate::domain::{Amount, PurchaseRequest, SwapOperation, UserAddress};
use crate::error::{Error, ExecutionError, Result};
use crate::port::outbound::chain::ChainClient;

/// Transaction reference reported for purchases that were only logged.
pub const DRY_RUN_TX: &str = "dry-run";

/// Exchange contract addresses, either configured or learned from the DCA
/// config.
#[derive(Debug, Clone, Default)]
struct ExchangeAddresses {
    factory: Option<String>,
    router: Option<String>,
}

/// [`ChainClient`] over the chain's LCD REST API.
pub struct LcdChainClient {
    http: HttpClient,
    lcd_url: String,
    dca_address: String,
    signer_url: Option<String>,
    dry_run: bool,
    exchange: RwLock<ExchangeAddresses>,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl LcdChainClient {
    #[must_use]
    pub fn from_config(config: &ChainConfig) -> Self {
        let http = build_http(&config.http);
        Self {
            http,
            lcd_url: config.lcd_url.trim_end_matches('/').to_string(),
            dca_address: config.dca_address.clone(),
            signer_url: config.signer_url.clone(),
            dry_run: config.dry_run,
            exchange: RwLock::new(ExchangeAddresses {
                factory: config.factory_address.clone(),
                router: config.router_address.clone(),
            }),
            retry_max_attempts: config.http.retry_max_attempts,
            retry_backoff_ms: config.http.retry_backoff_ms,
        }
    }

    /// Smart-query URL for `msg` against `contract`.
    ///
    /// # Errors
    /// Returns an error if `msg` cannot be serialised.
    pub fn smart_query_url<Q: Serialize>(&self, contract: &str, msg: &Q) -> Result<String> {
        let encoded = URL_SAFE.encode(serde_json::to_vec(msg)?);
        Ok(format!(
            "{}/cosmwasm/wasm/v1/contract/{contract}/smart/{encoded}",
            self.lcd_url
        ))
    }

    async fn smart_query<Q, R>(&self, contract: &str, msg: &Q) -> Result<R>
    where
        Q: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.smart_query_url(contract, msg)?;
        debug!(contract = %contract, url = %url, "Smart query");
        let response: SmartQueryResponse<R> = self.get_with_retry(&url).await?;
        Ok(response.data)
    }

    async fn get_with_retry<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let response = match self.http.get(url).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            let response = response.error_for_status()?;
            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            attempt,
            max_attempts,
            error = %err,
            "LCD request failed, retrying"
        );
        sleep(Duration::from_millis(self.retry_backoff_ms)).await;
    }

    async fn factory_address(&self) -> Result<String> {
        let cached = self.exchange.read().factory.clone();
        if let Some(factory) = cached {
            return Ok(factory);
        }
        self.learn_exchange_addresses().await?;
        let learned = self.exchange.read().factory.clone();
        learned.ok_or_else(|| Error::Parse("DCA config has no factory address".into()))
    }

    async fn router_address(&self) -> Result<String> {
        let cached = self.exchange.read().router.clone();
        if let Some(router) = cached {
            return Ok(router);
        }
        self.learn_exchange_addresses().await?;
        let learned = self.exchange.read().router.clone();
        learned.ok_or_else(|| Error::Parse("DCA config has no router address".into()))
    }

    async fn learn_exchange_addresses(&self) -> Result<()> {
        let config = self.dca_config().await?;
        self.remember_exchange(&config);
        Ok(())
    }

    /// Fill in exchange addresses the configuration left unset.
    fn remember_exchange(&self, config: &DcaConfig) {
        let mut exchange = self.exchange.write();
        if exchange.factory.is_none() {
            exchange.factory.clone_from(&config.factory_address);
        }
        if exchange.router.is_none() {
            exchange.router.clone_from(&config.router_address);
        }
    }
}

fn build_http(config: &HttpConfig) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build HTTP client, using defaults");
            HttpClient::new()
        })
}

#[async_trait]
impl ChainClient for LcdChainClient {
    async fn dca_config(&self) -> Result<DcaConfig> {
        let raw: ConfigResponse = self.smart_query(&self.dca_address, &QueryMsg::Config {}).await?;
        let config = DcaConfig::from(raw);
        self.remember_exchange(&config);
        info!(
            tokens = config.whitelisted_tokens.len(),
            fee_assets = config.whitelisted_fee_assets.len(),
            max_hops = config.max_hops,
            "Fetched DCA config"
        );
        Ok(config)
    }

    async fn list_pools(&self) -> Result<Vec<Pool>> {
        let factory = self.factory_address().await?;
        let raw: PairsResponse = self.smart_query(&factory, &QueryMsg::Pairs {}).await?;
        info!(count = raw.pairs.len(), "Fetched exchange pools");
        Ok(raw.pairs.into_iter().map(Pool::from).collect())
    }

    async fn user_config(&self, user: &UserAddress) -> Result<UserConfig> {
        let msg = QueryMsg::UserConfig {
            user: user.as_str().to_string(),
        };
        let raw: UserConfigResponse = self.smart_query(&self.dca_address, &msg).await?;
        Ok(raw.into())
    }

    async fn user_orders(&self, user: &UserAddress) -> Result<Vec<ChainOrder>> {
        let msg = QueryMsg::UserDcaOrders {
            user: user.as_str().to_string(),
        };
        let raw: Vec<UserDcaOrder> = self.smart_query(&self.dca_address, &msg).await?;
        debug!(user = %user, count = raw.len(), "Fetched user orders");
        raw.into_iter().map(ChainOrder::try_from).collect()
    }

    async fn simulate_route(&self, amount: Amount, operations: &[SwapOperation]) -> Result<Amount> {
        let router = self.router_address().await?;
        let msg = QueryMsg::SimulateSwapOperations {
            offer_amount: amount,
            operations: operations.iter().map(SwapOperationMsg::from).collect(),
        };
        let raw: SimulateResponse = self
            .smart_query(&router, &msg)
            .await
            .map_err(|e| ExecutionError::SimulationFailed(e.to_string()))?;
        Ok(raw.amount)
    }

    async fn submit_purchase(&self, request: &PurchaseRequest) -> Result<String> {
        let msg = ExecuteMsg::from(request);

        if self.dry_run {
            let body = serde_json::to_string(&msg)?;
            info!(
                contract = %self.dca_address,
                user = %request.user,
                order = request.chain_order_id,
                msg = %body,
                "Dry run, purchase not submitted"
            );
            return Ok(DRY_RUN_TX.to_string());
        }

        let Some(signer_url) = self.signer_url.as_deref() else {
            return Err(ExecutionError::SubmissionFailed("no signer configured".into()).into());
        };
        let body = SignRequest {
            contract: &self.dca_address,
            msg: &msg,
        };
        let response = self
            .http
            .post(signer_url)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;
        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;

        info!(
            user = %request.user,
            order = request.chain_order_id,
            hops = request.operations.len(),
            txhash = %signed.txhash,
            "Purchase submitted"
        );
        Ok(signed.txhash)
    }
}
