//! Scripted [`ChainClient`] for tests.
//!
//! Every answer is set up front; submissions are recorded so tests can
//! assert on what would have been sent to the contract.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::contract::{ChainOrder, DcaConfig, Pool, UserConfig};
use crate::domain::{Amount, Asset, PurchaseRequest, SwapOperation, UserAddress};
use crate::error::{Error, ExecutionError, Result};
use crate::port::outbound::chain::ChainClient;

#[derive(Default)]
struct State {
    config: Option<DcaConfig>,
    pools: Vec<Pool>,
    user_configs: HashMap<UserAddress, UserConfig>,
    user_orders: HashMap<UserAddress, Vec<ChainOrder>>,
    unreachable_users: HashSet<UserAddress>,
    simulations: HashMap<Vec<SwapOperation>, std::result::Result<Amount, String>>,
    simulation_calls: usize,
    submit_failure: Option<String>,
    submissions: Vec<PurchaseRequest>,
}

/// In-memory chain with scripted answers.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<State>,
}

impl FakeChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&self, config: DcaConfig) {
        self.state.lock().config = Some(config);
    }

    /// Pools listed by the factory, one per asset pair.
    pub fn set_pools(&self, pairs: &[(Asset, Asset)]) {
        self.state.lock().pools = pairs
            .iter()
            .map(|(a, b)| Pool {
                assets: [a.clone(), b.clone()],
            })
            .collect();
    }

    pub fn set_user_config(&self, user: &UserAddress, config: UserConfig) {
        self.state.lock().user_configs.insert(user.clone(), config);
    }

    pub fn set_user_orders(&self, user: &UserAddress, orders: Vec<ChainOrder>) {
        self.state.lock().user_orders.insert(user.clone(), orders);
    }

    /// Make every query about `user` fail.
    pub fn make_unreachable(&self, user: &UserAddress) {
        self.state.lock().unreachable_users.insert(user.clone());
    }

    /// Simulating `operations` yields `output`.
    pub fn simulate(&self, operations: Vec<SwapOperation>, output: Amount) {
        self.state.lock().simulations.insert(operations, Ok(output));
    }

    pub fn fail_simulation(&self, operations: Vec<SwapOperation>, reason: &str) {
        self.state
            .lock()
            .simulations
            .insert(operations, Err(reason.to_string()));
    }

    pub fn fail_submissions(&self, reason: &str) {
        self.state.lock().submit_failure = Some(reason.to_string());
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<PurchaseRequest> {
        self.state.lock().submissions.clone()
    }

    #[must_use]
    pub fn simulation_calls(&self) -> usize {
        self.state.lock().simulation_calls
    }

    fn check_reachable(&self, user: &UserAddress) -> Result<()> {
        if self.state.lock().unreachable_users.contains(user) {
            return Err(Error::Connection(format!("user {user} unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn dca_config(&self) -> Result<DcaConfig> {
        self.state
            .lock()
            .config
            .clone()
            .ok_or_else(|| Error::Connection("no DCA config scripted".into()))
    }

    async fn list_pools(&self) -> Result<Vec<Pool>> {
        Ok(self.state.lock().pools.clone())
    }

    async fn user_config(&self, user: &UserAddress) -> Result<UserConfig> {
        self.check_reachable(user)?;
        Ok(self
            .state
            .lock()
            .user_configs
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn user_orders(&self, user: &UserAddress) -> Result<Vec<ChainOrder>> {
        self.check_reachable(user)?;
        Ok(self
            .state
            .lock()
            .user_orders
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn simulate_route(&self, _amount: Amount, operations: &[SwapOperation]) -> Result<Amount> {
        let mut state = self.state.lock();
        state.simulation_calls += 1;
        match state.simulations.get(operations) {
            Some(Ok(output)) => Ok(*output),
            Some(Err(reason)) => Err(ExecutionError::SimulationFailed(reason.clone()).into()),
            None => Err(ExecutionError::SimulationFailed("no simulation scripted".into()).into()),
        }
    }

    async fn submit_purchase(&self, request: &PurchaseRequest) -> Result<String> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.submit_failure {
            return Err(ExecutionError::SubmissionFailed(reason.clone()).into());
        }
        state.submissions.push(request.clone());
        Ok(format!("tx-{}", state.submissions.len()))
    }
}
