//! Route selection for a single purchase.
//!
//! Candidates come from the path index in its stable order. Each one must
//! first be affordable from the user's tip balance; the survivors are then
//! simulated on chain and ranked by net USD value:
//!
//! ```text
//! value = price(target) * simulated_output - sum(price(fee asset) * fee amount)
//! ```
//!
//! A lone affordable candidate is taken without simulating. Ties keep the
//! earlier candidate.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::index::PathIndexHandle;
use crate::domain::price::usd_value;
use crate::domain::{
    build_fee_redeem, Amount, Asset, AssetAmount, Path, RouteChoice, SwapOperation, UserAddress,
};
use crate::error::{ExecutionError, Result, RouteError};
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::oracle::PriceOracle;
use crate::port::outbound::store::Store;

struct Candidate {
    path: Path,
    operations: Vec<SwapOperation>,
    fee_redeem: Vec<AssetAmount>,
}

impl Candidate {
    fn into_choice(self, execution_value: Option<Decimal>) -> RouteChoice {
        RouteChoice {
            path: self.path,
            operations: self.operations,
            fee_redeem: self.fee_redeem,
            execution_value,
        }
    }
}

/// Picks the best route for a purchase.
pub struct ExecutionSelector {
    index: Arc<PathIndexHandle>,
    store: Arc<dyn Store>,
    chain: Arc<dyn ChainClient>,
    oracle: Arc<dyn PriceOracle>,
}

impl ExecutionSelector {
    pub fn new(
        index: Arc<PathIndexHandle>,
        store: Arc<dyn Store>,
        chain: Arc<dyn ChainClient>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Self {
        Self {
            index,
            store,
            chain,
            oracle,
        }
    }

    /// Choose the route for selling `amount` of `source` for `target`.
    ///
    /// # Errors
    /// [`RouteError::NoRouteAvailable`] when no path of at most `max_hops`
    /// exists, [`RouteError::NoAffordableRoute`] when the user's tip balance
    /// covers none of them, [`RouteError::NoValidRoute`] when every
    /// affordable candidate failed to simulate or price. Store failures are
    /// propagated as-is.
    pub async fn choose_best_route(
        &self,
        user: &UserAddress,
        source: &Asset,
        amount: Amount,
        target: &Asset,
        max_hops: usize,
    ) -> Result<RouteChoice> {
        let snapshot = self.index.snapshot();
        let paths = snapshot.index.find_paths(source, target, max_hops);
        if paths.is_empty() {
            return Err(RouteError::NoRouteAvailable {
                start: source.id().to_string(),
                target: target.id().to_string(),
                max_hops,
            }
            .into());
        }

        let balances = self.store.fee_balances(user).await?;
        let schedule = self.store.fee_schedule().await?;
        let candidates = paths.len();

        let mut affordable = Vec::with_capacity(candidates);
        for path in paths {
            let operations = match snapshot.catalog.resolve(&path, source) {
                Ok(operations) => operations,
                Err(e) => {
                    warn!(path = %path, error = %e, "Dropping unresolvable route");
                    continue;
                }
            };
            match build_fee_redeem(&balances, &schedule, path.len()) {
                Ok(fee_redeem) => affordable.push(Candidate {
                    path,
                    operations,
                    fee_redeem,
                }),
                Err(e) => debug!(user = %user, path = %path, error = %e, "Route not affordable"),
            }
        }

        if affordable.is_empty() {
            return Err(RouteError::NoAffordableRoute { candidates }.into());
        }
        if affordable.len() == 1 {
            let only = affordable.remove(0);
            debug!(user = %user, path = %only.path, "Single affordable route");
            return Ok(only.into_choice(None));
        }

        let survivors = affordable.len();
        let mut best: Option<(Candidate, Decimal)> = None;
        for candidate in affordable {
            let value = match self.execution_value(amount, target, &candidate).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %candidate.path, error = %e, "Excluding route");
                    continue;
                }
            };
            debug!(path = %candidate.path, value = %value, "Route valued");
            let better = best.as_ref().map_or(true, |(_, top)| value > *top);
            if better {
                best = Some((candidate, value));
            }
        }

        let (winner, value) = best.ok_or(RouteError::NoValidRoute {
            candidates: survivors,
        })?;
        info!(
            user = %user,
            path = %winner.path,
            value = %value,
            candidates = survivors,
            "Route selected"
        );
        Ok(winner.into_choice(Some(value)))
    }

    async fn execution_value(&self, amount: Amount, target: &Asset, candidate: &Candidate) -> Result<Decimal> {
        let output = self.chain.simulate_route(amount, &candidate.operations).await?;
        let mut value = self.usd(target, output).await?;
        for leg in &candidate.fee_redeem {
            let fee = self.usd(&leg.asset, leg.amount).await?;
            value = value
                .checked_sub(fee)
                .ok_or_else(|| unpriceable(&leg.asset))?;
        }
        Ok(value)
    }

    async fn usd(&self, asset: &Asset, amount: Amount) -> Result<Decimal> {
        let unit_price = self.oracle.unit_price_usd(asset).await?;
        usd_value(amount, unit_price).ok_or_else(|| unpriceable(asset).into())
    }
}

fn unpriceable(asset: &Asset) -> ExecutionError {
    ExecutionError::PricingUnavailable {
        asset: asset.id().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeeSchedule;
    use crate::error::Error;
    use crate::port::outbound::store::CatalogStore;
    use crate::testkit::domain::{astro, memory_store, seed_catalog, seed_fees, user, uluna, uusd};
    use crate::testkit::{FakeChain, FixedPriceOracle};
    use rust_decimal_macros::dec;

    struct Fixture {
        chain: Arc<FakeChain>,
        selector: ExecutionSelector,
    }

    fn op(offer: Asset, ask: Asset) -> SwapOperation {
        SwapOperation { offer, ask }
    }

    /// uusd-uluna (1), uluna-astro (2), uusd-astro (3): uusd reaches astro
    /// via uluna (`<1><2>`) or directly (`<3>`).
    async fn fixture(balance: Amount, oracle: FixedPriceOracle) -> Fixture {
        let store = memory_store();
        seed_catalog(
            &store,
            &[uusd(), uluna(), astro()],
            &[(uusd(), uluna()), (uluna(), astro()), (uusd(), astro())],
        )
        .await;
        seed_fees(
            &store,
            &user("terra1user"),
            &FeeSchedule::new().with_fee(uusd(), 100),
            &[AssetAmount::new(uusd(), balance)],
        )
        .await;

        let catalog = store.load_catalog().await.unwrap();
        let index = Arc::new(PathIndexHandle::from_catalog(catalog, 3));
        let chain = Arc::new(FakeChain::new());
        let selector = ExecutionSelector::new(
            index,
            store.clone() as Arc<dyn Store>,
            chain.clone() as Arc<dyn ChainClient>,
            Arc::new(oracle),
        );
        Fixture { chain, selector }
    }

    fn prices() -> FixedPriceOracle {
        FixedPriceOracle::new()
            .with(astro(), dec!(0.01))
            .with(uusd(), dec!(0.000001))
    }

    fn via_luna() -> Vec<SwapOperation> {
        vec![op(uusd(), uluna()), op(uluna(), astro())]
    }

    fn direct() -> Vec<SwapOperation> {
        vec![op(uusd(), astro())]
    }

    // ---- candidate generation ----

    #[tokio::test]
    async fn no_path_is_no_route_available() {
        let f = fixture(1_000, prices()).await;
        let err = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 100, &Asset::native("ukrw"), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Route(RouteError::NoRouteAvailable { .. })));
    }

    #[tokio::test]
    async fn empty_tip_balance_is_no_affordable_route() {
        let f = fixture(50, prices()).await;
        let err = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 100, &astro(), 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Route(RouteError::NoAffordableRoute { candidates: 2 })
        ));
    }

    #[tokio::test]
    async fn single_affordable_route_skips_simulation() {
        // 100 covers one hop: only the direct route is affordable.
        let f = fixture(150, prices()).await;
        let choice = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 100, &astro(), 3)
            .await
            .unwrap();

        assert_eq!(choice.path.encode(), "<3>");
        assert_eq!(choice.operations, direct());
        assert_eq!(choice.fee_redeem, vec![AssetAmount::new(uusd(), 100)]);
        assert_eq!(choice.execution_value, None);
        assert_eq!(f.chain.simulation_calls(), 0);
    }

    #[tokio::test]
    async fn max_hops_limits_candidates() {
        let f = fixture(1_000, prices()).await;
        let choice = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 100, &astro(), 1)
            .await
            .unwrap();
        assert_eq!(choice.path.encode(), "<3>");
        assert_eq!(f.chain.simulation_calls(), 0);
    }

    // ---- ranking ----

    #[tokio::test]
    async fn picks_highest_net_value() {
        let f = fixture(1_000, prices()).await;
        // via uluna: 150 * 0.01 - 200 * 1e-6 ; direct: 100 * 0.01 - 100 * 1e-6
        f.chain.simulate(via_luna(), 150);
        f.chain.simulate(direct(), 100);

        let choice = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 1_000, &astro(), 3)
            .await
            .unwrap();

        assert_eq!(choice.path.encode(), "<1><2>");
        assert_eq!(choice.execution_value, Some(dec!(1.4998)));
        assert_eq!(choice.fee_redeem, vec![AssetAmount::new(uusd(), 200)]);
    }

    #[tokio::test]
    async fn fee_cost_can_outweigh_output() {
        let oracle = FixedPriceOracle::new()
            .with(astro(), dec!(0.01))
            .with(uusd(), dec!(0.01));
        let f = fixture(1_000, oracle).await;
        // via uluna: 1.05 - 2.00 ; direct: 1.00 - 1.00
        f.chain.simulate(via_luna(), 105);
        f.chain.simulate(direct(), 100);

        let choice = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 1_000, &astro(), 3)
            .await
            .unwrap();
        assert_eq!(choice.path.encode(), "<3>");
        assert_eq!(choice.execution_value, Some(dec!(0)));
    }

    #[tokio::test]
    async fn equal_values_keep_earlier_candidate() {
        let oracle = FixedPriceOracle::new()
            .with(astro(), dec!(1))
            .with(uusd(), dec!(0));
        let f = fixture(1_000, oracle).await;
        f.chain.simulate(via_luna(), 100);
        f.chain.simulate(direct(), 100);

        let choice = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 1_000, &astro(), 3)
            .await
            .unwrap();
        assert_eq!(choice.path.encode(), "<1><2>");
    }

    // ---- per-candidate failures ----

    #[tokio::test]
    async fn failed_simulation_excludes_only_that_candidate() {
        let f = fixture(1_000, prices()).await;
        f.chain.fail_simulation(via_luna(), "pool drained");
        f.chain.simulate(direct(), 100);

        let choice = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 1_000, &astro(), 3)
            .await
            .unwrap();
        assert_eq!(choice.path.encode(), "<3>");
        assert_eq!(f.chain.simulation_calls(), 2);
    }

    #[tokio::test]
    async fn all_candidates_failing_is_no_valid_route() {
        let f = fixture(1_000, prices()).await;
        f.chain.fail_simulation(via_luna(), "pool drained");
        // direct route has no scripted simulation

        let err = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 1_000, &astro(), 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Route(RouteError::NoValidRoute { candidates: 2 })
        ));
    }

    #[tokio::test]
    async fn missing_price_excludes_candidates() {
        let oracle = FixedPriceOracle::new().with(uusd(), dec!(0.000001));
        let f = fixture(1_000, oracle).await;
        f.chain.simulate(via_luna(), 150);
        f.chain.simulate(direct(), 100);

        let err = f
            .selector
            .choose_best_route(&user("terra1user"), &uusd(), 1_000, &astro(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Route(RouteError::NoValidRoute { .. })));
    }
}
