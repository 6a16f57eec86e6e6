use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use dcabot::domain::contract::UserConfig;
use dcabot::domain::{Amount, AssetAmount, TokenPrice, UserAddress};
use dcabot::port::PriceStore;
use dcabot::testkit::domain::{astro, dca_config, uluna, uusd};
use dcabot::testkit::FakeChain;

pub fn alice() -> UserAddress {
    UserAddress::new("terra1alice")
}

pub fn bob() -> UserAddress {
    UserAddress::new("terra1bob")
}

/// Three whitelisted assets, a fee of 100uusd per hop, and a pool between
/// every pair: uusd/uluna, uluna/astro, uusd/astro.
pub fn market() -> Arc<FakeChain> {
    let chain = Arc::new(FakeChain::new());
    chain.set_config(dca_config(
        vec![uusd(), uluna(), astro()],
        vec![AssetAmount::new(uusd(), 100)],
    ));
    chain.set_pools(&[(uusd(), uluna()), (uluna(), astro()), (uusd(), astro())]);
    chain
}

/// Give `user` a uusd tip balance on chain.
pub fn fund(chain: &FakeChain, user: &UserAddress, tip: Amount) {
    chain.set_user_config(
        user,
        UserConfig {
            tip_balance: vec![AssetAmount::new(uusd(), tip)],
            ..UserConfig::default()
        },
    );
}

/// Every asset at one dollar per smallest unit.
pub async fn seed_prices(store: &dyn PriceStore) {
    for asset in [uusd(), uluna(), astro()] {
        store
            .upsert_price(&TokenPrice {
                asset,
                price_usd: Decimal::ONE,
                conversion: 1,
                updated_at: Utc::now(),
            })
            .await
            .expect("seed price");
    }
}
