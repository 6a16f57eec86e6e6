//! Handlers for the `prices` command group.

use chrono::Utc;
use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::PriceSetArgs;
use crate::adapter::inbound::cli::output::{self, format_time};
use crate::domain::{DomainError, TokenPrice};
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::outbound::store::{CatalogStore, PriceStore};

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "USD")]
    price_usd: String,
    #[tabled(rename = "Units/Token")]
    conversion: u64,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

/// List stored prices.
pub async fn list(config: &Config) -> Result<()> {
    let store = bootstrap::open_store(config)?;
    let prices = store.list_prices().await?;

    if output::is_json() {
        output::json_output(json!({ "command": "prices.list", "prices": prices }));
        return Ok(());
    }

    let rows = prices
        .iter()
        .map(|p| PriceRow {
            asset: p.asset.to_string(),
            price_usd: p.price_usd.to_string(),
            conversion: p.conversion,
            updated_at: format_time(Some(p.updated_at)),
        })
        .collect();
    output::table(rows, "No prices stored.");
    Ok(())
}

/// Store the price of one whitelisted asset.
pub async fn set(config: &Config, args: &PriceSetArgs) -> Result<()> {
    if args.conversion == 0 {
        return Err(ConfigError::InvalidValue {
            field: "conversion",
            reason: "must be greater than 0".to_string(),
        }
        .into());
    }
    if args.price_usd.is_sign_negative() {
        return Err(ConfigError::InvalidValue {
            field: "price_usd",
            reason: "must not be negative".to_string(),
        }
        .into());
    }

    let store = bootstrap::open_store(config)?;
    let asset = store
        .list_assets()
        .await?
        .into_iter()
        .find(|a| a.id() == args.asset)
        .ok_or_else(|| DomainError::AssetNotWhitelisted {
            asset: args.asset.clone(),
        })?;

    let price = TokenPrice {
        asset,
        price_usd: args.price_usd,
        conversion: args.conversion,
        updated_at: Utc::now(),
    };
    store.upsert_price(&price).await?;

    if output::is_json() {
        output::json_output(json!({ "command": "prices.set", "price": price }));
    } else {
        output::success(&format!("{} = ${}", price.asset, price.price_usd));
    }
    Ok(())
}
