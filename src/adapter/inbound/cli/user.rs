//! Handlers for the `user` command group.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::UserAddArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::UserAddress;
use crate::error::Result;
use crate::infrastructure::bootstrap::{self, Services};
use crate::infrastructure::config::Config;
use crate::port::outbound::store::{OrderStore, UserStore};

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Orders")]
    orders: usize,
}

/// Register a user, then pull their tip balance and orders from the chain.
pub async fn add(config: &Config, args: &UserAddArgs) -> Result<()> {
    let user = UserAddress::new(args.address.trim());
    let services = Services::build(config).await?;
    let added = services.store.add_user(&user).await?;

    let report = if args.no_sync {
        None
    } else {
        Some(services.synchronizer.sync_user(&user).await?)
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "user.add",
            "user": user,
            "added": added,
            "sync": report,
        }));
        return Ok(());
    }

    if added {
        output::success(&format!("Added {user}"));
    } else {
        output::note(&format!("{user} was already registered"));
    }
    if let Some(report) = report {
        output::success(&format!(
            "Synced {} orders ({} skipped)",
            report.orders, report.skipped
        ));
    }
    Ok(())
}

/// List registered users with their order counts.
pub async fn list(config: &Config) -> Result<()> {
    let store = bootstrap::open_store(config)?;
    let users = store.list_users().await?;

    let mut rows = Vec::with_capacity(users.len());
    for user in &users {
        let orders = store.list_orders(Some(user)).await?.len();
        rows.push(UserRow {
            address: user.to_string(),
            orders,
        });
    }

    if output::is_json() {
        output::json_output(json!({
            "command": "user.list",
            "users": rows.iter().map(|r| json!({ "address": r.address, "orders": r.orders })).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::table(rows, "No users registered. Add one with `dcabot user add <address>`.");
    Ok(())
}

/// Forget a user. Their orders, balances and history go with them.
pub async fn remove(config: &Config, address: &str) -> Result<()> {
    let user = UserAddress::new(address.trim());
    let store = bootstrap::open_store(config)?;
    let removed = store.remove_user(&user).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "user.remove",
            "user": user,
            "removed": removed,
        }));
    } else if removed {
        output::success(&format!("Removed {user}"));
    } else {
        output::warning(&format!("{user} is not registered"));
    }
    Ok(())
}
