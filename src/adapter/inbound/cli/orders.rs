//! Handler for the `orders` command.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::OrdersArgs;
use crate::adapter::inbound::cli::output::{self, format_time};
use crate::domain::{Order, UserAddress};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::outbound::store::OrderStore;

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Order")]
    id: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Per Purchase")]
    per_purchase: String,
    #[tabled(rename = "Every")]
    interval: String,
    #[tabled(rename = "Last Purchase")]
    last_purchase: String,
    #[tabled(rename = "Next Run")]
    next_run: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            source: order.source.to_string(),
            target: order.target.to_string(),
            remaining: order.remaining.to_string(),
            per_purchase: order.purchase_amount.to_string(),
            interval: format!("{}s", order.interval_secs),
            last_purchase: format_time(Some(order.last_purchase_at)),
            next_run: format_time(order.due_at()),
        }
    }
}

/// Execute the orders command.
pub async fn execute(config: &Config, args: &OrdersArgs) -> Result<()> {
    let store = bootstrap::open_store(config)?;
    let user = args.user.as_deref().map(UserAddress::new);
    let orders = store.list_orders(user.as_ref()).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "orders",
            "orders": orders,
        }));
        return Ok(());
    }

    output::table(
        orders.iter().map(OrderRow::from).collect(),
        "No orders. Register users with `dcabot user add` and run `dcabot sync`.",
    );
    Ok(())
}
