//! Handler for the `history` command.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::HistoryArgs;
use crate::adapter::inbound::cli::output::{self, format_time};
use crate::domain::{ErrorLogEntry, ExecutionRecord, OrderId};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::outbound::store::{ErrorLogStore, ExecutionStore};

#[derive(Tabled)]
struct ExecutionRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Order")]
    order: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Fee")]
    fee: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&ExecutionRecord> for ExecutionRow {
    fn from(record: &ExecutionRecord) -> Self {
        let fee = record
            .fee_redeem
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let result = if record.success {
            record.tx_ref.clone().unwrap_or_else(|| "ok".into())
        } else {
            format!("failed: {}", record.error.as_deref().unwrap_or("unknown"))
        };
        Self {
            time: format_time(Some(record.created_at)),
            order: record.order_id.to_string(),
            amount: format!("{}{}", record.amount, record.source),
            path: record.path.as_ref().map_or_else(|| "-".into(), ToString::to_string),
            fee: if fee.is_empty() { "-".into() } else { fee },
            result,
        }
    }
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Order")]
    order: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&ErrorLogEntry> for ErrorRow {
    fn from(entry: &ErrorLogEntry) -> Self {
        Self {
            time: format_time(Some(entry.created_at)),
            method: entry.method.clone(),
            order: entry.order_id.as_ref().map_or_else(|| "-".into(), ToString::to_string),
            user: entry.user.as_ref().map_or_else(|| "-".into(), ToString::to_string),
            message: entry.message.clone(),
        }
    }
}

/// Execute the history command.
pub async fn execute(config: &Config, args: &HistoryArgs) -> Result<()> {
    let store = bootstrap::open_store(config)?;

    if args.errors {
        let entries = store.recent_errors(args.limit).await?;
        if output::is_json() {
            output::json_output(json!({ "command": "history.errors", "errors": entries }));
        } else {
            output::table(entries.iter().map(ErrorRow::from).collect(), "No errors logged.");
        }
        return Ok(());
    }

    let order = args.order.as_deref().map(OrderId::from_raw);
    let records = store.executions(order.as_ref(), args.limit).await?;
    if output::is_json() {
        output::json_output(json!({ "command": "history", "executions": records }));
    } else {
        output::table(
            records.iter().map(ExecutionRow::from).collect(),
            "No purchases recorded.",
        );
    }
    Ok(())
}
