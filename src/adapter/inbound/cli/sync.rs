//! Handler for the `sync` command.

use serde_json::json;

use crate::adapter::inbound::cli::command::SyncArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::UserAddress;
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::infrastructure::config::Config;

/// Execute the sync command.
pub async fn execute(config: &Config, args: &SyncArgs) -> Result<()> {
    let services = Services::build(config).await?;
    let synchronizer = &services.synchronizer;

    if let Some(address) = &args.user {
        let user = UserAddress::new(address.as_str());
        let report = synchronizer.sync_user(&user).await?;
        if output::is_json() {
            output::json_output(json!({
                "command": "sync",
                "user": user,
                "report": report,
            }));
        } else {
            output::success(&format!(
                "{user}: {} orders, {} skipped, {} removed",
                report.orders, report.skipped, report.orders_removed
            ));
        }
        return Ok(());
    }

    let config_report = if args.users {
        None
    } else {
        Some(synchronizer.sync_config().await?)
    };
    let users_report = if args.config_only {
        None
    } else {
        Some(synchronizer.sync_users().await?)
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "sync",
            "config": config_report,
            "users": users_report,
        }));
        return Ok(());
    }

    if let Some(report) = config_report {
        output::success(&format!(
            "Config: {} assets ({} removed), {} hops ({} removed)",
            report.assets, report.assets_removed, report.hops, report.hops_removed
        ));
    }
    if let Some(report) = users_report {
        output::success(&format!("Users: {} synced", report.synced));
        if report.failed > 0 {
            output::warning(&format!(
                "{} users failed to sync; see `dcabot history --errors`",
                report.failed
            ));
        }
    }
    Ok(())
}
