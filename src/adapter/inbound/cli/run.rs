//! Handler for the `run` command.

use tokio::signal;
use tracing::error;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::{self, Services};
use crate::infrastructure::config::Config;

/// Execute the run command.
pub async fn execute(config: &Config) -> Result<()> {
    print_startup(config);
    let services = Services::build(config).await?;
    bootstrap::run(config, services, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
}

fn print_startup(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("LCD", &config.chain.lcd_url);
    output::field("Contract", &config.chain.dca_address);
    output::field("Database", &config.database);
    output::field("Max hops", config.routing.max_hops);

    if config.chain.dry_run {
        output::warning("Dry-run mode enabled - purchases will be logged, not submitted");
    }
}
