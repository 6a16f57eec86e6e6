//! Entry point from `main`: config, logging, then the command handler.

use super::command::{Cli, Commands, PricesCommand, UserCommand};
use super::output::{self, OutputConfig};
use super::{history, orders, prices, routes, run, sync, user};
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Load the configuration, start logging and run the chosen command.
///
/// # Errors
/// Returns the first error the command hits; the caller prints it.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    let dry_run = matches!(&cli.command, Commands::Run(args) if args.dry_run);
    let config = Config::load_with(&cli.config, |config| {
        if dry_run {
            config.chain.dry_run = true;
        }
    })?;
    config.init_logging();

    match cli.command {
        Commands::Run(_) => run::execute(&config).await,
        Commands::Sync(args) => sync::execute(&config, &args).await,
        Commands::Routes(args) => routes::execute(&config, &args).await,
        Commands::Orders(args) => orders::execute(&config, &args).await,
        Commands::History(args) => history::execute(&config, &args).await,
        Commands::User(UserCommand::Add(args)) => user::add(&config, &args).await,
        Commands::User(UserCommand::List) => user::list(&config).await,
        Commands::User(UserCommand::Remove { address }) => user::remove(&config, &address).await,
        Commands::Prices(PricesCommand::List) => prices::list(&config).await,
        Commands::Prices(PricesCommand::Set(args)) => prices::set(&config, &args).await,
    }
}
