//! Command-line interface definitions.
//!
//! Defines the CLI structure for the dcabot application using `clap`. The
//! CLI runs the bot, triggers chain syncs by hand, and inspects the local
//! state: routes, orders, purchase history and registered users.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Recurring on-chain purchases with best-route execution
#[derive(Parser, Debug)]
#[command(name = "dcabot")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the dcabot CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler in the foreground until interrupted
    Run(RunArgs),

    /// Sync contract config and users from the chain
    Sync(SyncArgs),

    /// List candidate routes between two assets
    Routes(RoutesArgs),

    /// List locally tracked orders
    Orders(OrdersArgs),

    /// Show purchase history and recent errors
    History(HistoryArgs),

    /// Manage users whose orders are executed
    #[command(subcommand)]
    User(UserCommand),

    /// Inspect or set the stored USD prices
    #[command(subcommand)]
    Prices(PricesCommand),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Log purchases instead of submitting them (overrides config)
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `sync` subcommand.
///
/// With neither flag both the config and every user are synced.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Sync only the contract config (assets, fees, hops)
    #[arg(long, conflicts_with_all = ["users", "user"])]
    pub config_only: bool,

    /// Sync only registered users
    #[arg(long)]
    pub users: bool,

    /// Sync a single user
    #[arg(long, value_name = "ADDRESS")]
    pub user: Option<String>,
}

/// Arguments for the `routes` subcommand.
#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Source asset (denom or contract address)
    pub source: String,

    /// Target asset (denom or contract address)
    pub target: String,

    /// Longest route to list
    #[arg(long)]
    pub max_hops: Option<usize>,

    /// Pick the best route for this user (simulates on chain)
    #[arg(long, value_name = "ADDRESS", requires = "amount")]
    pub user: Option<String>,

    /// Source amount to route, in smallest units
    #[arg(long, requires = "user")]
    pub amount: Option<u128>,
}

/// Arguments for the `orders` subcommand.
#[derive(Args, Debug, Default)]
pub struct OrdersArgs {
    /// Only this user's orders
    #[arg(long, value_name = "ADDRESS")]
    pub user: Option<String>,
}

/// Arguments for the `history` subcommand.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only this order's attempts
    #[arg(long, value_name = "ORDER_ID")]
    pub order: Option<String>,

    /// Most recent entries to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Show the error log instead of purchase attempts
    #[arg(long, conflicts_with = "order")]
    pub errors: bool,
}

/// Subcommands for `dcabot user`.
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user and sync their orders
    Add(UserAddArgs),
    /// List registered users
    List,
    /// Forget a user together with their orders and history
    Remove {
        /// Wallet address
        address: String,
    },
}

#[derive(Args, Debug)]
pub struct UserAddArgs {
    /// Wallet address
    pub address: String,

    /// Skip the chain sync after registering
    #[arg(long)]
    pub no_sync: bool,
}

/// Subcommands for `dcabot prices`.
#[derive(Subcommand, Debug)]
pub enum PricesCommand {
    /// List stored prices
    List,
    /// Store the USD price of one whole token
    Set(PriceSetArgs),
}

#[derive(Args, Debug)]
pub struct PriceSetArgs {
    /// Whitelisted asset (denom or contract address)
    pub asset: String,

    /// USD price of one whole token
    pub price_usd: rust_decimal::Decimal,

    /// Smallest units per whole token
    #[arg(long, default_value_t = 1_000_000)]
    pub conversion: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_command_factory_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "dcabot");
        assert!(cmd.get_version().is_some());
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["dcabot", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(RunArgs { dry_run: false })));
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(!cli.json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dcabot", "orders", "--json", "-c", "bot.toml"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("bot.toml"));
    }

    #[test]
    fn test_parse_routes() {
        let cli =
            Cli::try_parse_from(["dcabot", "routes", "uusd", "uluna", "--max-hops", "2"]).unwrap();
        let Commands::Routes(args) = cli.command else {
            panic!("expected routes");
        };
        assert_eq!(args.source, "uusd");
        assert_eq!(args.target, "uluna");
        assert_eq!(args.max_hops, Some(2));
        assert!(args.user.is_none());
    }

    #[test]
    fn test_routes_user_requires_amount() {
        assert!(Cli::try_parse_from(["dcabot", "routes", "uusd", "uluna", "--user", "terra1"]).is_err());
        assert!(Cli::try_parse_from([
            "dcabot", "routes", "uusd", "uluna", "--user", "terra1", "--amount", "1000"
        ])
        .is_ok());
    }

    #[test]
    fn test_sync_config_only_conflicts_with_users() {
        assert!(Cli::try_parse_from(["dcabot", "sync", "--config-only", "--users"]).is_err());
    }

    #[test]
    fn test_history_defaults() {
        let cli = Cli::try_parse_from(["dcabot", "history"]).unwrap();
        let Commands::History(args) = cli.command else {
            panic!("expected history");
        };
        assert_eq!(args.limit, 20);
        assert!(!args.errors);
    }

    #[test]
    fn test_parse_prices_set() {
        let cli = Cli::try_parse_from(["dcabot", "prices", "set", "uluna", "0.85"]).unwrap();
        match cli.command {
            Commands::Prices(PricesCommand::Set(args)) => {
                assert_eq!(args.asset, "uluna");
                assert_eq!(args.price_usd.to_string(), "0.85");
                assert_eq!(args.conversion, 1_000_000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_user_add() {
        let cli = Cli::try_parse_from(["dcabot", "user", "add", "terra1abc"]).unwrap();
        match cli.command {
            Commands::User(UserCommand::Add(args)) => {
                assert_eq!(args.address, "terra1abc");
                assert!(!args.no_sync);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
