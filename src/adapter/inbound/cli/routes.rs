//! Handler for the `routes` command.
//!
//! Lists the candidate routes the path index holds for a pair. With a user
//! and an amount it also runs route selection, which checks the user's tip
//! balance and simulates every affordable candidate on chain.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::RoutesArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::{Asset, AssetCatalog, DomainError, Path, UserAddress};
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::infrastructure::config::Config;

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Hops")]
    hops: usize,
    #[tabled(rename = "Via")]
    via: String,
}

/// Look up a whitelisted asset by denom or contract address.
fn resolve_asset(catalog: &AssetCatalog, identifier: &str) -> Result<Asset> {
    catalog.asset(identifier).cloned().ok_or_else(|| {
        DomainError::AssetNotWhitelisted {
            asset: identifier.to_string(),
        }
        .into()
    })
}

/// `uusd -> uluna -> astro` for a path starting at `source`.
fn describe(catalog: &AssetCatalog, path: &Path, source: &Asset) -> String {
    match catalog.resolve(path, source) {
        Ok(operations) => std::iter::once(source.to_string())
            .chain(operations.iter().map(|op| op.ask.to_string()))
            .collect::<Vec<_>>()
            .join(" -> "),
        Err(e) => format!("unresolvable: {e}"),
    }
}

/// Execute the routes command.
pub async fn execute(config: &Config, args: &RoutesArgs) -> Result<()> {
    let services = Services::build(config).await?;
    let snapshot = services.index.snapshot();
    let source = resolve_asset(&snapshot.catalog, &args.source)?;
    let target = resolve_asset(&snapshot.catalog, &args.target)?;
    let max_hops = args.max_hops.unwrap_or_else(|| services.index.max_hops());

    let paths = snapshot.index.find_paths(&source, &target, max_hops);
    let rows: Vec<RouteRow> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| RouteRow {
            rank: i + 1,
            path: path.encode(),
            hops: path.len(),
            via: describe(&snapshot.catalog, path, &source),
        })
        .collect();

    let best = match (&args.user, args.amount) {
        (Some(user), Some(amount)) => {
            let user = UserAddress::new(user.as_str());
            Some(
                services
                    .selector()
                    .choose_best_route(&user, &source, amount, &target, max_hops)
                    .await?,
            )
        }
        _ => None,
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "routes",
            "source": source,
            "target": target,
            "max_hops": max_hops,
            "routes": rows.iter().map(|r| json!({ "path": r.path, "via": r.via })).collect::<Vec<_>>(),
            "best": best.as_ref().map(|choice| json!({
                "path": choice.path,
                "fee_redeem": choice.fee_redeem,
                "execution_value": choice.execution_value,
            })),
        }));
        return Ok(());
    }

    output::section(&format!("Routes {source} -> {target} (max {max_hops} hops)"));
    output::table(rows, "No routes between these assets.");

    if let Some(choice) = best {
        let fee = choice
            .fee_redeem
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        output::success(&format!("Best route {}", choice.path));
        output::field("Fee", if fee.is_empty() { "-".into() } else { fee });
        output::field(
            "Net USD",
            choice
                .execution_value
                .map_or_else(|| "not simulated (only candidate)".into(), |v| v.round_dp(6).to_string()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Hop, HopId};
    use crate::testkit::domain::{astro, uluna, uusd};

    fn catalog() -> AssetCatalog {
        AssetCatalog::from_parts(
            [uusd(), uluna(), astro()],
            [
                Hop::try_new(HopId::new(1), uusd(), uluna()).unwrap(),
                Hop::try_new(HopId::new(2), uluna(), astro()).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn describes_path_as_asset_chain() {
        let catalog = catalog();
        let path = Path::decode("<1><2>").unwrap();
        assert_eq!(describe(&catalog, &path, &uusd()), "uusd -> uluna -> terra1astro");

        let back = path.reversed();
        assert_eq!(describe(&catalog, &back, &astro()), "terra1astro -> uluna -> uusd");
    }

    #[test]
    fn unknown_asset_is_not_whitelisted() {
        let err = resolve_asset(&catalog(), "ukrw").unwrap_err();
        assert!(err.to_string().contains("ukrw"));
        assert_eq!(resolve_asset(&catalog(), "uluna").unwrap(), uluna());
    }
}
