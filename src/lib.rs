//! dcabot - recurring on-chain purchases with best-route execution.
//!
//! Users hold dollar-cost-averaging orders on a DCA contract: spend a fixed
//! slice of a source asset on a target asset every interval, paying the bot
//! a per-hop fee from a separate tip balance. This crate mirrors those
//! orders locally, picks the best multi-hop route for each purchase and
//! keeps exactly one pending timer per active order.
//!
//! # Architecture
//!
//! - **`domain`** - Assets, hops, paths, the path index, fee apportioning
//!   and orders. No I/O.
//! - **`port`** - Traits for the chain, the store, prices and timers.
//! - **`application`** - Route selection, the purchase pipeline, chain sync
//!   and the order scheduler.
//! - **`adapter`** - SQLite store, LCD chain client, tokio timers, the
//!   stored price oracle and the CLI.
//! - **`infrastructure`** - Configuration and runtime wiring.
//!
//! # Example
//!
//! ```
//! use dcabot::domain::{Asset, AssetCatalog, Hop, HopId, PathIndex};
//!
//! let usd = Asset::native("uusd");
//! let luna = Asset::native("uluna");
//! let hop = Hop::try_new(HopId::new(1), usd.clone(), luna.clone()).unwrap();
//! let catalog = AssetCatalog::from_parts([usd.clone(), luna.clone()], [hop]).unwrap();
//!
//! let index = PathIndex::build(&catalog, 3);
//! let routes = index.find_paths(&usd, &luna, 3);
//! assert_eq!(routes[0].encode(), "<1>");
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
