//! Exchange-agnostic domain types for the DCA bot.
//!
//! - [`asset`] - Assets, asset classes and amounts
//! - [`hop`] / [`path`] - Tradable pairs and multi-hop routes
//! - [`catalog`] - Whitelisted assets and hops
//! - [`path_index`] - Precomputed routes between asset pairs
//! - [`fee`] - Per-hop fee schedule and fee apportioning
//! - [`order`] - DCA orders and their scheduling state
//! - [`execution`] - Route choices and purchase records
//! - [`price`] - USD prices
//! - [`contract`] - Views of on-chain DCA state

pub mod asset;
pub mod catalog;
pub mod contract;
pub mod error;
pub mod execution;
pub mod fee;
pub mod hop;
pub mod id;
pub mod order;
pub mod path;
pub mod path_index;
pub mod price;

pub use asset::{Amount, Asset, AssetAmount, AssetClass};
pub use catalog::{AssetCatalog, SwapOperation};
pub use error::DomainError;
pub use execution::{ErrorLogEntry, ExecutionRecord, PurchaseOutcome, PurchaseRequest, RouteChoice};
pub use fee::{build_fee_redeem, FeeSchedule};
pub use hop::{Direction, Hop};
pub use id::{HopId, OrderId, UserAddress};
pub use order::{Order, ScheduleState};
pub use path::{Path, PathStep};
pub use path_index::PathIndex;
pub use price::TokenPrice;
