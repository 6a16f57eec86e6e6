//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`chain`] - `FakeChain`, a scripted [`ChainClient`](crate::port::ChainClient).
//! - [`oracle`] - `FixedPriceOracle` with hand-set unit prices.
//! - [`timers`] - `RecordingTimers`, which remembers deadlines instead of sleeping.
//! - [`domain`] - Builders for assets, orders and seeded in-memory stores.

pub mod chain;
pub mod domain;
pub mod oracle;
pub mod timers;

pub use chain::FakeChain;
pub use oracle::FixedPriceOracle;
pub use timers::RecordingTimers;
