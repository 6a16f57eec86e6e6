//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (the chain, the database, timers, price sources).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │  Chain  │            │   Store     │              │  Timers   │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`outbound::chain::ChainClient`] - DCA contract queries, route simulation, purchase submission
//! - [`outbound::oracle::PriceOracle`] - USD price per smallest unit
//! - [`outbound::store::Store`] - Persistence for catalog, orders, balances, history
//! - [`outbound::timer::Timers`] - One pending timer per armed order
//! - [`inbound::purchase::PurchaseRunner`] - Entry point the scheduler fires into

pub mod inbound;
pub mod outbound;

pub use inbound::purchase::PurchaseRunner;
pub use outbound::chain::ChainClient;
pub use outbound::oracle::PriceOracle;
pub use outbound::store::{
    BalanceStore, CatalogStore, ErrorLogStore, ExecutionStore, OrderStore, PriceStore, Store,
    UserStore,
};
pub use outbound::timer::Timers;
