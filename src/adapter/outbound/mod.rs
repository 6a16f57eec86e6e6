//! Outbound adapters (driven side).

pub mod lcd;
pub mod price;
pub mod sqlite;
pub mod timer;
