//! Outbound ports: what the application needs from the outside world.

pub mod chain;
pub mod oracle;
pub mod store;
pub mod timer;
