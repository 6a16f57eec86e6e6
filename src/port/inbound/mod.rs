//! Inbound ports: operations the application exposes to its drivers.

pub mod purchase;
