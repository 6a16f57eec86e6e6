//! Chain access over the LCD REST API.

pub mod client;
pub mod dto;
pub mod settings;

pub use client::{LcdChainClient, DRY_RUN_TX};
pub use settings::{ChainConfig, HttpConfig};
