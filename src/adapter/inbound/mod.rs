//! Driving adapters.
//!
//! - [`cli`] - The `dcabot` command line

pub mod cli;
