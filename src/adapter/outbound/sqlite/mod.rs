//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed implementation of every store port using
//! Diesel ORM, with embedded migrations.

pub mod database;
pub mod store;

pub use database::connection::{create_pool, open, run_migrations, DbPool};
pub use store::SqliteStore;
