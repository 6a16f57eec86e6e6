//! CLI module graph.

pub mod command;
pub mod dispatch;
pub mod history;
pub mod orders;
pub mod output;
pub mod prices;
pub mod routes;
pub mod run;
pub mod sync;
pub mod user;
