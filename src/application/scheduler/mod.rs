//! Order scheduling and the service loop that drives it.

pub mod arming;
pub mod service;

pub use arming::{Backoff, BackoffPolicy, OrderScheduler, ReconcileReport};
pub use service::{SchedulerHandle, SchedulerService, SchedulerServiceConfig};
