//! Application services. Depend on domain and port only.
//!
//! - [`index`] - Shared routing snapshot, rebuilt after catalog changes
//! - [`selector`] - Best-route selection for one purchase
//! - [`purchase`] - Purchase pipeline behind the scheduler
//! - [`scheduler`] - Order arming, reconcile sweep and the service loop
//! - [`sync`] - Mirroring the DCA contract into the store

pub mod index;
pub mod purchase;
pub mod scheduler;
pub mod selector;
pub mod sync;

pub use index::{PathIndexHandle, RoutingSnapshot};
pub use purchase::PurchasePipeline;
pub use scheduler::{OrderScheduler, SchedulerHandle, SchedulerService, SchedulerServiceConfig};
pub use selector::ExecutionSelector;
pub use sync::Synchronizer;
