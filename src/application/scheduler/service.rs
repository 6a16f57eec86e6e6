//! Background scheduler service.
//!
//! ```text
//! Timers --(fire channel)--> SchedulerService --spawn--> OrderScheduler::handle_fire
//!                                  |
//!                                  +-- every reconcile_interval: reconcile()
//!                                  +-- every config_sync_interval: sync_config()
//!                                  +-- every user_sync_interval: sync_users()
//! ```
//!
//! Fires are handled on their own tasks so a slow purchase holds up only its
//! own order. Sync runs never overlap: a tick that arrives while the
//! previous sync is still going is skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::arming::OrderScheduler;
use crate::application::sync::Synchronizer;
use crate::domain::OrderId;

/// Service timing.
#[derive(Debug, Clone)]
pub struct SchedulerServiceConfig {
    pub reconcile_interval: Duration,
    /// `None` disables periodic config sync.
    pub config_sync_interval: Option<Duration>,
    /// `None` disables periodic user sync.
    pub user_sync_interval: Option<Duration>,
}

impl Default for SchedulerServiceConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(60),
            config_sync_interval: Some(Duration::from_secs(3_600)),
            user_sync_interval: Some(Duration::from_secs(300)),
        }
    }
}

/// Handle for controlling the scheduler service lifecycle.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the service to stop and wait for its loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }
}

pub struct SchedulerService {
    config: SchedulerServiceConfig,
    scheduler: Arc<OrderScheduler>,
    synchronizer: Option<Arc<Synchronizer>>,
    sync_lock: Arc<Mutex<()>>,
}

impl SchedulerService {
    pub fn new(
        config: SchedulerServiceConfig,
        scheduler: Arc<OrderScheduler>,
        synchronizer: Option<Arc<Synchronizer>>,
    ) -> Self {
        Self {
            config,
            scheduler,
            synchronizer,
            sync_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Start the service loop. Returns a handle for shutting it down.
    pub fn start(self, mut fires: mpsc::UnboundedReceiver<OrderId>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut reconcile = ticker(self.config.reconcile_interval);
            let mut config_sync = self.synced_ticker(self.config.config_sync_interval);
            let mut user_sync = self.synced_ticker(self.config.user_sync_interval);

            info!(
                reconcile_secs = self.config.reconcile_interval.as_secs(),
                config_sync = config_sync.is_some(),
                user_sync = user_sync.is_some(),
                "Scheduler service started"
            );

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler service shutting down");
                        break;
                    }

                    fire = fires.recv() => {
                        let Some(order_id) = fire else {
                            info!("Timer channel closed");
                            break;
                        };
                        let scheduler = Arc::clone(&self.scheduler);
                        tokio::spawn(async move {
                            scheduler.handle_fire(&order_id).await;
                        });
                    }

                    _ = reconcile.tick() => {
                        if let Err(e) = self.scheduler.reconcile().await {
                            warn!(error = %e, "Reconcile failed");
                        }
                    }

                    () = next_tick(&mut config_sync) => self.spawn_config_sync(),

                    () = next_tick(&mut user_sync) => self.spawn_user_sync(),
                }
            }
        });

        SchedulerHandle { shutdown_tx, task }
    }

    /// Sync tickers first fire one period after start; callers sync once
    /// themselves before starting the service.
    fn synced_ticker(&self, period: Option<Duration>) -> Option<Interval> {
        self.synchronizer.as_ref()?;
        period.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        })
    }

    fn spawn_config_sync(&self) {
        let Some(synchronizer) = self.synchronizer.clone() else {
            return;
        };
        let Ok(guard) = Arc::clone(&self.sync_lock).try_lock_owned() else {
            debug!("Sync still running, skipping config sync");
            return;
        };
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = synchronizer.sync_config().await {
                warn!(error = %e, "Config sync failed");
            }
        });
    }

    fn spawn_user_sync(&self) {
        let Some(synchronizer) = self.synchronizer.clone() else {
            return;
        };
        let Ok(guard) = Arc::clone(&self.sync_lock).try_lock_owned() else {
            debug!("Sync still running, skipping user sync");
            return;
        };
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = synchronizer.sync_users().await {
                warn!(error = %e, "User sync failed");
            }
        });
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Wait for the next tick, or forever when the timer is disabled.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
