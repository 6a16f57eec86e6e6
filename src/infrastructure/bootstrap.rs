//! Composition root: builds the adapters and services from [`Config`].

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::adapter::outbound::lcd::LcdChainClient;
use crate::adapter::outbound::price::StoredPriceOracle;
use crate::adapter::outbound::sqlite::{self, SqliteStore};
use crate::adapter::outbound::timer::TokioTimers;
use crate::application::{
    ExecutionSelector, OrderScheduler, PathIndexHandle, PurchasePipeline, SchedulerService,
    Synchronizer,
};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::store::{CatalogStore, Store};

/// Open the configured database and bring its schema up to date.
///
/// # Errors
/// Returns an error if the database cannot be opened or migrated.
pub fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let pool = sqlite::open(&config.database)?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

/// Long-lived components shared by every command.
pub struct Services {
    pub store: Arc<SqliteStore>,
    pub chain: Arc<dyn ChainClient>,
    pub index: Arc<PathIndexHandle>,
    pub synchronizer: Arc<Synchronizer>,
    max_price_age: Option<chrono::Duration>,
}

impl Services {
    /// Wire the store, the LCD client and the routing index.
    ///
    /// The index starts from whatever catalog the store already holds.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or read.
    pub async fn build(config: &Config) -> Result<Self> {
        let chain: Arc<dyn ChainClient> = Arc::new(LcdChainClient::from_config(&config.chain));
        Self::with_chain(config, chain).await
    }

    /// Same as [`Services::build`] with a caller-supplied chain client.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or read.
    pub async fn with_chain(config: &Config, chain: Arc<dyn ChainClient>) -> Result<Self> {
        let store = open_store(config)?;
        let catalog = store.load_catalog().await?;
        let index = Arc::new(PathIndexHandle::from_catalog(
            catalog,
            config.routing.max_hops,
        ));
        let synchronizer = Arc::new(Synchronizer::new(
            store.clone(),
            Arc::clone(&chain),
            Arc::clone(&index),
        ));
        Ok(Self {
            store,
            chain,
            index,
            synchronizer,
            max_price_age: config.prices.max_age(),
        })
    }

    /// Route selector backed by the stored price table.
    #[must_use]
    pub fn selector(&self) -> ExecutionSelector {
        let store: Arc<dyn Store> = self.store.clone();
        let oracle = Arc::new(StoredPriceOracle::new(Arc::clone(&store), self.max_price_age));
        ExecutionSelector::new(Arc::clone(&self.index), store, Arc::clone(&self.chain), oracle)
    }
}

/// Run the bot until `shutdown` resolves.
///
/// Syncs config and users once, then hands over to the scheduler service,
/// which keeps both fresh on its own intervals.
///
/// # Errors
/// Returns an error if the database cannot be opened or read. Sync failures
/// at startup are logged and the bot runs on the stored state.
pub async fn run(config: &Config, services: Services, shutdown: impl Future<Output = ()>) -> Result<()> {
    match services.synchronizer.sync_config().await {
        Ok(report) => info!(
            assets = report.assets,
            hops = report.hops,
            "Initial config sync complete"
        ),
        Err(e) => warn!(error = %e, "Initial config sync failed, using stored catalog"),
    }
    match services.synchronizer.sync_users().await {
        Ok(report) => info!(
            synced = report.synced,
            failed = report.failed,
            "Initial user sync complete"
        ),
        Err(e) => warn!(error = %e, "Initial user sync failed, using stored orders"),
    }

    let mut pipeline = PurchasePipeline::new(
        services.store.clone(),
        Arc::clone(&services.chain),
        services.selector(),
    );
    if config.scheduler.resync_after_purchase {
        pipeline = pipeline.with_resync(Arc::clone(&services.synchronizer));
    }

    let (timers, fires) = TokioTimers::new(Handle::current());
    let scheduler = Arc::new(OrderScheduler::new(
        services.store.clone(),
        Arc::new(timers),
        Arc::new(pipeline),
        config.scheduler.backoff_policy(),
    ));
    let service = SchedulerService::new(
        config.scheduler.service_config(),
        scheduler,
        Some(Arc::clone(&services.synchronizer)),
    );

    info!(
        database = %config.database,
        dry_run = config.chain.dry_run,
        max_hops = config.routing.max_hops,
        "dcabot running"
    );
    let handle = service.start(fires);
    shutdown.await;
    info!("Shutdown signal received");
    handle.shutdown().await;
    Ok(())
}
