//! One purchase attempt for one order.
//!
//! Route selection, submission and bookkeeping. Every attempt leaves an
//! [`ExecutionRecord`]; failures also land in the error log. The local
//! remaining amount only moves after a successful submission, and the
//! store's triggers then reset or delete the order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use super::selector::ExecutionSelector;
use super::sync::Synchronizer;
use crate::domain::{
    ErrorLogEntry, ExecutionRecord, Order, OrderId, PurchaseOutcome, PurchaseRequest, RouteChoice,
};
use crate::error::{Error, Result};
use crate::port::inbound::purchase::PurchaseRunner;
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::store::Store;

/// A failed attempt, with the route if one was chosen before the failure.
struct AttemptFailure {
    choice: Option<RouteChoice>,
    error: Error,
}

pub struct PurchasePipeline {
    store: Arc<dyn Store>,
    chain: Arc<dyn ChainClient>,
    selector: ExecutionSelector,
    resync: Option<Arc<Synchronizer>>,
}

impl PurchasePipeline {
    pub fn new(store: Arc<dyn Store>, chain: Arc<dyn ChainClient>, selector: ExecutionSelector) -> Self {
        Self {
            store,
            chain,
            selector,
            resync: None,
        }
    }

    /// Re-sync the order's owner from the chain after each attempt.
    #[must_use]
    pub fn with_resync(mut self, synchronizer: Arc<Synchronizer>) -> Self {
        self.resync = Some(synchronizer);
        self
    }

    async fn attempt(&self, order: &Order) -> std::result::Result<(RouteChoice, String), AttemptFailure> {
        let amount = order.next_purchase_amount();
        let choice = self
            .selector
            .choose_best_route(&order.user, &order.source, amount, &order.target, order.max_hops)
            .await
            .map_err(|e| AttemptFailure {
                choice: None,
                error: Error::from(e),
            })?;
        let request = PurchaseRequest {
            user: order.user.clone(),
            chain_order_id: order.chain_id,
            operations: choice.operations.clone(),
            fee_redeem: choice.fee_redeem.clone(),
        };
        match self.chain.submit_purchase(&request).await {
            Ok(tx_ref) => Ok((choice, tx_ref)),
            Err(e) => Err(AttemptFailure {
                choice: Some(choice),
                error: Error::from(e),
            }),
        }
    }

    async fn finish_success(&self, order: &Order, choice: RouteChoice, tx_ref: &str) -> Result<()> {
        let now = Utc::now();
        let amount = order.next_purchase_amount();
        let record = ExecutionRecord {
            order_id: order.id.clone(),
            created_at: now,
            source: order.source.clone(),
            target: order.target.clone(),
            amount,
            remaining_before: order.remaining,
            path: Some(choice.path),
            fee_redeem: choice.fee_redeem,
            success: true,
            error: None,
            tx_ref: Some(tx_ref.to_string()),
        };
        // The slice is spent on chain whether or not history was written.
        let history = self.store.record_execution(&record).await;
        self.store.record_consumption(&order.id, amount, now).await?;
        history
    }

    async fn finish_failure(&self, order: &Order, choice: Option<RouteChoice>, reason: &str) -> Result<()> {
        let now = Utc::now();
        let (path, fee_redeem) = match choice {
            Some(choice) => (Some(choice.path), choice.fee_redeem),
            None => (None, Vec::new()),
        };
        let record = ExecutionRecord {
            order_id: order.id.clone(),
            created_at: now,
            source: order.source.clone(),
            target: order.target.clone(),
            amount: order.next_purchase_amount(),
            remaining_before: order.remaining,
            path,
            fee_redeem,
            success: false,
            error: Some(reason.to_string()),
            tx_ref: None,
        };
        self.store.record_execution(&record).await?;
        self.log_error(Some(order), "purchase", reason).await;
        Ok(())
    }

    async fn log_error(&self, order: Option<&Order>, method: &str, message: &str) {
        let entry = ErrorLogEntry {
            created_at: Utc::now(),
            order_id: order.map(|o| o.id.clone()),
            user: order.map(|o| o.user.clone()),
            method: method.to_string(),
            message: message.to_string(),
        };
        if let Err(e) = self.store.log_error(&entry).await {
            warn!(method, error = %e, "Failed to write error log");
        }
    }
}

#[async_trait]
impl PurchaseRunner for PurchasePipeline {
    async fn purchase(&self, order_id: &OrderId) -> PurchaseOutcome {
        let order = match self.store.get_order(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => return PurchaseOutcome::Skipped,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Failed to load order");
                return PurchaseOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = match self.attempt(&order).await {
            Ok((choice, tx_ref)) => {
                let path = choice.path.encode();
                match self.finish_success(&order, choice, &tx_ref).await {
                    Ok(()) => {
                        info!(
                            order_id = %order.id,
                            amount = order.next_purchase_amount(),
                            path = %path,
                            tx = %tx_ref,
                            "Purchase executed"
                        );
                    }
                    Err(e) => {
                        // The purchase went through on chain; the next user
                        // sync brings the local amount back in line.
                        warn!(order_id = %order.id, tx = %tx_ref, error = %e, "Failed to record purchase");
                        self.log_error(Some(&order), "record_purchase", &e.to_string())
                            .await;
                    }
                }
                PurchaseOutcome::Succeeded { tx_ref }
            }
            Err(AttemptFailure { choice, error: e }) => {
                let reason = e.to_string();
                if e.is_expected() {
                    info!(order_id = %order.id, reason = %reason, "Purchase not executed");
                } else {
                    warn!(order_id = %order.id, error = %reason, "Purchase failed");
                }
                if let Err(record_err) = self.finish_failure(&order, choice, &reason).await {
                    warn!(order_id = %order.id, error = %record_err, "Failed to record failed purchase");
                }
                PurchaseOutcome::Failed { reason }
            }
        };

        if let Some(synchronizer) = &self.resync {
            if let Err(e) = synchronizer.sync_user(&order.user).await {
                warn!(user = %order.user, error = %e, "Post-purchase user sync failed");
            }
        }
        outcome
    }
}
