//! Batch processor trait

use async_trait::async_trait;

use crate::domains::batch::{BatchApproval, GlobalParams};
use crate::domains::movement::StockMovement;
use crate::domains::user::{Requester, UserRole};
use crate::dto::batch::{BatchResult, PendingSummary};
use shared_error::AppError;

/// Stages batches for approval and applies them movement by movement.
#[async_trait]
pub trait BatchStockService: Send + Sync {
    /// Stage a batch: allocate a batch id, apply global parameters,
    /// snapshot before-levels, populate unit metadata, and hold the batch
    /// in the pending set.
    async fn prepare_batch_approval(
        &self,
        movements: Vec<StockMovement>,
        requester: &Requester,
        global_params: GlobalParams,
    ) -> Result<BatchApproval, AppError>;

    /// Apply movements sequentially in input order, collecting per-entry
    /// outcomes. A critical failure triggers a compensating rollback of the
    /// already-applied movements.
    async fn process_batch_movements(
        &self,
        movements: &[StockMovement],
        role: UserRole,
    ) -> BatchResult;

    /// Retrieve a pending batch
    async fn get_batch_approval(&self, batch_id: &str) -> Option<BatchApproval>;

    /// Drop a batch from the pending set
    async fn remove_batch_approval(&self, batch_id: &str) -> bool;

    /// Summary of all pending batches
    async fn pending_summary(&self) -> PendingSummary;
}
