//! Approval controller trait

use async_trait::async_trait;

use crate::domains::user::UserRole;
use crate::dto::stock::ApprovedBatch;
use shared_error::AppError;

/// Resolves staged batches. All three operations require the admin role and
/// surface permission failures without touching state.
#[async_trait]
pub trait ApprovalService: Send + Sync {
    /// Approve a pending batch: apply its movements, fill after-levels,
    /// remove it from the pending set, and return the per-item diffs.
    async fn approve_batch(
        &self,
        batch_id: &str,
        approved_by: &str,
        role: UserRole,
    ) -> Result<ApprovedBatch, AppError>;

    /// Reject a pending batch without any catalogue writes
    async fn reject_batch(
        &self,
        batch_id: &str,
        rejected_by: &str,
        role: UserRole,
    ) -> Result<String, AppError>;

    /// Void a single movement (legacy single-entry path)
    async fn void_movement(
        &self,
        movement_id: &str,
        voided_by: &str,
        role: UserRole,
    ) -> Result<String, AppError>;
}
