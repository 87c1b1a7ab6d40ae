//! Approval controller
//!
//! Resolves staged batches. Approvals apply the batch with the submitter's
//! role (an admin approving a staff batch does not lift the staff
//! availability checks), fill the after-levels, and emit per-item diffs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use inventory_bot_core::domains::movement::MovementStatus;
use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::errors;
use inventory_bot_core::dto::stock::{ApprovedBatch, LevelDiff};
use inventory_bot_core::services::approvals::ApprovalService;
use inventory_bot_core::services::batch::BatchStockService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use shared_error::AppError;

pub struct ApprovalServiceImpl {
    catalogue: Arc<dyn CatalogueStore>,
    batch_service: Arc<dyn BatchStockService>,
}

impl ApprovalServiceImpl {
    pub fn new(
        catalogue: Arc<dyn CatalogueStore>,
        batch_service: Arc<dyn BatchStockService>,
    ) -> Self {
        Self {
            catalogue,
            batch_service,
        }
    }
}

#[async_trait]
impl ApprovalService for ApprovalServiceImpl {
    async fn approve_batch(
        &self,
        batch_id: &str,
        approved_by: &str,
        role: UserRole,
    ) -> Result<ApprovedBatch, AppError> {
        if !role.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can approve batches.".to_string(),
            ));
        }

        let approval = self
            .batch_service
            .get_batch_approval(batch_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Batch {} not found.", batch_id)))?;

        tracing::info!(
            "Processing approval for batch {} with {} movements",
            batch_id,
            approval.movements.len()
        );

        let result = self
            .batch_service
            .process_batch_movements(&approval.movements, approval.submitter_role)
            .await;

        // Re-read each distinct item for the after comparison
        let mut after_levels: HashMap<String, f64> = HashMap::new();
        for movement in &approval.movements {
            if after_levels.contains_key(&movement.item_name) {
                continue;
            }
            let level = self
                .catalogue
                .get_item(&movement.item_name)
                .await
                .ok()
                .flatten()
                .map(|item| item.on_hand)
                .unwrap_or(0.0);
            after_levels.insert(movement.item_name.clone(), level);
        }

        let diffs: Vec<LevelDiff> = approval
            .before_levels
            .iter()
            .map(|(item_name, before)| LevelDiff {
                item_name: item_name.clone(),
                before: *before,
                after: after_levels.get(item_name).copied().unwrap_or(*before),
            })
            .collect();

        // Keep the batch retriable when nothing posted; otherwise resolve it
        if result.successful_entries > 0 || result.failed_entries == 0 {
            self.batch_service.remove_batch_approval(batch_id).await;
        }

        let mut message = format!(
            "Batch {} processed by {}.\n{}",
            batch_id, approved_by, result.summary_message
        );
        if !diffs.is_empty() {
            message.push_str("\nStock levels:");
            for diff in &diffs {
                message.push_str(&format!(
                    "\n{}: {} -> {}",
                    diff.item_name, diff.before, diff.after
                ));
            }
        }
        if !result.errors.is_empty() {
            message.push_str(&format!("\n{}", errors::summarize(&result.errors)));
            message.push_str(&format!("\n{}", errors::recovery_suggestion(&result.errors)));
        }

        Ok(ApprovedBatch {
            batch_id: batch_id.to_string(),
            result,
            diffs,
            message,
        })
    }

    async fn reject_batch(
        &self,
        batch_id: &str,
        rejected_by: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        if !role.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can reject batches.".to_string(),
            ));
        }

        if self.batch_service.get_batch_approval(batch_id).await.is_none() {
            return Err(AppError::NotFound(format!("Batch {} not found.", batch_id)));
        }

        self.batch_service.remove_batch_approval(batch_id).await;
        Ok(format!("Batch {} rejected by {}.", batch_id, rejected_by))
    }

    async fn void_movement(
        &self,
        movement_id: &str,
        voided_by: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        if !role.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can void movements.".to_string(),
            ));
        }

        self.catalogue
            .update_movement_status(movement_id, MovementStatus::Voided, voided_by)
            .await?;
        Ok(format!("Movement {} voided by {}.", movement_id, voided_by))
    }
}
