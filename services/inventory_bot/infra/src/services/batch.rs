//! Batch processor
//!
//! Stages batches for approval and, on approval, applies movements
//! sequentially in input order. A critical failure triggers a compensating
//! rollback of every already-applied movement in the batch.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use inventory_bot_core::domains::batch::{ApprovalStatus, BatchApproval, GlobalParams};
use inventory_bot_core::domains::movement::{MovementType, StockMovement};
use inventory_bot_core::domains::user::{Requester, UserRole};
use inventory_bot_core::dto::batch::{BatchResult, PendingSummary};
use inventory_bot_core::dto::stock::MovementOutcome;
use inventory_bot_core::errors::{BatchError, ErrorCategory, ErrorSeverity};
use inventory_bot_core::services::batch::BatchStockService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::stock::StockService;
use shared_error::AppError;

use crate::state::InteractionStore;

pub struct BatchStockServiceImpl {
    catalogue: Arc<dyn CatalogueStore>,
    stock_service: Arc<dyn StockService>,
    state: Arc<InteractionStore>,
}

impl BatchStockServiceImpl {
    pub fn new(
        catalogue: Arc<dyn CatalogueStore>,
        stock_service: Arc<dyn StockService>,
        state: Arc<InteractionStore>,
    ) -> Self {
        Self {
            catalogue,
            stock_service,
            state,
        }
    }

    async fn apply_movement(
        &self,
        movement: &StockMovement,
        role: UserRole,
    ) -> Result<MovementOutcome, AppError> {
        match movement.movement_type {
            MovementType::In => self.stock_service.stock_in(movement).await,
            MovementType::Out => self.stock_service.stock_out(movement, role).await,
            MovementType::Adjust => self.stock_service.stock_adjust(movement).await,
        }
    }

    /// Compensate every applied movement with the inverse stock delta
    async fn rollback(
        &self,
        applied: &[(StockMovement, MovementOutcome)],
    ) -> Result<(), AppError> {
        tracing::info!("Attempting to rollback {} movements", applied.len());
        for (movement, outcome) in applied {
            let applied_delta = outcome.after_level - outcome.before_level;
            self.catalogue
                .update_item_stock(&movement.item_name, -applied_delta)
                .await?;
            if let Some(movement_id) = &outcome.movement_id {
                if let Err(e) = self
                    .catalogue
                    .update_movement_status(
                        movement_id,
                        inventory_bot_core::domains::movement::MovementStatus::Voided,
                        "system-rollback",
                    )
                    .await
                {
                    tracing::warn!("Could not void movement {} during rollback: {}", movement_id, e);
                }
            }
        }
        Ok(())
    }

    fn error_severity(error: &AppError) -> ErrorSeverity {
        match error {
            AppError::Database(_)
            | AppError::ExternalService(_)
            | AppError::InternalError(_)
            | AppError::ServiceUnavailable(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn generate_summary(
        total: usize,
        successful: &[(StockMovement, MovementOutcome)],
        failed: &[StockMovement],
        success_rate: f64,
        rollback_performed: bool,
    ) -> String {
        if rollback_performed {
            return format!(
                "Batch processing failed: {}/{} entries had errors. \
                 All operations were rolled back due to critical failures.",
                failed.len(),
                total
            );
        }

        if failed.is_empty() {
            let mut message = format!(
                "Batch processing successful: All {} entries processed successfully.",
                total
            );
            let listed: Vec<String> = successful
                .iter()
                .take(5)
                .map(|(movement, _)| movement.summary_label())
                .collect();
            if !listed.is_empty() {
                message.push_str("\nItems processed:\n");
                message.push_str(&listed.join("\n"));
                if successful.len() > 5 {
                    message.push_str(&format!("\n... and {} more items", successful.len() - 5));
                }
            }
            return message;
        }

        if successful.is_empty() {
            return format!(
                "Batch processing failed: None of the {} entries could be processed.",
                total
            );
        }

        let status_text = if success_rate >= 75.0 {
            "Mostly successful"
        } else if success_rate >= 50.0 {
            "Partial success"
        } else {
            "Mostly failed"
        };

        let mut message = format!(
            "{}: {}/{} entries processed successfully ({:.1}% success rate).",
            status_text,
            successful.len(),
            total,
            success_rate
        );

        let succeeded: Vec<String> = successful
            .iter()
            .take(3)
            .map(|(movement, _)| movement.summary_label())
            .collect();
        message.push_str("\nSuccessful items:\n");
        message.push_str(&succeeded.join("\n"));
        if successful.len() > 3 {
            message.push_str(&format!("\n... and {} more", successful.len() - 3));
        }

        let failed_list: Vec<String> =
            failed.iter().take(3).map(StockMovement::summary_label).collect();
        message.push_str("\nFailed items:\n");
        message.push_str(&failed_list.join("\n"));
        if failed.len() > 3 {
            message.push_str(&format!("\n... and {} more", failed.len() - 3));
        }

        message
    }
}

#[async_trait]
impl BatchStockService for BatchStockServiceImpl {
    async fn prepare_batch_approval(
        &self,
        mut movements: Vec<StockMovement>,
        requester: &Requester,
        global_params: GlobalParams,
    ) -> Result<BatchApproval, AppError> {
        let batch_id = Uuid::new_v4().to_string();

        for movement in &mut movements {
            global_params.apply_to(movement);
            movement.batch_id = Some(batch_id.clone());
        }

        // One catalogue read per distinct item covers both the before-level
        // snapshot and the unit metadata echo
        let mut before_levels: HashMap<String, f64> = HashMap::new();
        let mut unit_info: HashMap<String, (f64, String)> = HashMap::new();
        for movement in &movements {
            if before_levels.contains_key(&movement.item_name) {
                continue;
            }
            match self.catalogue.get_item(&movement.item_name).await? {
                Some(item) => {
                    before_levels.insert(movement.item_name.clone(), item.on_hand);
                    unit_info.insert(
                        movement.item_name.clone(),
                        (item.unit_size, item.unit_type.clone()),
                    );
                },
                None => {
                    before_levels.insert(movement.item_name.clone(), 0.0);
                },
            }
        }
        for movement in &mut movements {
            if let Some((unit_size, unit_type)) = unit_info.get(&movement.item_name) {
                movement.unit_size = Some(*unit_size);
                movement.unit_type = Some(unit_type.clone());
            }
        }

        let approval = BatchApproval {
            batch_id: batch_id.clone(),
            movements,
            user_id: requester.user_id.to_string(),
            user_name: requester.user_name.clone(),
            chat_id: requester.chat_id,
            submitter_role: requester.role,
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
            before_levels,
            after_levels: HashMap::new(),
            failed_entries: Vec::new(),
            global_params,
        };

        self.state.insert_approval(approval.clone()).await;
        tracing::info!(
            "Batch {} prepared for approval with {} movements",
            batch_id,
            approval.movements.len()
        );
        Ok(approval)
    }

    async fn process_batch_movements(
        &self,
        movements: &[StockMovement],
        role: UserRole,
    ) -> BatchResult {
        let started = Instant::now();
        tracing::info!("Starting batch processing of {} movements", movements.len());

        let mut successful: Vec<(StockMovement, MovementOutcome)> = Vec::new();
        let mut failed: Vec<StockMovement> = Vec::new();
        let mut errors: Vec<BatchError> = Vec::new();

        for (i, movement) in movements.iter().enumerate() {
            match self.apply_movement(movement, role).await {
                Ok(outcome) => {
                    tracing::debug!("Processed movement {}: {}", i + 1, movement.item_name);
                    successful.push((movement.clone(), outcome));
                },
                Err(e) => {
                    let severity = Self::error_severity(&e);
                    errors.push(
                        BatchError::new(e.to_string())
                            .with_entry(i, movement.summary_label())
                            .with_severity(severity),
                    );
                    failed.push(movement.clone());
                    tracing::warn!("Failed to process movement {}: {}", i + 1, e);
                },
            }
        }

        let mut rollback_performed = false;
        let has_critical = errors.iter().any(BatchError::is_critical);
        if has_critical && !successful.is_empty() {
            match self.rollback(&successful).await {
                Ok(()) => {
                    rollback_performed = true;
                    // Rolled-back entries did not persist; count them failed
                    failed.extend(successful.drain(..).map(|(movement, _)| movement));
                    tracing::info!("Rollback completed successfully");
                },
                Err(e) => {
                    errors.push(
                        BatchError::new(format!(
                            "Failed to rollback successful movements after critical errors: {}",
                            e
                        ))
                        .with_category(ErrorCategory::Rollback)
                        .with_severity(ErrorSeverity::Critical)
                        .with_suggestion(
                            "Manual intervention may be required to correct data inconsistencies",
                        ),
                    );
                    tracing::error!("Rollback failed, manual intervention may be required: {}", e);
                },
            }
        }

        let total_entries = movements.len();
        let successful_entries = successful.len();
        let failed_entries = failed.len();
        let success_rate = BatchResult::rate(successful_entries, total_entries);

        let mut summary_message = Self::generate_summary(
            total_entries,
            &successful,
            &failed,
            success_rate,
            rollback_performed,
        );

        let low_stock: Vec<&str> = successful
            .iter()
            .filter_map(|(_, outcome)| outcome.low_stock_warning.as_deref())
            .collect();
        if !low_stock.is_empty() {
            summary_message.push_str("\nLow stock:\n");
            summary_message.push_str(&low_stock.join("\n"));
        }

        let movements_created = successful
            .iter()
            .filter_map(|(_, outcome)| outcome.movement_id.clone())
            .collect();

        tracing::info!(
            "Batch processing completed: {}/{} successful",
            successful_entries,
            total_entries
        );

        BatchResult {
            total_entries,
            successful_entries,
            failed_entries,
            success_rate,
            movements_created,
            errors,
            rollback_performed,
            processing_time_seconds: started.elapsed().as_secs_f64(),
            summary_message,
            global_params: GlobalParams::default(),
        }
    }

    async fn get_batch_approval(&self, batch_id: &str) -> Option<BatchApproval> {
        self.state.get_approval(batch_id).await
    }

    async fn remove_batch_approval(&self, batch_id: &str) -> bool {
        self.state.remove_approval(batch_id).await.is_some()
    }

    async fn pending_summary(&self) -> PendingSummary {
        let approvals = self.state.approvals_snapshot().await;
        PendingSummary {
            total_pending_batches: approvals.len(),
            total_pending_movements: approvals.iter().map(|a| a.movements.len()).sum(),
            oldest_pending: approvals.iter().map(|a| a.created_at).min(),
            batch_ids: approvals.into_iter().map(|a| a.batch_id).collect(),
        }
    }
}
