//! Duplicate engine
//!
//! Scans candidate batches against the cached catalogue with the
//! keyword+quantity similarity kernel, auto-merges exact matches under the
//! policy, and holds per-chat confirmation dialogues for similar matches.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use inventory_bot_core::domains::duplicate::{
    DuplicateAction, DuplicateAnalysis, DuplicateMatch, DuplicatePolicy, MatchKind,
    PendingDuplicates, StockShortfall,
};
use inventory_bot_core::domains::movement::{MovementType, StockMovement};
use inventory_bot_core::domains::user::Requester;
use inventory_bot_core::dto::duplicates::{DuplicateProcessing, DuplicateResolution};
use inventory_bot_core::errors::BatchError;
use inventory_bot_core::services::cache::ItemCacheService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::duplicates::DuplicateService;
use inventory_bot_core::services::stock::StockService;
use inventory_bot_core::similarity;
use shared_error::AppError;

use crate::state::InteractionStore;

pub struct DuplicateServiceImpl {
    cache: Arc<dyn ItemCacheService>,
    catalogue: Arc<dyn CatalogueStore>,
    stock_service: Arc<dyn StockService>,
    state: Arc<InteractionStore>,
}

impl DuplicateServiceImpl {
    pub fn new(
        cache: Arc<dyn ItemCacheService>,
        catalogue: Arc<dyn CatalogueStore>,
        stock_service: Arc<dyn StockService>,
        state: Arc<InteractionStore>,
    ) -> Self {
        Self {
            cache,
            catalogue,
            stock_service,
            state,
        }
    }

    /// Append the movement's project to the matched item unless already
    /// listed (comma-joined)
    async fn merge_project(
        &self,
        matched: &DuplicateMatch,
        project: Option<&str>,
    ) -> Result<(), AppError> {
        let Some(project) = project else {
            return Ok(());
        };
        let current = matched.existing.project.as_deref().unwrap_or("");
        if current.split(',').any(|existing| existing.trim() == project) {
            return Ok(());
        }
        let updated = if current.is_empty() {
            project.to_string()
        } else {
            format!("{}, {}", current, project)
        };
        self.catalogue
            .update_item_project(&matched.existing.name, &updated)
            .await
    }

    /// Apply one resolved duplicate directly through the executor, under
    /// either the matched catalogue name (merge) or the entered name
    /// (create new).
    async fn apply_resolved(
        &self,
        pending: &PendingDuplicates,
        matched: &DuplicateMatch,
        merge: bool,
        chat_id: i64,
    ) -> Result<(), AppError> {
        let requester = Requester {
            user_id: pending.user_id.parse().unwrap_or_default(),
            user_name: pending.user_name.clone(),
            chat_id,
            role: pending.role,
        };
        let item_name = if merge {
            matched.existing.name.clone()
        } else {
            matched.item_name.clone()
        };
        let unit = matched.unit.clone().unwrap_or_else(|| "piece".to_string());
        let movement = StockMovement::new(
            item_name,
            pending.movement_type,
            matched.quantity,
            unit,
            &requester,
        );

        match pending.movement_type {
            MovementType::In => self.stock_service.stock_in(&movement).await?,
            MovementType::Out => self.stock_service.stock_out(&movement, pending.role).await?,
            MovementType::Adjust => self.stock_service.stock_adjust(&movement).await?,
        };
        Ok(())
    }
}

#[async_trait]
impl DuplicateService for DuplicateServiceImpl {
    async fn analyze_movements(
        &self,
        movements: &[StockMovement],
    ) -> Result<DuplicateAnalysis, AppError> {
        let items = self.cache.get_all_items().await?;
        tracing::debug!(
            "Scanning {} movements against {} catalogue items",
            movements.len(),
            items.len()
        );

        let mut analysis = DuplicateAnalysis {
            total_items: movements.len(),
            ..Default::default()
        };

        for (i, movement) in movements.iter().enumerate() {
            let mut best: Option<(f64, usize)> = None;
            for (item_idx, item) in items.iter().enumerate() {
                let score = similarity::score(&movement.item_name, &item.name);
                if best.map(|(best_score, _)| score > best_score).unwrap_or(true) {
                    best = Some((score, item_idx));
                }
            }

            let matched = best.and_then(|(score, item_idx)| {
                MatchKind::classify(score).map(|kind| DuplicateMatch {
                    item_name: movement.item_name.clone(),
                    quantity: movement.quantity,
                    unit: Some(movement.unit.clone()),
                    existing: items[item_idx].clone(),
                    score,
                    kind,
                    batch_number: movement.batch_number.unwrap_or(1),
                    item_index: i,
                })
            });

            match matched {
                Some(matched) => {
                    // Availability check for outflows against the matched item
                    if movement.movement_type == MovementType::Out
                        && matched.kind != MatchKind::Fuzzy
                        && matched.existing.on_hand < movement.quantity
                    {
                        analysis.shortfalls.push(StockShortfall {
                            item_name: matched.existing.name.clone(),
                            on_hand: matched.existing.on_hand,
                            requested: movement.quantity,
                            shortfall: movement.quantity - matched.existing.on_hand,
                        });
                    }
                    analysis.duplicates.push(matched);
                },
                None => analysis.non_duplicate_indexes.push(i),
            }
        }

        tracing::info!(
            "Duplicate analysis complete: {} duplicates, {} non-duplicates",
            analysis.duplicates.len(),
            analysis.non_duplicate_indexes.len()
        );
        Ok(analysis)
    }

    async fn process(
        &self,
        movements: Vec<StockMovement>,
        analysis: DuplicateAnalysis,
        policy: DuplicatePolicy,
        requester: &Requester,
    ) -> Result<DuplicateProcessing, AppError> {
        let matches_by_index: HashMap<usize, &DuplicateMatch> = analysis
            .duplicates
            .iter()
            .map(|matched| (matched.item_index, matched))
            .collect();

        let movement_type = movements
            .first()
            .map(|movement| movement.movement_type)
            .unwrap_or(MovementType::In);

        let mut processing = DuplicateProcessing::default();
        let mut parked: Vec<DuplicateMatch> = Vec::new();

        for (i, mut movement) in movements.into_iter().enumerate() {
            let Some(matched) = matches_by_index.get(&i) else {
                processing.remaining.push(movement);
                continue;
            };

            if matched.kind == MatchKind::Exact && policy.auto_merge_exact {
                // Inflows merge immediately: quantity added to the existing
                // item, movement recorded under the catalogue name
                movement.item_name = matched.existing.name.clone();
                if movement_type == MovementType::In {
                    let project = movement.project.clone();
                    match self.stock_service.stock_in(&movement).await {
                        Ok(_) => {
                            if let Err(e) = self.merge_project(matched, project.as_deref()).await {
                                tracing::warn!(
                                    "Project merge failed for {}: {}",
                                    matched.existing.name,
                                    e
                                );
                            }
                            processing.merged_items.push(matched.existing.name.clone());
                            processing.success_count += 1;
                            tracing::info!(
                                "Auto-merged exact duplicate: {}",
                                matched.existing.name
                            );
                        },
                        Err(e) => {
                            processing.failure_count += 1;
                            processing.errors.push(
                                BatchError::new(format!(
                                    "Failed to merge {}: {}",
                                    matched.existing.name, e
                                ))
                                .with_entry(i, matched.existing.name.clone()),
                            );
                        },
                    }
                } else {
                    // Outflows and adjustments proceed through staging under
                    // the matched catalogue name
                    processing.remaining.push(movement);
                }
                continue;
            }

            if policy.require_user_confirmation {
                parked.push((*matched).clone());
            } else {
                processing.remaining.push(movement);
            }
        }

        if !processing.merged_items.is_empty() {
            // Merges changed on-hand levels; drop the snapshot
            self.cache.invalidate().await;
        }

        if !parked.is_empty() {
            let pending = PendingDuplicates {
                matches: parked,
                movement_type,
                user_id: requester.user_id.to_string(),
                user_name: requester.user_name.clone(),
                role: requester.role,
                created_at: Utc::now(),
                confirmed: Vec::new(),
                cancelled: Vec::new(),
                stashed_stocktake: None,
            };
            self.state.insert_duplicates(requester.chat_id, pending).await;
            processing.requires_confirmation = true;
        }

        Ok(processing)
    }

    async fn resolve(
        &self,
        chat_id: i64,
        action: DuplicateAction,
        item_index: Option<usize>,
    ) -> Result<DuplicateResolution, AppError> {
        let mut pending = self.state.get_duplicates(chat_id).await.ok_or_else(|| {
            AppError::NotFound("No pending duplicate confirmations found".to_string())
        })?;

        let total = pending.matches.len();
        let mut failures: Vec<String> = Vec::new();

        match action {
            DuplicateAction::ConfirmAll | DuplicateAction::CancelAll => {
                let undecided: Vec<usize> =
                    (0..total).filter(|i| !pending.is_decided(*i)).collect();
                for index in undecided {
                    if action == DuplicateAction::ConfirmAll {
                        let matched = pending.matches[index].clone();
                        if let Err(e) =
                            self.apply_resolved(&pending, &matched, true, chat_id).await
                        {
                            failures.push(format!("{}: {}", matched.existing.name, e));
                        }
                        pending.confirmed.push(index);
                    } else {
                        pending.cancelled.push(index);
                    }
                }
            },
            DuplicateAction::Confirm | DuplicateAction::CreateNew | DuplicateAction::Cancel => {
                let index = item_index.ok_or_else(|| {
                    AppError::ValidationError("Missing item index for this action".to_string())
                })?;
                if index >= total || pending.is_decided(index) {
                    return Err(AppError::ValidationError("Invalid item index".to_string()));
                }

                match action {
                    DuplicateAction::Confirm => {
                        let matched = pending.matches[index].clone();
                        if let Err(e) =
                            self.apply_resolved(&pending, &matched, true, chat_id).await
                        {
                            failures.push(format!("{}: {}", matched.existing.name, e));
                        }
                        pending.confirmed.push(index);
                    },
                    DuplicateAction::CreateNew => {
                        let matched = pending.matches[index].clone();
                        if let Err(e) =
                            self.apply_resolved(&pending, &matched, false, chat_id).await
                        {
                            failures.push(format!("{}: {}", matched.item_name, e));
                        }
                        pending.confirmed.push(index);
                    },
                    DuplicateAction::Cancel => pending.cancelled.push(index),
                    _ => unreachable!(),
                }
            },
        }

        let confirmed_count = pending.confirmed.len();
        let cancelled_count = pending.cancelled.len();
        let remaining = pending.remaining();
        let all_processed = pending.is_resolved();

        if confirmed_count > 0 {
            self.cache.invalidate().await;
        }

        if all_processed {
            self.state.remove_duplicates(chat_id).await;
        } else {
            self.state.update_duplicates(chat_id, pending).await;
        }

        let mut message = match action {
            DuplicateAction::ConfirmAll | DuplicateAction::CancelAll => {
                format!("Processed {} items", total)
            },
            _ => format!("Processed item {}", item_index.unwrap_or(0) + 1),
        };
        if !failures.is_empty() {
            message.push_str("\nFailures:\n");
            message.push_str(&failures.join("\n"));
        }

        Ok(DuplicateResolution {
            message,
            confirmed_count,
            cancelled_count,
            total,
            remaining,
            all_processed,
        })
    }

    async fn pending_for_chat(&self, chat_id: i64) -> Option<PendingDuplicates> {
        self.state.get_duplicates(chat_id).await
    }

    async fn remove_pending(&self, chat_id: i64) -> Option<PendingDuplicates> {
        self.state.remove_duplicates(chat_id).await
    }
}
