//! Stocktake service
//!
//! Cumulative stock-takes: each counted quantity is added to the existing
//! on-hand level. Every applied entry leaves an audit record; items counted
//! for the first time are created with unit metadata extracted from their
//! names.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use inventory_bot_core::domains::category;
use inventory_bot_core::domains::duplicate::{DuplicateMatch, MatchKind, PendingDuplicates};
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::MovementType;
use inventory_bot_core::domains::stocktake::{StocktakeParse, StocktakeRecord};
use inventory_bot_core::domains::user::Requester;
use inventory_bot_core::dto::stocktake::{StocktakeOptions, StocktakeOutcome, StocktakeSummary};
use inventory_bot_core::parser::StocktakeParser;
use inventory_bot_core::services::cache::ItemCacheService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::stocktake::StocktakeService;
use inventory_bot_core::similarity;
use shared_error::AppError;

use crate::state::InteractionStore;

pub struct StocktakeServiceImpl {
    catalogue: Arc<dyn CatalogueStore>,
    cache: Arc<dyn ItemCacheService>,
    state: Arc<InteractionStore>,
    parser: StocktakeParser,
}

impl StocktakeServiceImpl {
    pub fn new(
        catalogue: Arc<dyn CatalogueStore>,
        cache: Arc<dyn ItemCacheService>,
        state: Arc<InteractionStore>,
    ) -> Self {
        Self {
            catalogue,
            cache,
            state,
            parser: StocktakeParser::new(),
        }
    }

    fn parse_error_message(&self, command_text: &str, parse: &StocktakeParse) -> String {
        let mut message = String::from("Inventory command parse errors:\n");
        for error in &parse.errors {
            message.push_str(&format!("- {}\n", error));
        }

        if parse.blank_lines > 0 {
            message.push_str(&format!("{} blank lines ignored\n", parse.blank_lines));
        }
        if parse.comment_lines > 0 {
            message.push_str(&format!("{} comment lines ignored\n", parse.comment_lines));
        }

        message.push_str(
            "\nExpected format:\n\
             inventory logged by: NAME1,NAME2 [date:DD/MM/YY] [category: CATEGORY]\n\
             Item Name, Quantity\n\
             Item Name, Quantity\n\
             \nDate is optional and defaults to today. Comment lines starting with # and \
             blank lines are ignored. Maximum 50 entries allowed.",
        );

        if let Some(template) = self.parser.corrected_template(command_text) {
            message.push_str(&format!("\n\nCorrected template:\n{}", template));
        }
        message
    }

    fn validation_report(parse: &StocktakeParse) -> String {
        let header = parse.header.as_ref().expect("validated parse has a header");

        let mut report = String::from("Inventory command validation successful.\n");
        report.push_str(&format!(
            "Date: {} (normalized to {})\n",
            header.date, header.normalized_date
        ));
        report.push_str(&format!("Logged by: {}\n", header.logged_by.join(", ")));
        if let Some(category) = &header.category {
            report.push_str(&format!("Category override: {}\n", category));
        }
        report.push_str(&format!("Total lines: {}\n", parse.total_lines));
        report.push_str(&format!("Valid entries: {}\n", parse.valid_entries));
        if parse.blank_lines > 0 {
            report.push_str(&format!("{} blank lines ignored\n", parse.blank_lines));
        }
        if parse.comment_lines > 0 {
            report.push_str(&format!("{} comment lines ignored\n", parse.comment_lines));
        }

        report.push_str("\nParsed entries:\n");
        for entry in &parse.entries {
            let detected = match &header.category {
                Some(category) => category::normalize_override(category),
                None => category::detect(&entry.item_name),
            };
            report.push_str(&format!("- {} ({}): {}\n", entry.item_name, detected, entry.quantity));
        }
        report.push_str("\nReady to apply. Run the same command without 'validate' to process.");
        report
    }

    /// Scan entries for existing items with similar but not identical names
    async fn find_duplicates(&self, parse: &StocktakeParse) -> Result<Vec<DuplicateMatch>, AppError> {
        let items = self.cache.get_all_items().await?;
        let mut matches = Vec::new();

        for (i, entry) in parse.entries.iter().enumerate() {
            let mut best: Option<(f64, &Item)> = None;
            for item in &items {
                if item.name.eq_ignore_ascii_case(&entry.item_name) {
                    continue;
                }
                let score = similarity::score(&entry.item_name, &item.name);
                if best.map(|(best_score, _)| score > best_score).unwrap_or(true) {
                    best = Some((score, item));
                }
            }
            if let Some((score, item)) = best {
                if score >= MatchKind::SIMILAR_THRESHOLD {
                    matches.push(DuplicateMatch {
                        item_name: entry.item_name.clone(),
                        quantity: entry.quantity,
                        unit: None,
                        existing: item.clone(),
                        score,
                        kind: MatchKind::classify(score).expect("score above threshold"),
                        batch_number: 1,
                        item_index: i,
                    });
                }
            }
        }
        Ok(matches)
    }

    async fn apply(
        &self,
        parse: &StocktakeParse,
        requester: &Requester,
    ) -> Result<StocktakeSummary, AppError> {
        let header = parse.header.as_ref().expect("valid parse has a header");
        let batch_id = Uuid::new_v4().to_string();
        let logged_by = header.logged_by.join(", ");

        let mut summary = StocktakeSummary::default();
        let mut update_lines: Vec<String> = Vec::new();
        let mut failure_lines: Vec<String> = Vec::new();

        for entry in &parse.entries {
            let existing = match self.catalogue.get_item(&entry.item_name).await {
                Ok(existing) => existing,
                Err(e) => {
                    summary.failed_items += 1;
                    failure_lines.push(format!("{}: {}", entry.item_name, e));
                    continue;
                },
            };

            let (item_name, previous, created) = match existing {
                Some(item) => {
                    // Category override re-routes already-known items
                    if let Some(raw) = &header.category {
                        let normalized = category::normalize_override(raw);
                        if item.category.as_deref() != Some(normalized) {
                            if let Err(e) = self
                                .catalogue
                                .update_item_category(&item.name, normalized)
                                .await
                            {
                                tracing::warn!(
                                    "Failed to update category for {}: {}",
                                    item.name,
                                    e
                                );
                            }
                        }
                    }
                    (item.name.clone(), item.on_hand, false)
                },
                None => {
                    let (unit_size, unit_type) = similarity::extract_unit_spec(&entry.item_name);
                    let detected = match &header.category {
                        Some(raw) => category::normalize_override(raw),
                        None => category::detect(&entry.item_name),
                    };
                    let mut item = Item::new(entry.item_name.clone());
                    item.unit_size = unit_size;
                    item.unit_type = unit_type;
                    item.category = Some(detected.to_string());

                    if let Err(e) = self.catalogue.create_item(&item).await {
                        summary.failed_items += 1;
                        failure_lines.push(format!("{}: {}", entry.item_name, e));
                        continue;
                    }
                    tracing::info!(
                        "Created item {} with category {} (unit: {} {})",
                        item.name,
                        detected,
                        item.unit_size,
                        item.unit_type
                    );
                    (item.name, 0.0, true)
                },
            };

            if let Err(e) = self.catalogue.update_item_stock(&item_name, entry.quantity).await {
                summary.failed_items += 1;
                failure_lines.push(format!("{}: {}", item_name, e));
                continue;
            }

            if let Err(e) = self
                .catalogue
                .update_item_provenance(&item_name, header.normalized_date, &logged_by)
                .await
            {
                tracing::warn!("Failed to update provenance for {}: {}", item_name, e);
            }

            let record = StocktakeRecord::cumulative(
                batch_id.clone(),
                header.normalized_date,
                item_name.clone(),
                entry.quantity,
                previous,
                requester.user_name.clone(),
            );
            if let Err(e) = self.catalogue.create_stocktake(&record).await {
                // The stock update already went through; audit loss is logged
                tracing::error!("Failed to create stocktake audit record: {}", e);
            }

            update_lines.push(format!(
                "{}: +{} (was {}, now {})",
                item_name, entry.quantity, previous, record.new_on_hand
            ));
            summary.records.push(record);
            if created {
                summary.created_items += 1;
            } else {
                summary.updated_items += 1;
            }
        }

        let mut message = String::from("Inventory stocktake complete.\n");
        message.push_str(&format!(
            "Date: {} (normalized to {})\n",
            header.date, header.normalized_date
        ));
        message.push_str(&format!("Logged by: {}\n", logged_by));
        message.push_str(&format!("Batch: {}\n", batch_id));
        message.push_str(&format!(
            "Items updated: {}, created: {}, failed: {}\n",
            summary.updated_items, summary.created_items, summary.failed_items
        ));
        if parse.blank_lines > 0 || parse.comment_lines > 0 {
            message.push_str(&format!(
                "{} blank and {} comment lines ignored\n",
                parse.blank_lines, parse.comment_lines
            ));
        }
        if !update_lines.is_empty() {
            message.push_str("\nStock updates (cumulative):\n");
            for line in update_lines.iter().take(5) {
                message.push_str(&format!("- {}\n", line));
            }
            if update_lines.len() > 5 {
                message.push_str(&format!("... and {} more items\n", update_lines.len() - 5));
            }
        }
        if !failure_lines.is_empty() {
            message.push_str("\nFailed items:\n");
            for line in &failure_lines {
                message.push_str(&format!("- {}\n", line));
            }
        }
        summary.message = message;

        Ok(summary)
    }
}

#[async_trait]
impl StocktakeService for StocktakeServiceImpl {
    async fn process(
        &self,
        command_text: &str,
        requester: &Requester,
        options: StocktakeOptions,
    ) -> Result<StocktakeOutcome, AppError> {
        let parse = self.parser.parse(command_text);

        if !parse.is_valid {
            return Err(AppError::ParseError(self.parse_error_message(command_text, &parse)));
        }

        if options.validate_only {
            return Ok(StocktakeOutcome::Validated(Self::validation_report(&parse)));
        }

        if !options.skip_duplicate_check {
            let duplicates = self.find_duplicates(&parse).await?;
            if !duplicates.is_empty() {
                let mut prompt = String::from(
                    "Potential duplicates found in your stocktake:\n",
                );
                for matched in &duplicates {
                    prompt.push_str(&format!(
                        "- '{}' looks like existing item '{}' ({:.0}% match)\n",
                        matched.item_name,
                        matched.existing.name,
                        matched.score * 100.0
                    ));
                }
                prompt.push_str(
                    "\nConfirm to apply the stocktake as entered, or cancel to abort.",
                );

                let pending = PendingDuplicates {
                    matches: duplicates.clone(),
                    movement_type: MovementType::Adjust,
                    user_id: requester.user_id.to_string(),
                    user_name: requester.user_name.clone(),
                    role: requester.role,
                    created_at: Utc::now(),
                    confirmed: Vec::new(),
                    cancelled: Vec::new(),
                    stashed_stocktake: Some(command_text.to_string()),
                };
                self.state.insert_duplicates(requester.chat_id, pending).await;

                return Ok(StocktakeOutcome::NeedsConfirmation {
                    duplicates,
                    prompt,
                });
            }
        }

        let summary = self.apply(&parse, requester).await?;
        self.cache.invalidate().await;
        Ok(StocktakeOutcome::Applied(summary))
    }
}
