//! Movement executor
//!
//! Applies one approved movement to the catalogue: validation, unit
//! derivation, the stock recompute, and the record write. Items are
//! auto-created on first inflow with unit metadata extracted from the name.

use async_trait::async_trait;
use std::sync::Arc;

use inventory_bot_core::domains::category;
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementStatus, StockMovement};
use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::dto::stock::MovementOutcome;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::stock::StockService;
use inventory_bot_core::similarity;
use shared_error::AppError;

pub struct StockServiceImpl {
    catalogue: Arc<dyn CatalogueStore>,
    default_large_qty_threshold: f64,
}

impl StockServiceImpl {
    pub fn new(catalogue: Arc<dyn CatalogueStore>, default_large_qty_threshold: f64) -> Self {
        Self {
            catalogue,
            default_large_qty_threshold,
        }
    }

    /// Unit conversion is a stub: when the entered unit differs from the
    /// item's unit type the entered quantity is used as-is and a warning is
    /// logged. Both the entered unit and the base quantity are persisted.
    fn to_base_quantity(item: &Item, quantity: f64, unit: &str) -> f64 {
        if unit != item.unit_type && unit != "piece" {
            tracing::warn!(
                "Unit conversion not implemented for {}: entered '{}', item unit '{}'; \
                 using entered quantity",
                item.name,
                unit,
                item.unit_type
            );
        }
        quantity
    }

    /// Create the catalogue entry for a first-seen item: unit size and type
    /// from the trailing `<number><unit>` pattern, category from keyword
    /// heuristics.
    async fn auto_create_item(&self, name: &str) -> Result<Item, AppError> {
        let (unit_size, unit_type) = similarity::extract_unit_spec(name);
        let detected = category::detect(name);

        let mut item = Item::new(name);
        item.unit_size = unit_size;
        item.unit_type = unit_type;
        item.category = Some(detected.to_string());
        item.large_qty_threshold = Some(self.default_large_qty_threshold);

        self.catalogue.create_item(&item).await?;
        tracing::info!(
            "Auto-created item '{}' (category: {}, unit: {} {})",
            name,
            detected,
            item.unit_size,
            item.unit_type
        );
        Ok(item)
    }

    fn movement_category(item: &Item) -> String {
        item.category
            .clone()
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| category::detect(&item.name).to_string())
    }

    /// Confirmation line with the total-volume expansion for sized units
    fn describe(action: &str, movement: &StockMovement, item: &Item) -> String {
        let category_info = match &item.category {
            Some(category) if !category.is_empty() => format!(" (Category: {})", category),
            _ => String::new(),
        };
        if item.has_unit_spec() {
            let total_volume = movement.quantity.abs() * item.unit_size;
            format!(
                "{}: {} units x {} {} = {} {} of {}{} recorded.",
                action,
                movement.quantity,
                item.unit_size,
                item.unit_type,
                total_volume,
                item.unit_type,
                movement.item_name,
                category_info
            )
        } else {
            format!(
                "{}: {} {} of {}{} recorded.",
                action, movement.quantity, movement.unit, movement.item_name, category_info
            )
        }
    }

    fn low_stock_warning(item: &Item, after_level: f64) -> Option<String> {
        match item.reorder_threshold {
            Some(threshold) if after_level < threshold => Some(format!(
                "{} is below its reorder threshold: {} on hand, threshold {}",
                item.name, after_level, threshold
            )),
            _ => None,
        }
    }

    fn check_large_quantity(&self, item: &Item, quantity: f64) -> Option<String> {
        let threshold = item
            .large_qty_threshold
            .unwrap_or(self.default_large_qty_threshold);
        if quantity.abs() > threshold {
            Some(format!(
                "Large quantity: {} exceeds the item threshold of {}.",
                quantity, threshold
            ))
        } else {
            None
        }
    }

    /// Persist the movement (Posted) and apply its signed delta to the item
    async fn post_movement(
        &self,
        movement: &StockMovement,
        item: &Item,
        signed_delta: f64,
    ) -> Result<String, AppError> {
        let mut record = movement.clone();
        record.status = MovementStatus::Posted;
        record.signed_base_quantity = signed_delta;
        record.unit_size = Some(item.unit_size);
        record.unit_type = Some(item.unit_type.clone());
        record.category = Some(Self::movement_category(item));

        let movement_id = self.catalogue.create_movement(&record).await?;
        self.catalogue
            .update_item_stock(&item.name, signed_delta)
            .await?;
        Ok(movement_id)
    }
}

#[async_trait]
impl StockService for StockServiceImpl {
    async fn stock_in(&self, movement: &StockMovement) -> Result<MovementOutcome, AppError> {
        let existing = self.catalogue.get_item(&movement.item_name).await?;
        let item = match existing {
            Some(item) => {
                if let Err(msg) = item.validate_structure() {
                    tracing::warn!("Item structure validation failed for {}: {}", item.name, msg);
                }
                item
            },
            None => self.auto_create_item(&movement.item_name).await?,
        };

        let before_level = item.on_hand;
        let base_quantity = Self::to_base_quantity(&item, movement.quantity, &movement.unit);
        let movement_id = self.post_movement(movement, &item, base_quantity).await?;
        let after_level = before_level + base_quantity;

        let mut message = Self::describe("Stock in", movement, &item);
        if let Some(warning) = self.check_large_quantity(&item, movement.quantity) {
            message.push(' ');
            message.push_str(&warning);
        }

        Ok(MovementOutcome {
            message,
            movement_id: Some(movement_id),
            before_level,
            after_level,
            low_stock_warning: Self::low_stock_warning(&item, after_level),
        })
    }

    async fn stock_out(
        &self,
        movement: &StockMovement,
        role: UserRole,
    ) -> Result<MovementOutcome, AppError> {
        let item = self
            .catalogue
            .get_item(&movement.item_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Item '{}' not found.", movement.item_name))
            })?;

        if let Err(msg) = item.validate_structure() {
            tracing::warn!("Item structure validation failed for {}: {}", item.name, msg);
        }

        let before_level = item.on_hand;
        let base_quantity = Self::to_base_quantity(&item, movement.quantity, &movement.unit);

        if item.on_hand < base_quantity && !role.is_admin() {
            let message = if item.has_unit_spec() {
                let current_volume = item.total_volume();
                let requested_volume = base_quantity * item.unit_size;
                format!(
                    "Insufficient stock. Current: {} units x {} {} = {} {}, Requested: {} units \
                     x {} {} = {} {}. Admin approval required for negative stock.",
                    item.on_hand,
                    item.unit_size,
                    item.unit_type,
                    current_volume,
                    item.unit_type,
                    base_quantity,
                    item.unit_size,
                    item.unit_type,
                    requested_volume,
                    item.unit_type
                )
            } else {
                format!(
                    "Insufficient stock. Current: {} {}, Requested: {} {}. \
                     Admin approval required for negative stock.",
                    item.on_hand, item.unit_type, base_quantity, item.unit_type
                )
            };
            return Err(AppError::ValidationError(message));
        }

        let movement_id = self.post_movement(movement, &item, -base_quantity).await?;
        let after_level = before_level - base_quantity;

        let mut message = Self::describe("Stock out", movement, &item);
        if let Some(warning) = self.check_large_quantity(&item, movement.quantity) {
            message.push(' ');
            message.push_str(&warning);
        }

        Ok(MovementOutcome {
            message,
            movement_id: Some(movement_id),
            before_level,
            after_level,
            low_stock_warning: Self::low_stock_warning(&item, after_level),
        })
    }

    async fn stock_adjust(&self, movement: &StockMovement) -> Result<MovementOutcome, AppError> {
        let item = self
            .catalogue
            .get_item(&movement.item_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Item '{}' not found.", movement.item_name))
            })?;

        let before_level = item.on_hand;
        let base_quantity = Self::to_base_quantity(&item, movement.quantity, &movement.unit);
        let movement_id = self.post_movement(movement, &item, base_quantity).await?;
        let after_level = before_level + base_quantity;

        Ok(MovementOutcome {
            message: Self::describe("Stock adjustment", movement, &item),
            movement_id: Some(movement_id),
            before_level,
            after_level,
            low_stock_warning: Self::low_stock_warning(&item, after_level),
        })
    }

    async fn current_stock(&self, item_name: &str) -> Result<Item, AppError> {
        self.catalogue
            .get_item(item_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item '{}' not found.", item_name)))
    }
}
