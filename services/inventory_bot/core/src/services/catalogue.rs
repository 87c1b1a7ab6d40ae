//! Catalogue store trait
//!
//! The seam to the external spreadsheet-style database. Items and movement
//! records are owned by the store; this service holds only short-lived
//! snapshots and diffs. Every call is a suspension point.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domains::item::Item;
use crate::domains::movement::{MovementStatus, StockMovement};
use crate::domains::stocktake::StocktakeRecord;
use crate::domains::user::UserRole;
use shared_error::AppError;

#[async_trait]
pub trait CatalogueStore: Send + Sync {
    /// Fetch an item by its case-insensitive name
    async fn get_item(&self, name: &str) -> Result<Option<Item>, AppError>;

    /// Fetch the full catalogue
    async fn get_all_items(&self) -> Result<Vec<Item>, AppError>;

    /// Create a catalogue item, returning its record id
    async fn create_item(&self, item: &Item) -> Result<String, AppError>;

    /// Apply a signed delta to an item's on-hand level
    async fn update_item_stock(&self, name: &str, delta: f64) -> Result<(), AppError>;

    /// Replace the comma-joined project list on an item
    async fn update_item_project(&self, name: &str, project: &str) -> Result<(), AppError>;

    /// Re-categorize an item
    async fn update_item_category(&self, name: &str, category: &str) -> Result<(), AppError>;

    /// Record which stocktake last touched the item
    async fn update_item_provenance(
        &self,
        name: &str,
        date: NaiveDate,
        logged_by: &str,
    ) -> Result<(), AppError>;

    /// Persist a movement record, returning its record id
    async fn create_movement(&self, movement: &StockMovement) -> Result<String, AppError>;

    /// Transition a movement's status (approve, reject, void)
    async fn update_movement_status(
        &self,
        movement_id: &str,
        status: MovementStatus,
        actor: &str,
    ) -> Result<(), AppError>;

    /// Persist a stocktake audit record, returning its record id
    async fn create_stocktake(&self, record: &StocktakeRecord) -> Result<String, AppError>;

    /// Look up the role of a chat user; unknown users are viewers
    async fn get_user_role(&self, user_id: i64) -> Result<UserRole, AppError>;

    /// Fuzzy-search the catalogue by name
    async fn search_items(&self, query: &str) -> Result<Vec<Item>, AppError>;
}
