//! Movement executor trait

use async_trait::async_trait;

use crate::domains::item::Item;
use crate::domains::movement::StockMovement;
use crate::domains::user::UserRole;
use crate::dto::stock::MovementOutcome;
use shared_error::AppError;

/// Per-movement validation, unit derivation, stock recompute and record
/// write.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Record an inflow. The item is auto-created if absent, with unit
    /// size/type extracted from the name and a detected category.
    async fn stock_in(&self, movement: &StockMovement) -> Result<MovementOutcome, AppError>;

    /// Record an outflow in `Requested` status. Fails with an
    /// insufficient-stock error when the requester is not an admin and the
    /// quantity exceeds the on-hand level.
    async fn stock_out(
        &self,
        movement: &StockMovement,
        role: UserRole,
    ) -> Result<MovementOutcome, AppError>;

    /// Record a signed adjustment in `Requested` status
    async fn stock_adjust(&self, movement: &StockMovement) -> Result<MovementOutcome, AppError>;

    /// Current stock for an item
    async fn current_stock(&self, item_name: &str) -> Result<Item, AppError>;
}
