//! Shared mockall mocks for the store and service seams

use mockall::mock;

use chrono::NaiveDate;
use inventory_bot_core::domains::batch::{BatchApproval, GlobalParams};
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementStatus, StockMovement};
use inventory_bot_core::domains::stocktake::StocktakeRecord;
use inventory_bot_core::domains::user::{Requester, UserRole};
use inventory_bot_core::dto::batch::{BatchResult, PendingSummary};
use inventory_bot_core::dto::stock::MovementOutcome;
use inventory_bot_core::services::batch::BatchStockService;
use inventory_bot_core::services::cache::ItemCacheService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::stock::StockService;
use shared_error::AppError;

mock! {
    pub Catalogue {}

    #[async_trait::async_trait]
    impl CatalogueStore for Catalogue {
        async fn get_item(&self, name: &str) -> Result<Option<Item>, AppError>;
        async fn get_all_items(&self) -> Result<Vec<Item>, AppError>;
        async fn create_item(&self, item: &Item) -> Result<String, AppError>;
        async fn update_item_stock(&self, name: &str, delta: f64) -> Result<(), AppError>;
        async fn update_item_project(&self, name: &str, project: &str) -> Result<(), AppError>;
        async fn update_item_category(&self, name: &str, category: &str) -> Result<(), AppError>;
        async fn update_item_provenance(
            &self,
            name: &str,
            date: NaiveDate,
            logged_by: &str,
        ) -> Result<(), AppError>;
        async fn create_movement(&self, movement: &StockMovement) -> Result<String, AppError>;
        async fn update_movement_status(
            &self,
            movement_id: &str,
            status: MovementStatus,
            actor: &str,
        ) -> Result<(), AppError>;
        async fn create_stocktake(&self, record: &StocktakeRecord) -> Result<String, AppError>;
        async fn get_user_role(&self, user_id: i64) -> Result<UserRole, AppError>;
        async fn search_items(&self, query: &str) -> Result<Vec<Item>, AppError>;
    }
}

mock! {
    pub Cache {}

    #[async_trait::async_trait]
    impl ItemCacheService for Cache {
        async fn get_all_items(&self) -> Result<Vec<Item>, AppError>;
        async fn invalidate(&self);
    }
}

mock! {
    pub Stock {}

    #[async_trait::async_trait]
    impl StockService for Stock {
        async fn stock_in(&self, movement: &StockMovement) -> Result<MovementOutcome, AppError>;
        async fn stock_out(
            &self,
            movement: &StockMovement,
            role: UserRole,
        ) -> Result<MovementOutcome, AppError>;
        async fn stock_adjust(&self, movement: &StockMovement) -> Result<MovementOutcome, AppError>;
        async fn current_stock(&self, item_name: &str) -> Result<Item, AppError>;
    }
}

mock! {
    pub Batch {}

    #[async_trait::async_trait]
    impl BatchStockService for Batch {
        async fn prepare_batch_approval(
            &self,
            movements: Vec<StockMovement>,
            requester: &Requester,
            global_params: GlobalParams,
        ) -> Result<BatchApproval, AppError>;
        async fn process_batch_movements(
            &self,
            movements: &[StockMovement],
            role: UserRole,
        ) -> BatchResult;
        async fn get_batch_approval(&self, batch_id: &str) -> Option<BatchApproval>;
        async fn remove_batch_approval(&self, batch_id: &str) -> bool;
        async fn pending_summary(&self) -> PendingSummary;
    }
}

/// A staff requester for tests
pub fn staff_requester() -> Requester {
    Requester {
        user_id: 7,
        user_name: "Trevor".to_string(),
        chat_id: 42,
        role: UserRole::Staff,
    }
}

/// A simple movement outcome for stubbing executor calls
pub fn outcome(movement_id: &str, before: f64, after: f64) -> MovementOutcome {
    MovementOutcome {
        message: "ok".to_string(),
        movement_id: Some(movement_id.to_string()),
        before_level: before,
        after_level: after,
        low_stock_warning: None,
    }
}
