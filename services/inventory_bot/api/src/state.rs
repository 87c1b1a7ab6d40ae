//! Application state shared across handlers

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use inventory_bot_core::services::approvals::ApprovalService;
use inventory_bot_core::services::batch::BatchStockService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::duplicates::DuplicateService;
use inventory_bot_core::services::idempotency::IdempotencyService;
use inventory_bot_core::services::stock::StockService;
use inventory_bot_core::services::stocktake::StocktakeService;
use inventory_bot_core::services::transport::ChatTransport;

use crate::auth::AuthService;

/// Results of the last `stock` search per chat, so item-detail and
/// pagination callbacks can resolve their indexes
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    pub query: String,
    pub query_hash: String,
    pub item_names: Vec<String>,
}

/// Application state for the inventory bot
#[derive(Clone)]
pub struct AppState {
    pub catalogue: Arc<dyn CatalogueStore>,
    pub stock_service: Arc<dyn StockService>,
    pub batch_service: Arc<dyn BatchStockService>,
    pub approval_service: Arc<dyn ApprovalService>,
    pub duplicate_service: Arc<dyn DuplicateService>,
    pub stocktake_service: Arc<dyn StocktakeService>,
    pub idempotency: Arc<dyn IdempotencyService>,
    pub transport: Arc<dyn ChatTransport>,
    pub auth: Arc<AuthService>,
    pub search_sessions: Arc<RwLock<HashMap<i64, SearchSession>>>,
}
