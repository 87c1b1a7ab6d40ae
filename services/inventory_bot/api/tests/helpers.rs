//! Shared helpers for the command-flow integration tests

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

use inventory_bot_api::auth::AuthService;
use inventory_bot_api::AppState;
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementStatus, StockMovement};
use inventory_bot_core::domains::stocktake::StocktakeRecord;
use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::dto::reply::Reply;
use inventory_bot_core::services::batch::BatchStockService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::stock::StockService;
use inventory_bot_core::services::transport::ChatTransport;
use inventory_bot_core::similarity;
use inventory_bot_infra::services::{
    ApprovalServiceImpl, BatchStockServiceImpl, DuplicateServiceImpl, InMemoryIdempotencyService,
    InMemoryItemCache, StockServiceImpl, StocktakeServiceImpl,
};
use inventory_bot_infra::InteractionStore;
use shared_error::AppError;

pub const STAFF_USER: i64 = 100;
pub const ADMIN_USER: i64 = 200;
pub const CHAT: i64 = 555;

/// In-memory catalogue store standing in for the cloud spreadsheet
#[derive(Default)]
pub struct InMemoryCatalogue {
    pub items: Mutex<HashMap<String, Item>>,
    pub movements: Mutex<Vec<StockMovement>>,
    pub stocktakes: Mutex<Vec<StocktakeRecord>>,
    pub roles: Mutex<HashMap<i64, UserRole>>,
    next_id: AtomicUsize,
}

impl InMemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_item(&self, item: Item) {
        self.items.lock().unwrap().insert(item.name.to_lowercase(), item);
    }

    pub fn seed_role(&self, user_id: i64, role: UserRole) {
        self.roles.lock().unwrap().insert(user_id, role);
    }

    pub fn item(&self, name: &str) -> Option<Item> {
        self.items.lock().unwrap().get(&name.to_lowercase()).cloned()
    }

    pub fn movements(&self) -> Vec<StockMovement> {
        self.movements.lock().unwrap().clone()
    }

    pub fn stocktakes(&self) -> Vec<StocktakeRecord> {
        self.stocktakes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogueStore for InMemoryCatalogue {
    async fn get_item(&self, name: &str) -> Result<Option<Item>, AppError> {
        Ok(self.items.lock().unwrap().get(&name.to_lowercase()).cloned())
    }

    async fn get_all_items(&self) -> Result<Vec<Item>, AppError> {
        Ok(self.items.lock().unwrap().values().cloned().collect())
    }

    async fn create_item(&self, item: &Item) -> Result<String, AppError> {
        self.items
            .lock()
            .unwrap()
            .insert(item.name.to_lowercase(), item.clone());
        Ok(format!("item-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn update_item_stock(&self, name: &str, delta: f64) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("Item '{}' not found", name)))?;
        item.on_hand += delta;
        Ok(())
    }

    async fn update_item_project(&self, name: &str, project: &str) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("Item '{}' not found", name)))?;
        item.project = Some(project.to_string());
        Ok(())
    }

    async fn update_item_category(&self, name: &str, category: &str) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("Item '{}' not found", name)))?;
        item.category = Some(category.to_string());
        Ok(())
    }

    async fn update_item_provenance(
        &self,
        name: &str,
        date: NaiveDate,
        logged_by: &str,
    ) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("Item '{}' not found", name)))?;
        item.last_stocktake_date = Some(date);
        item.last_stocktake_by = Some(logged_by.to_string());
        Ok(())
    }

    async fn create_movement(&self, movement: &StockMovement) -> Result<String, AppError> {
        let id = format!("mov-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut stored = movement.clone();
        stored.id = Some(id.clone());
        self.movements.lock().unwrap().push(stored);
        Ok(id)
    }

    async fn update_movement_status(
        &self,
        movement_id: &str,
        status: MovementStatus,
        _actor: &str,
    ) -> Result<(), AppError> {
        let mut movements = self.movements.lock().unwrap();
        let movement = movements
            .iter_mut()
            .find(|movement| movement.id.as_deref() == Some(movement_id))
            .ok_or_else(|| AppError::NotFound(format!("Movement {} not found", movement_id)))?;
        movement.status = status;
        Ok(())
    }

    async fn create_stocktake(&self, record: &StocktakeRecord) -> Result<String, AppError> {
        self.stocktakes.lock().unwrap().push(record.clone());
        Ok(format!("st-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn get_user_role(&self, user_id: i64) -> Result<UserRole, AppError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .unwrap_or(UserRole::Viewer))
    }

    async fn search_items(&self, query: &str) -> Result<Vec<Item>, AppError> {
        let query_lower = query.to_lowercase();
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|item| {
                item.name.to_lowercase().contains(&query_lower)
                    || similarity::score(query, &item.name) >= 0.5
            })
            .cloned()
            .collect())
    }
}

/// Transport that records every outbound reply
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(i64, Reply)>>,
}

impl RecordingTransport {
    pub fn replies(&self) -> Vec<(i64, Reply)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<(), AppError> {
        self.sent.lock().unwrap().push((chat_id, reply));
        Ok(())
    }
}

/// Build a fully wired application state over the in-memory store, with a
/// staff user and an admin user seeded.
pub fn build_state() -> (AppState, Arc<InMemoryCatalogue>, Arc<RecordingTransport>) {
    let catalogue = Arc::new(InMemoryCatalogue::new());
    catalogue.seed_role(STAFF_USER, UserRole::Staff);
    catalogue.seed_role(ADMIN_USER, UserRole::Admin);

    let store: Arc<dyn CatalogueStore> = catalogue.clone();
    let state_store = Arc::new(InteractionStore::new());
    let item_cache = Arc::new(InMemoryItemCache::new(store.clone(), Duration::from_secs(300)));
    let idempotency = Arc::new(InMemoryIdempotencyService::new(
        state_store.clone(),
        Duration::from_secs(3600),
    ));

    let stock_service: Arc<dyn StockService> = Arc::new(StockServiceImpl::new(store.clone(), 100.0));
    let batch_service: Arc<dyn BatchStockService> = Arc::new(BatchStockServiceImpl::new(
        store.clone(),
        stock_service.clone(),
        state_store.clone(),
    ));
    let approval_service = Arc::new(ApprovalServiceImpl::new(store.clone(), batch_service.clone()));
    let duplicate_service = Arc::new(DuplicateServiceImpl::new(
        item_cache.clone(),
        store.clone(),
        stock_service.clone(),
        state_store.clone(),
    ));
    let stocktake_service = Arc::new(StocktakeServiceImpl::new(
        store.clone(),
        item_cache.clone(),
        state_store.clone(),
    ));

    let transport = Arc::new(RecordingTransport::default());
    let auth = Arc::new(AuthService::new(store.clone(), Vec::new()));

    let state = AppState {
        catalogue: store,
        stock_service,
        batch_service,
        approval_service,
        duplicate_service,
        stocktake_service,
        idempotency,
        transport: transport.clone(),
        auth,
        search_sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    (state, catalogue, transport)
}

/// Pull the batch id out of an approval prompt's buttons
pub fn batch_id_from(reply: &Reply) -> Option<String> {
    reply
        .buttons
        .iter()
        .flatten()
        .find_map(|button| button.callback.strip_prefix("approvebatch:").map(str::to_string))
}

/// A seeded item with the given level
pub fn item_with_stock(name: &str, on_hand: f64, unit_size: f64, unit_type: &str) -> Item {
    let mut item = Item::new(name);
    item.on_hand = on_hand;
    item.unit_size = unit_size;
    item.unit_type = unit_type.to_string();
    item
}
