//! Inventory Bot Main Application
//!
//! Wires the catalogue client, the in-process interaction state and the
//! services together and serves the webhook.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_bot_api::auth::AuthService;
use inventory_bot_api::{create_router, AppState};
use inventory_bot_core::services::batch::BatchStockService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::services::stock::StockService;
use inventory_bot_infra::services::{
    ApprovalServiceImpl, BatchStockServiceImpl, DuplicateServiceImpl, InMemoryIdempotencyService,
    InMemoryItemCache, StockServiceImpl, StocktakeServiceImpl, TelegramTransport,
};
use inventory_bot_infra::{AirtableCatalogue, InteractionStore};
use shared_config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let catalogue: Arc<dyn CatalogueStore> = Arc::new(AirtableCatalogue::new(
        &config.catalogue_url,
        &config.catalogue_base_id,
        &config.catalogue_api_key,
        Duration::from_secs(config.catalogue_timeout_seconds),
    )?);

    let state_store = Arc::new(InteractionStore::new());
    let item_cache = Arc::new(InMemoryItemCache::new(
        catalogue.clone(),
        Duration::from_secs(config.cache_ttl_seconds),
    ));
    let idempotency = Arc::new(InMemoryIdempotencyService::new(
        state_store.clone(),
        Duration::from_secs(config.idempotency_ttl_seconds),
    ));

    let stock_service: Arc<dyn StockService> = Arc::new(StockServiceImpl::new(
        catalogue.clone(),
        config.default_approval_threshold,
    ));
    let batch_service: Arc<dyn BatchStockService> = Arc::new(BatchStockServiceImpl::new(
        catalogue.clone(),
        stock_service.clone(),
        state_store.clone(),
    ));
    let approval_service = Arc::new(ApprovalServiceImpl::new(
        catalogue.clone(),
        batch_service.clone(),
    ));
    let duplicate_service = Arc::new(DuplicateServiceImpl::new(
        item_cache.clone(),
        catalogue.clone(),
        stock_service.clone(),
        state_store.clone(),
    ));
    let stocktake_service = Arc::new(StocktakeServiceImpl::new(
        catalogue.clone(),
        item_cache.clone(),
        state_store.clone(),
    ));

    let transport = Arc::new(TelegramTransport::new(&config.bot_token)?);
    let auth = Arc::new(AuthService::new(catalogue.clone(), config.allowed_chats()));

    let app_state = AppState {
        catalogue,
        stock_service,
        batch_service,
        approval_service,
        duplicate_service,
        stocktake_service,
        idempotency,
        transport,
        auth,
        search_sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Inventory bot listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
