//! In-memory catalogue snapshot cache

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use inventory_bot_core::domains::item::Item;
use inventory_bot_core::services::cache::ItemCacheService;
use inventory_bot_core::services::catalogue::CatalogueStore;
use shared_error::AppError;

/// Default snapshot lifetime
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct Snapshot {
    taken_at: Instant,
    items: Vec<Item>,
}

/// Single-snapshot cache over the catalogue. Refetches on expiry; a fetch
/// failure with a stale snapshot present returns the stale snapshot with a
/// warning.
pub struct InMemoryItemCache {
    catalogue: Arc<dyn CatalogueStore>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
}

impl InMemoryItemCache {
    pub fn new(catalogue: Arc<dyn CatalogueStore>, ttl: Duration) -> Self {
        Self {
            catalogue,
            ttl,
            snapshot: RwLock::new(None),
        }
    }
}

#[async_trait]
impl ItemCacheService for InMemoryItemCache {
    async fn get_all_items(&self) -> Result<Vec<Item>, AppError> {
        let now = Instant::now();

        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if now.duration_since(snapshot.taken_at) < self.ttl {
                    return Ok(snapshot.items.clone());
                }
            }
        }

        match self.catalogue.get_all_items().await {
            Ok(items) => {
                let mut guard = self.snapshot.write().await;
                *guard = Some(Snapshot {
                    taken_at: now,
                    items: items.clone(),
                });
                Ok(items)
            },
            Err(e) => {
                let guard = self.snapshot.read().await;
                match guard.as_ref() {
                    Some(snapshot) => {
                        tracing::warn!("Catalogue fetch failed, serving stale snapshot: {}", e);
                        Ok(snapshot.items.clone())
                    },
                    None => Err(e),
                }
            },
        }
    }

    async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }
}
