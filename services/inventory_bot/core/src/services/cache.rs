//! Catalogue snapshot cache trait

use async_trait::async_trait;

use crate::domains::item::Item;
use shared_error::AppError;

/// Short-TTL snapshot of the catalogue, used exclusively by the duplicate
/// engine. Stale reads are explicitly allowed: on a refetch failure with a
/// stale snapshot present, the stale snapshot is returned with a warning.
#[async_trait]
pub trait ItemCacheService: Send + Sync {
    async fn get_all_items(&self) -> Result<Vec<Item>, AppError>;

    /// Drop the snapshot so the next read refetches
    async fn invalidate(&self);
}
