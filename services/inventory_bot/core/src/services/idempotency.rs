//! Idempotency store trait

use async_trait::async_trait;
use std::time::Duration;

/// Hash-keyed cache of submitted command texts with TTL expiry, used to
/// silently drop duplicate submissions.
#[async_trait]
pub trait IdempotencyService: Send + Sync {
    /// SHA-256 hex digest of the normalized (trimmed, lowercased) text
    fn generate_key(&self, content: &str) -> String;

    /// Whether the content was stored within its TTL. Expired entries are
    /// evicted on check.
    async fn is_duplicate(&self, content: &str) -> bool;

    /// Store the content's key and return it. A zero TTL stores nothing;
    /// `None` uses the configured default.
    async fn store_key(&self, content: &str, ttl: Option<Duration>) -> String;

    /// Remove a stored key; returns whether it existed
    async fn remove_key(&self, content: &str) -> bool;

    /// Evict expired keys, returning how many were removed
    async fn cleanup_expired(&self) -> usize;
}
