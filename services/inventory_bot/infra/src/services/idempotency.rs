//! In-memory idempotency service
//!
//! Suitable for the single-instance deployment this bot runs as; keys die
//! with the process.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

use inventory_bot_core::services::idempotency::IdempotencyService;

use crate::state::InteractionStore;

pub struct InMemoryIdempotencyService {
    state: Arc<InteractionStore>,
    default_ttl: Duration,
}

impl InMemoryIdempotencyService {
    pub fn new(state: Arc<InteractionStore>, default_ttl: Duration) -> Self {
        Self { state, default_ttl }
    }
}

#[async_trait]
impl IdempotencyService for InMemoryIdempotencyService {
    fn generate_key(&self, content: &str) -> String {
        // Normalize so case and surrounding whitespace differences hash alike
        let normalized = content.trim().to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn is_duplicate(&self, content: &str) -> bool {
        let key = self.generate_key(content);
        let hit = self.state.idempotency_hit(&key, Instant::now()).await;
        if hit {
            tracing::info!("Duplicate request detected for key: {}...", &key[..8]);
        }
        hit
    }

    async fn store_key(&self, content: &str, ttl: Option<Duration>) -> String {
        let key = self.generate_key(content);
        let ttl = ttl.unwrap_or(self.default_ttl);

        if ttl.is_zero() {
            tracing::info!("Zero TTL specified for key: {}..., not storing", &key[..8]);
            return key;
        }

        self.state.store_idempotency_key(key.clone(), ttl).await;
        tracing::debug!("Stored idempotency key: {}... with TTL {:?}", &key[..8], ttl);
        key
    }

    async fn remove_key(&self, content: &str) -> bool {
        let key = self.generate_key(content);
        self.state.remove_idempotency_key(&key).await
    }

    async fn cleanup_expired(&self) -> usize {
        let removed = self.state.cleanup_expired_keys(Instant::now()).await;
        if removed > 0 {
            tracing::info!("Cleaned up {} expired idempotency keys", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl: Duration) -> InMemoryIdempotencyService {
        InMemoryIdempotencyService::new(Arc::new(InteractionStore::new()), ttl)
    }

    #[tokio::test]
    async fn stored_content_is_a_duplicate_until_ttl() {
        let service = service(Duration::from_secs(60));
        assert!(!service.is_duplicate("in cement, 5 bags").await);

        service.store_key("in cement, 5 bags", None).await;
        assert!(service.is_duplicate("in cement, 5 bags").await);
    }

    #[tokio::test]
    async fn expired_keys_are_evicted_on_check() {
        let service = service(Duration::from_millis(10));
        service.store_key("out steel, 2 pieces", None).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!service.is_duplicate("out steel, 2 pieces").await);
        assert_eq!(service.state.idempotency_len().await, 0);
    }

    #[tokio::test]
    async fn zero_ttl_stores_nothing() {
        let service = service(Duration::from_secs(60));
        service.store_key("adjust cement, -2 bags", Some(Duration::ZERO)).await;
        assert!(!service.is_duplicate("adjust cement, -2 bags").await);
    }

    #[tokio::test]
    async fn normalized_equivalent_texts_share_a_key() {
        let service = service(Duration::from_secs(60));
        let a = service.generate_key("  IN cement, 5 bags  ");
        let b = service.generate_key("in cement, 5 bags");
        assert_eq!(a, b);

        service.store_key("  IN cement, 5 bags  ", None).await;
        assert!(service.is_duplicate("in cement, 5 bags").await);
    }

    #[tokio::test]
    async fn cleanup_reports_removed_count() {
        let service = service(Duration::from_millis(5));
        service.store_key("a, 1 piece", None).await;
        service.store_key("b, 1 piece", None).await;
        service.store_key("c, 1 piece", Some(Duration::from_secs(60))).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.cleanup_expired().await, 2);
        assert_eq!(service.state.idempotency_len().await, 1);
    }

    #[tokio::test]
    async fn remove_key_reports_presence() {
        let service = service(Duration::from_secs(60));
        assert!(!service.remove_key("in sand, 1 bag").await);
        service.store_key("in sand, 1 bag", None).await;
        assert!(service.remove_key("in sand, 1 bag").await);
        assert!(!service.is_duplicate("in sand, 1 bag").await);
    }
}
