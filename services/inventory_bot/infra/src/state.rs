//! Consolidated in-process interaction state
//!
//! One struct owns the three shared mutable maps of the service: pending
//! batch approvals (by batch id), pending duplicate dialogues (by chat id),
//! and idempotency keys (by digest). Concurrent reads are allowed;
//! mutations serialize through the write locks. Everything here is lost on
//! restart — the user re-submits.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use inventory_bot_core::domains::batch::BatchApproval;
use inventory_bot_core::domains::duplicate::PendingDuplicates;

/// A stored idempotency key with its own TTL
#[derive(Debug, Clone)]
pub struct StoredKey {
    pub created_at: Instant,
    pub ttl: Duration,
}

impl StoredKey {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

/// Shared interaction state for the whole process
#[derive(Debug, Default)]
pub struct InteractionStore {
    pending_approvals: RwLock<HashMap<String, BatchApproval>>,
    pending_duplicates: RwLock<HashMap<i64, PendingDuplicates>>,
    idempotency_keys: RwLock<HashMap<String, StoredKey>>,
}

impl InteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Pending batch approvals
    // ------------------------------------------------------------------

    pub async fn insert_approval(&self, approval: BatchApproval) {
        self.pending_approvals
            .write()
            .await
            .insert(approval.batch_id.clone(), approval);
    }

    pub async fn get_approval(&self, batch_id: &str) -> Option<BatchApproval> {
        self.pending_approvals.read().await.get(batch_id).cloned()
    }

    pub async fn remove_approval(&self, batch_id: &str) -> Option<BatchApproval> {
        self.pending_approvals.write().await.remove(batch_id)
    }

    pub async fn approvals_snapshot(&self) -> Vec<BatchApproval> {
        self.pending_approvals.read().await.values().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Pending duplicate dialogues
    // ------------------------------------------------------------------

    pub async fn insert_duplicates(&self, chat_id: i64, pending: PendingDuplicates) {
        self.pending_duplicates.write().await.insert(chat_id, pending);
    }

    pub async fn get_duplicates(&self, chat_id: i64) -> Option<PendingDuplicates> {
        self.pending_duplicates.read().await.get(&chat_id).cloned()
    }

    pub async fn update_duplicates(&self, chat_id: i64, pending: PendingDuplicates) {
        self.pending_duplicates.write().await.insert(chat_id, pending);
    }

    pub async fn remove_duplicates(&self, chat_id: i64) -> Option<PendingDuplicates> {
        self.pending_duplicates.write().await.remove(&chat_id)
    }

    // ------------------------------------------------------------------
    // Idempotency keys
    // ------------------------------------------------------------------

    /// Whether the key is stored and unexpired. Expired entries are evicted
    /// on check.
    pub async fn idempotency_hit(&self, key: &str, now: Instant) -> bool {
        {
            let keys = self.idempotency_keys.read().await;
            match keys.get(key) {
                Some(stored) if !stored.is_expired(now) => return true,
                None => return false,
                Some(_) => {}, // expired, fall through to evict
            }
        }
        self.idempotency_keys.write().await.remove(key);
        false
    }

    pub async fn store_idempotency_key(&self, key: String, ttl: Duration) {
        let stored = StoredKey {
            created_at: Instant::now(),
            ttl,
        };
        self.idempotency_keys.write().await.insert(key, stored);
    }

    pub async fn remove_idempotency_key(&self, key: &str) -> bool {
        self.idempotency_keys.write().await.remove(key).is_some()
    }

    pub async fn cleanup_expired_keys(&self, now: Instant) -> usize {
        let mut keys = self.idempotency_keys.write().await;
        let before = keys.len();
        keys.retain(|_, stored| !stored.is_expired(now));
        before - keys.len()
    }

    pub async fn idempotency_len(&self) -> usize {
        self.idempotency_keys.read().await.len()
    }
}
