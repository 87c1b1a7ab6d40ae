//! Duplicate engine trait

use async_trait::async_trait;

use crate::domains::duplicate::{
    DuplicateAction, DuplicateAnalysis, DuplicatePolicy, PendingDuplicates,
};
use crate::domains::movement::StockMovement;
use crate::domains::user::Requester;
use crate::dto::duplicates::{DuplicateProcessing, DuplicateResolution};
use shared_error::AppError;

/// Scans candidate batches against the cached catalogue and manages the
/// per-chat confirmation dialogues for similar matches.
#[async_trait]
pub trait DuplicateService: Send + Sync {
    /// Score every candidate against every catalogue item, retaining the
    /// best match at or above the fuzzy threshold. Outflows additionally
    /// get an availability check against the matched item.
    async fn analyze_movements(
        &self,
        movements: &[StockMovement],
    ) -> Result<DuplicateAnalysis, AppError>;

    /// Apply the duplicate policy to an analyzed batch: merge exact matches
    /// (when `auto_merge_exact`), park similar matches for confirmation
    /// (when `require_user_confirmation`), and return the movements that
    /// proceed through normal staging.
    async fn process(
        &self,
        movements: Vec<StockMovement>,
        analysis: DuplicateAnalysis,
        policy: DuplicatePolicy,
        requester: &Requester,
    ) -> Result<DuplicateProcessing, AppError>;

    /// Resolve a user action on the chat's parked dialogue. Individual
    /// actions take the match index; bulk actions short-circuit the rest.
    async fn resolve(
        &self,
        chat_id: i64,
        action: DuplicateAction,
        item_index: Option<usize>,
    ) -> Result<DuplicateResolution, AppError>;

    /// The parked dialogue for a chat, if any
    async fn pending_for_chat(&self, chat_id: i64) -> Option<PendingDuplicates>;

    /// Remove and return a chat's parked dialogue
    async fn remove_pending(&self, chat_id: i64) -> Option<PendingDuplicates>;
}
