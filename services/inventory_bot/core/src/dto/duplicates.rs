//! Duplicate engine DTOs

use serde::{Deserialize, Serialize};

use crate::domains::movement::StockMovement;
use crate::errors::BatchError;

/// Result of running a batch through the duplicate policy: exact matches
/// may be merged immediately, similar matches parked for confirmation, and
/// the rest proceed as new items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateProcessing {
    /// Names of items whose quantities were merged into existing entries
    pub merged_items: Vec<String>,
    /// Movements that proceed through the normal staging path
    pub remaining: Vec<StockMovement>,
    /// Whether a confirmation dialogue was parked for the chat
    pub requires_confirmation: bool,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<BatchError>,
}

/// Result of resolving one or more parked duplicates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateResolution {
    pub message: String,
    pub confirmed_count: usize,
    pub cancelled_count: usize,
    pub total: usize,
    pub remaining: usize,
    pub all_processed: bool,
}
