//! Movement executor and approval DTOs

use serde::{Deserialize, Serialize};

use crate::dto::batch::BatchResult;

/// Result of executing one movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementOutcome {
    /// User-facing confirmation line
    pub message: String,
    /// Store id of the created movement record
    pub movement_id: Option<String>,
    pub before_level: f64,
    pub after_level: f64,
    /// Set when the post-movement level falls below the reorder threshold
    pub low_stock_warning: Option<String>,
}

/// Per-item stock diff emitted after an approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDiff {
    pub item_name: String,
    pub before: f64,
    pub after: f64,
}

/// Result of approving a staged batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedBatch {
    pub batch_id: String,
    pub result: BatchResult,
    pub diffs: Vec<LevelDiff>,
    pub message: String,
}
