//! Batch processing result DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::batch::GlobalParams;
use crate::errors::BatchError;

/// Outcome of applying a batch of movements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub total_entries: usize,
    pub successful_entries: usize,
    pub failed_entries: usize,
    /// `successful / total × 100`
    pub success_rate: f64,
    /// Store ids of the created movement records
    pub movements_created: Vec<String>,
    pub errors: Vec<BatchError>,
    pub rollback_performed: bool,
    pub processing_time_seconds: f64,
    pub summary_message: String,
    pub global_params: GlobalParams,
}

impl BatchResult {
    /// Compute the success rate for a (successful, total) pair
    pub fn rate(successful: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        }
    }
}

/// Summary of the staged batches awaiting approval
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingSummary {
    pub total_pending_batches: usize,
    pub total_pending_movements: usize,
    pub oldest_pending: Option<DateTime<Utc>>,
    pub batch_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_arithmetic() {
        assert_eq!(BatchResult::rate(0, 0), 0.0);
        assert_eq!(BatchResult::rate(1, 2), 50.0);
        assert_eq!(BatchResult::rate(3, 3), 100.0);
    }
}
