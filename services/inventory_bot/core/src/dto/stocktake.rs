//! Stocktake service DTOs

use serde::{Deserialize, Serialize};

use crate::domains::duplicate::DuplicateMatch;
use crate::domains::stocktake::StocktakeRecord;

/// Processing switches for a stocktake command
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StocktakeOptions {
    /// Parse and report without writing to the catalogue
    pub validate_only: bool,
    /// Apply without the duplicate scan (set when the user has already
    /// confirmed a parked dialogue)
    pub skip_duplicate_check: bool,
}

/// Counts and audit records from an applied stocktake
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StocktakeSummary {
    pub message: String,
    pub updated_items: usize,
    pub created_items: usize,
    pub failed_items: usize,
    pub records: Vec<StocktakeRecord>,
}

/// Outcome of a stocktake command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StocktakeOutcome {
    /// Validation-only report, no writes
    Validated(String),
    /// Counts applied
    Applied(StocktakeSummary),
    /// Potential duplicates found; the dialogue was parked for the chat
    NeedsConfirmation {
        duplicates: Vec<DuplicateMatch>,
        prompt: String,
    },
}
