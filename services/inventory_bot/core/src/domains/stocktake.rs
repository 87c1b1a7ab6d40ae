//! Stocktake shapes: parsed commands and audit records
//!
//! Stocktakes are cumulative: the counted quantity is added to the existing
//! `on_hand`, not a replacement.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Parsed stocktake header line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeHeader {
    /// Date as entered, DD/MM/YY
    pub date: String,
    /// Normalized date
    pub normalized_date: NaiveDate,
    /// Names after `logged by:`
    pub logged_by: Vec<String>,
    /// Optional category override applied to every entry
    pub category: Option<String>,
}

/// One counted line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeEntry {
    pub item_name: String,
    pub quantity: f64,
    /// 1-based line number in the submitted command
    pub line_number: usize,
    pub raw_text: String,
}

/// Result of parsing a stocktake command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeParse {
    pub header: Option<StocktakeHeader>,
    pub entries: Vec<StocktakeEntry>,
    pub total_lines: usize,
    pub valid_entries: usize,
    pub errors: Vec<String>,
    pub is_valid: bool,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub skipped_lines: usize,
}

/// Audit record of one applied count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeRecord {
    /// Links sibling entries applied in one stocktake
    pub batch_id: String,
    pub date: NaiveDate,
    pub item_name: String,
    pub counted_qty: f64,
    pub previous_on_hand: f64,
    pub new_on_hand: f64,
    /// `counted_qty - previous_on_hand` when populated
    pub discrepancy: Option<f64>,
    pub applied_at: DateTime<Utc>,
    pub applied_by: String,
}

impl StocktakeRecord {
    /// Build the record for a cumulative count: the new level is the
    /// previous level plus the counted quantity.
    pub fn cumulative(
        batch_id: impl Into<String>,
        date: NaiveDate,
        item_name: impl Into<String>,
        counted_qty: f64,
        previous_on_hand: f64,
        applied_by: impl Into<String>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            date,
            item_name: item_name.into(),
            counted_qty,
            previous_on_hand,
            new_on_hand: previous_on_hand + counted_qty,
            discrepancy: Some(counted_qty - previous_on_hand),
            applied_at: Utc::now(),
            applied_by: applied_by.into(),
        }
    }
}
