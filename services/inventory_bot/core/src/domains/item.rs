//! Catalogue item entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalogue entry. Identity is the case-insensitive `name`.
///
/// Items are created on first mention in any command, mutated only through
/// the movement executor or a stocktake, and never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Case-insensitive unique name
    pub name: String,
    /// Units currently on hand
    pub on_hand: f64,
    /// Size of one unit (e.g. 50 for "Cement 50kg")
    pub unit_size: f64,
    /// Unit of measure for `unit_size` (e.g. "kg", "ltrs")
    pub unit_type: String,
    /// Catalogue category (closed set, see `domains::category`)
    pub category: Option<String>,
    /// Storage location
    pub location: Option<String>,
    /// Comma-joined projects this item has been used on
    pub project: Option<String>,
    /// Stock level below which the item is flagged for reorder
    pub reorder_threshold: Option<f64>,
    /// Per-item threshold above which movements need extra scrutiny
    pub large_qty_threshold: Option<f64>,
    pub is_active: bool,
    /// Date of the last stocktake that touched this item
    pub last_stocktake_date: Option<NaiveDate>,
    /// Who logged the last stocktake
    pub last_stocktake_by: Option<String>,
}

impl Item {
    /// Create an item with catalogue defaults (unit size 1, unit type "piece")
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_hand: 0.0,
            unit_size: 1.0,
            unit_type: "piece".to_string(),
            category: None,
            location: None,
            project: None,
            reorder_threshold: None,
            large_qty_threshold: None,
            is_active: true,
            last_stocktake_date: None,
            last_stocktake_by: None,
        }
    }

    /// Total volume held: `unit_size × on_hand`
    pub fn total_volume(&self) -> f64 {
        self.unit_size * self.on_hand
    }

    /// Whether the item carries a meaningful unit specification
    /// (anything other than single pieces)
    pub fn has_unit_spec(&self) -> bool {
        self.unit_size > 1.0 && self.unit_type != "piece"
    }

    /// Validate the structural invariants of the item
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.unit_size <= 0.0 {
            return Err(format!(
                "Invalid unit size: {}. Unit size must be greater than 0.",
                self.unit_size
            ));
        }
        if self.unit_type.trim().is_empty() {
            return Err(format!(
                "Invalid unit type: '{}'. Unit type cannot be empty.",
                self.unit_type
            ));
        }
        Ok(())
    }

    /// Whether the current level sits below the reorder threshold
    pub fn is_below_reorder_threshold(&self) -> bool {
        matches!(self.reorder_threshold, Some(threshold) if self.on_hand < threshold)
    }
}
