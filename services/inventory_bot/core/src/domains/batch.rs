//! Batch shapes: parsed command batches and staged approvals

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domains::movement::StockMovement;
use crate::domains::user::UserRole;

/// Structural format of a batch command, detected before entry parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFormat {
    /// One item line
    Single,
    /// Entries separated by newlines
    Newline,
    /// Entries separated by semicolons
    Semicolon,
    /// Newlines and semicolons mixed
    Mixed,
    /// `-batch N-` delimited segments, each with its own metadata
    Segmented,
}

impl fmt::Display for BatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchFormat::Single => "single",
            BatchFormat::Newline => "newline",
            BatchFormat::Semicolon => "semicolon",
            BatchFormat::Mixed => "mixed",
            BatchFormat::Segmented => "segmented",
        };
        f.write_str(s)
    }
}

/// Global parameters declared at the head of a batch and inherited by
/// every entry that does not override them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalParams {
    pub project: Option<String>,
    pub driver: Option<String>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
}

impl GlobalParams {
    pub fn is_empty(&self) -> bool {
        self.project.is_none()
            && self.driver.is_none()
            && self.from_location.is_none()
            && self.to_location.is_none()
    }

    /// Fill fields the movement did not set itself. Explicit per-entry
    /// values are never overwritten.
    pub fn apply_to(&self, movement: &mut StockMovement) {
        if movement.project.is_none() {
            movement.project = self.project.clone();
        }
        if movement.driver_name.is_none() {
            movement.driver_name = self.driver.clone();
        }
        if movement.from_location.is_none() {
            movement.from_location = self.from_location.clone();
        }
        if movement.to_location.is_none() {
            movement.to_location = self.to_location.clone();
        }
    }

    /// Render as "project: X, driver: Y" for user-facing notes
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(project) = &self.project {
            parts.push(format!("project: {}", project));
        }
        if let Some(driver) = &self.driver {
            parts.push(format!("driver: {}", driver));
        }
        if let Some(from) = &self.from_location {
            parts.push(format!("from: {}", from));
        }
        if let Some(to) = &self.to_location {
            parts.push(format!("to: {}", to));
        }
        parts.join(", ")
    }
}

/// One parsed item line, before conversion to a movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub item_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
}

/// A `-batch N-` segment with its own metadata block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    pub batch_number: u32,
    pub project: String,
    pub driver: String,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub entries: Vec<BatchEntry>,
}

/// Result of parsing a movement command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementParse {
    pub format: BatchFormat,
    pub movements: Vec<StockMovement>,
    /// Segments, populated for segmented commands only
    pub sections: Vec<BatchSection>,
    pub total_entries: usize,
    pub valid_entries: usize,
    pub errors: Vec<String>,
    /// Soft warnings (large quantities, duplicate items); never reject the batch
    pub warnings: Vec<String>,
    pub is_valid: bool,
    pub global_params: GlobalParams,
}

impl MovementParse {
    /// An invalid parse carrying only errors
    pub fn invalid(format: BatchFormat, total_entries: usize, errors: Vec<String>) -> Self {
        Self {
            format,
            movements: Vec::new(),
            sections: Vec::new(),
            total_entries,
            valid_entries: 0,
            errors,
            warnings: Vec::new(),
            is_valid: false,
            global_params: GlobalParams::default(),
        }
    }
}

/// Decision state of a staged batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// An entry that failed during batch application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEntry {
    pub item_name: String,
    pub error: String,
}

/// A staged set of movements awaiting a human decision.
///
/// Held in process memory keyed by `batch_id`; dropped on resolution or on
/// process restart (the user re-submits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchApproval {
    pub batch_id: String,
    pub movements: Vec<StockMovement>,
    pub user_id: String,
    pub user_name: String,
    pub chat_id: i64,
    /// Role of the submitter; availability checks at apply time use this,
    /// not the approver's role
    pub submitter_role: UserRole,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    /// Stock level per distinct item before application
    pub before_levels: HashMap<String, f64>,
    /// Stock level per distinct item after resolution
    pub after_levels: HashMap<String, f64>,
    pub failed_entries: Vec<FailedEntry>,
    pub global_params: GlobalParams,
}
