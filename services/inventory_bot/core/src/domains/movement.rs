//! Stock movement entity and its state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domains::user::Requester;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjust,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display matches the persisted record values
        let s = match self {
            MovementType::In => "In",
            MovementType::Out => "Out",
            MovementType::Adjust => "Adjust",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            "adjust" => Ok(MovementType::Adjust),
            _ => Err(format!("Unknown movement type: {}", s)),
        }
    }
}

/// Lifecycle status of a movement record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    /// Awaiting an admin decision
    Requested,
    /// Applied to the catalogue; terminal for success
    Posted,
    /// Cancelled after the fact by an admin
    Voided,
    /// Rejected before application
    Rejected,
}

impl MovementStatus {
    /// Check if a transition to a new status is valid
    pub fn can_transition_to(&self, new_status: MovementStatus) -> bool {
        matches!(
            (self, new_status),
            (MovementStatus::Requested, MovementStatus::Posted)
                | (MovementStatus::Requested, MovementStatus::Rejected)
                | (MovementStatus::Requested, MovementStatus::Voided)
        )
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovementStatus::Requested => "Requested",
            MovementStatus::Posted => "Posted",
            MovementStatus::Voided => "Voided",
            MovementStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for MovementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "requested" => Ok(MovementStatus::Requested),
            "posted" => Ok(MovementStatus::Posted),
            "voided" => Ok(MovementStatus::Voided),
            "rejected" => Ok(MovementStatus::Rejected),
            _ => Err(format!("Unknown movement status: {}", s)),
        }
    }
}

/// Business reason recorded on the movement row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Purchase,
    Issue,
    Adjustment,
}

impl fmt::Display for MovementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovementReason::Purchase => "Purchase",
            MovementReason::Issue => "Issue",
            MovementReason::Adjustment => "Adjustment",
        };
        f.write_str(s)
    }
}

impl MovementReason {
    /// The default reason recorded for each movement type
    pub fn for_movement_type(movement_type: MovementType) -> Self {
        match movement_type {
            MovementType::In => MovementReason::Purchase,
            MovementType::Out => MovementReason::Issue,
            MovementType::Adjust => MovementReason::Adjustment,
        }
    }
}

/// A single recorded stock change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    /// Opaque id assigned by the store on write
    pub id: Option<String>,
    pub item_name: String,
    pub movement_type: MovementType,
    /// Entered quantity; positive for In/Out, signed for Adjust
    pub quantity: f64,
    /// Entered unit
    pub unit: String,
    /// Effect on `on_hand`: +q for In, -q for Out, ±q for Adjust
    pub signed_base_quantity: f64,
    /// Unit metadata echoed from the item at staging time
    pub unit_size: Option<f64>,
    pub unit_type: Option<String>,
    pub status: MovementStatus,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub reason: MovementReason,
    pub driver_name: Option<String>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub project: Option<String>,
    pub note: Option<String>,
    pub category: Option<String>,
    /// Links sibling entries submitted in one command
    pub batch_id: Option<String>,
    /// Segment number within a segmented submission
    pub batch_number: Option<u32>,
    pub source: String,
}

impl StockMovement {
    /// Create a movement with the signed base quantity derived from the type.
    /// In: +q, Out: -q, Adjust keeps the entered sign.
    pub fn new(
        item_name: impl Into<String>,
        movement_type: MovementType,
        quantity: f64,
        unit: impl Into<String>,
        requester: &Requester,
    ) -> Self {
        let signed = match movement_type {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
            MovementType::Adjust => quantity,
        };
        Self {
            id: None,
            item_name: item_name.into(),
            movement_type,
            quantity,
            unit: unit.into(),
            signed_base_quantity: signed,
            unit_size: None,
            unit_type: None,
            status: MovementStatus::Requested,
            timestamp: Utc::now(),
            user_id: requester.user_id.to_string(),
            user_name: requester.user_name.clone(),
            reason: MovementReason::for_movement_type(movement_type),
            driver_name: None,
            from_location: None,
            to_location: None,
            project: None,
            note: None,
            category: None,
            batch_id: None,
            batch_number: None,
            source: "Telegram".to_string(),
        }
    }

    /// Short human label used in summaries: "cement 50kg: 10 bags"
    pub fn summary_label(&self) -> String {
        format!("{}: {} {}", self.item_name, self.quantity, self.unit)
    }
}
