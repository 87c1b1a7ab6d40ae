//! Duplicate-detection shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domains::item::Item;
use crate::domains::movement::MovementType;
use crate::domains::user::UserRole;

/// Classification of a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// score >= 0.95
    Exact,
    /// score >= 0.7
    Similar,
    /// score >= 0.5
    Fuzzy,
}

impl MatchKind {
    pub const EXACT_THRESHOLD: f64 = 0.95;
    pub const SIMILAR_THRESHOLD: f64 = 0.7;
    pub const FUZZY_THRESHOLD: f64 = 0.5;

    /// Classify a score; below the fuzzy threshold the candidate is treated
    /// as a new item.
    pub fn classify(score: f64) -> Option<MatchKind> {
        if score >= Self::EXACT_THRESHOLD {
            Some(MatchKind::Exact)
        } else if score >= Self::SIMILAR_THRESHOLD {
            Some(MatchKind::Similar)
        } else if score >= Self::FUZZY_THRESHOLD {
            Some(MatchKind::Fuzzy)
        } else {
            None
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::Exact => "exact",
            MatchKind::Similar => "similar",
            MatchKind::Fuzzy => "fuzzy",
        };
        f.write_str(s)
    }
}

/// A pairing of an unsubmitted candidate line and an existing catalogue item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Candidate item name as entered
    pub item_name: String,
    /// Candidate quantity as entered
    pub quantity: f64,
    pub unit: Option<String>,
    /// The existing catalogue item it resembles
    pub existing: Item,
    pub score: f64,
    pub kind: MatchKind,
    /// Segment the candidate came from (1 for free batches)
    pub batch_number: u32,
    /// Index of the candidate within the submitted batch
    pub item_index: usize,
}

/// An outflow requesting more than the matched item holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockShortfall {
    pub item_name: String,
    pub on_hand: f64,
    pub requested: f64,
    pub shortfall: f64,
}

/// Result of scanning a batch against the catalogue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    pub duplicates: Vec<DuplicateMatch>,
    /// Indexes of batch entries with no match at or above the fuzzy threshold
    pub non_duplicate_indexes: Vec<usize>,
    pub total_items: usize,
    /// Availability warnings for outflow candidates
    pub shortfalls: Vec<StockShortfall>,
}

impl DuplicateAnalysis {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    pub fn exact_matches(&self) -> impl Iterator<Item = &DuplicateMatch> {
        self.duplicates.iter().filter(|d| d.kind == MatchKind::Exact)
    }

    /// Similar and fuzzy matches, which require user confirmation
    pub fn similar_matches(&self) -> impl Iterator<Item = &DuplicateMatch> {
        self.duplicates.iter().filter(|d| d.kind != MatchKind::Exact)
    }

    pub fn exact_count(&self) -> usize {
        self.exact_matches().count()
    }

    pub fn similar_count(&self) -> usize {
        self.similar_matches().count()
    }
}

/// Processing policy flags set by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DuplicatePolicy {
    /// Merge exact matches automatically (quantity added to the existing item)
    pub auto_merge_exact: bool,
    /// Park similar-and-above matches for user confirmation
    pub require_user_confirmation: bool,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            auto_merge_exact: true,
            require_user_confirmation: true,
        }
    }
}

/// User decision on a parked duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAction {
    /// Merge the candidate into the existing item
    Confirm,
    /// Insert the candidate as a new item
    CreateNew,
    /// Skip the candidate
    Cancel,
    ConfirmAll,
    CancelAll,
}

/// Confirmation dialogue state held per chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDuplicates {
    pub matches: Vec<DuplicateMatch>,
    pub movement_type: MovementType,
    pub user_id: String,
    pub user_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    /// Indexes into `matches` the user has merged
    pub confirmed: Vec<usize>,
    /// Indexes into `matches` the user has cancelled or created as new
    pub cancelled: Vec<usize>,
    /// Raw stocktake command stashed for re-processing after confirmation;
    /// set only for stocktake dialogues
    pub stashed_stocktake: Option<String>,
}

impl PendingDuplicates {
    pub fn is_resolved(&self) -> bool {
        self.confirmed.len() + self.cancelled.len() >= self.matches.len()
    }

    pub fn remaining(&self) -> usize {
        self.matches
            .len()
            .saturating_sub(self.confirmed.len() + self.cancelled.len())
    }

    pub fn is_decided(&self, index: usize) -> bool {
        self.confirmed.contains(&index) || self.cancelled.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_thresholds() {
        assert_eq!(MatchKind::classify(1.0), Some(MatchKind::Exact));
        assert_eq!(MatchKind::classify(0.95), Some(MatchKind::Exact));
        assert_eq!(MatchKind::classify(0.9), Some(MatchKind::Similar));
        assert_eq!(MatchKind::classify(0.7), Some(MatchKind::Similar));
        assert_eq!(MatchKind::classify(0.6), Some(MatchKind::Fuzzy));
        assert_eq!(MatchKind::classify(0.5), Some(MatchKind::Fuzzy));
        assert_eq!(MatchKind::classify(0.49), None);
    }

    #[test]
    fn dialogue_resolution_tracking() {
        let item = Item::new("Cement 50kg");
        let matched = DuplicateMatch {
            item_name: "cement 50 kg".to_string(),
            quantity: 10.0,
            unit: Some("bag".to_string()),
            existing: item,
            score: 0.97,
            kind: MatchKind::Exact,
            batch_number: 1,
            item_index: 0,
        };
        let mut pending = PendingDuplicates {
            matches: vec![matched.clone(), matched],
            movement_type: MovementType::In,
            user_id: "1".to_string(),
            user_name: "Dani".to_string(),
            role: UserRole::Staff,
            created_at: Utc::now(),
            confirmed: Vec::new(),
            cancelled: Vec::new(),
            stashed_stocktake: None,
        };

        assert!(!pending.is_resolved());
        assert_eq!(pending.remaining(), 2);

        pending.confirmed.push(0);
        assert_eq!(pending.remaining(), 1);
        assert!(pending.is_decided(0));
        assert!(!pending.is_decided(1));

        pending.cancelled.push(1);
        assert!(pending.is_resolved());
        assert_eq!(pending.remaining(), 0);
    }
}
