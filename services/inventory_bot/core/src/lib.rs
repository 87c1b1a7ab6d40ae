//! Inventory Bot Core
//!
//! This crate contains the business logic, domain models, and trait definitions
//! for the conversational inventory bot. It has zero infrastructure dependencies.
//!
//! ## Architecture
//!
//! - `domains/`: Domain entities and business logic
//! - `dto/`: Data Transfer Objects exchanged with the transport layer
//! - `errors/`: Batch error taxonomy with categorization and suggestions
//! - `parser/`: Command parsing engine (movements and stocktakes)
//! - `similarity/`: Keyword + quantity similarity kernel for duplicate detection
//! - `services/`: Service and store trait definitions (no implementations)

pub mod domains;
pub mod dto;
pub mod errors;
pub mod parser;
pub mod services;
pub mod similarity;

// Re-export commonly used types
pub use domains::batch::{
    ApprovalStatus, BatchApproval, BatchEntry, BatchFormat, BatchSection, GlobalParams,
    MovementParse,
};
pub use domains::duplicate::{
    DuplicateAction, DuplicateAnalysis, DuplicateMatch, DuplicatePolicy, MatchKind,
    PendingDuplicates, StockShortfall,
};
pub use domains::item::Item;
pub use domains::movement::{MovementReason, MovementStatus, MovementType, StockMovement};
pub use domains::stocktake::{StocktakeEntry, StocktakeHeader, StocktakeParse, StocktakeRecord};
pub use domains::user::{Requester, UserRole};
pub use errors::{BatchError, ErrorCategory, ErrorSeverity};

// Re-export shared error types
pub use shared_error::AppError;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
