//! Data Transfer Objects exchanged between services and the transport layer

pub mod batch;
pub mod duplicates;
pub mod reply;
pub mod stock;
pub mod stocktake;

pub use batch::{BatchResult, PendingSummary};
pub use duplicates::{DuplicateProcessing, DuplicateResolution};
pub use reply::{Button, Reply};
pub use stock::{ApprovedBatch, LevelDiff, MovementOutcome};
pub use stocktake::{StocktakeOptions, StocktakeOutcome, StocktakeSummary};
