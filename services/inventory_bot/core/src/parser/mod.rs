//! Command parsing engine
//!
//! A single-pass line tokenizer classifies each input line into a typed
//! event (`BatchHeader`, `Params`, `ItemLine`, `Comment`, `Blank`); the
//! movement and stocktake parsers are small state machines over those
//! events.

pub mod movement;
pub mod stocktake;
pub mod tokens;

pub use movement::MovementParser;
pub use stocktake::StocktakeParser;

/// Maximum entries accepted in one movement batch
pub const MAX_MOVEMENT_ENTRIES: usize = 40;

/// Maximum entries accepted in one stocktake
pub const MAX_STOCKTAKE_ENTRIES: usize = 50;

/// Soft warning threshold for suspiciously large quantities
pub const LARGE_QUANTITY_WARNING: f64 = 10_000.0;
