//! Inventory Bot API
//!
//! The inbound command surface: an axum webhook receiving chat updates, a
//! verb-first command router, callback-token dispatch for button presses,
//! and the reply formatting.

pub mod auth;
pub mod callbacks;
pub mod commands;
pub mod format;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
