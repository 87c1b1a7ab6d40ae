//! Route definitions and router creation

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::webhook;
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::handle_update))
        .route("/health", get(webhook::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
