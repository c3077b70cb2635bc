// src/api/http/router.rs
// HTTP router composition for the pull binding.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use super::{
    handlers::health_handler,
    sessions::{input_handler, list_sessions_handler, run_handler, status_handler},
};
use crate::state::AppState;

/// Main HTTP router for health and session endpoints.
/// Used directly in main.rs alongside the websocket route.
pub fn http_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Session lifecycle
        .route("/run", post(run_handler))
        .route("/status/{id}", get(status_handler))
        .route("/input/{id}", post(input_handler))
        .route("/sessions", get(list_sessions_handler))
        .with_state(app_state)
}
