// src/state.rs
// Shared application state threaded through both transport bindings.

use std::sync::Arc;

use crate::session::{LauncherConfig, SessionRegistry};

/// State shared by the HTTP and WebSocket handlers.
pub struct AppState {
    /// Session registry: the single source of truth for live sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: LauncherConfig) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(config)),
        }
    }
}

/// Build the shared state for the server.
pub fn create_app_state(config: LauncherConfig) -> Arc<AppState> {
    Arc::new(AppState::new(config))
}
