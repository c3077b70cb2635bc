// src/api/types.rs
// Request/response payloads for the pull (HTTP) binding.

use serde::{Deserialize, Serialize};

use crate::session::{OutputEvent, SessionDetails};

/// Body of POST /run
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub code: String,
    /// Reusing a live session's id terminates that session first.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response of POST /run
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub session_id: String,
    pub status: String,
}

/// Response of GET /status/{id}; `output` is drained from the buffer on
/// every read.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub output: Vec<OutputEvent>,
    pub waiting_for_input: bool,
    pub exit_code: Option<i32>,
}

/// Body of POST /input/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct InputRequest {
    pub input: String,
}

/// Response of POST /input/{id}
#[derive(Debug, Clone, Serialize)]
pub struct InputResponse {
    pub status: String,
}

/// Response of GET /sessions
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionDetails>,
}
