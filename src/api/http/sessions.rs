// src/api/http/sessions.rs
// Pull-binding handlers: start a run, drain status, relay input.

use std::sync::Arc;

use axum::{Json, extract::Path, extract::State};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::types::{
    InputRequest, InputResponse, RunRequest, RunResponse, SessionListResponse, StatusResponse,
};
use crate::session;
use crate::state::AppState;

/// POST /run — materialize the submitted code and start a session.
pub async fn run_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> ApiResult<Json<RunResponse>> {
    let session_id = session::launch(&state.sessions, &req.code, req.session_id).await?;
    info!(session_id = %session_id, "run started via HTTP");

    Ok(Json(RunResponse {
        session_id,
        status: "running".to_string(),
    }))
}

/// GET /status/{id} — draining read of buffered output plus lifecycle state.
/// The first read that observes a terminal state also reaps the session.
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let snapshot = state.sessions.status_drain(&session_id).await?;

    Ok(Json(StatusResponse {
        status: snapshot.status.as_str().to_string(),
        output: snapshot.output,
        waiting_for_input: snapshot.waiting_for_input,
        exit_code: snapshot.exit_code,
    }))
}

/// POST /input/{id} — write a line to the child's stdin.
pub async fn input_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<InputRequest>,
) -> ApiResult<Json<InputResponse>> {
    state.sessions.send_input(&session_id, &req.input).await?;

    Ok(Json(InputResponse {
        status: "input_sent".to_string(),
    }))
}

/// GET /sessions — list live sessions.
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SessionListResponse>> {
    let sessions = state.sessions.list().await;
    Ok(Json(SessionListResponse { sessions }))
}
