// tests/http_sessions.rs
// Pull-binding tests driven through the router with tower's oneshot.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use serde_json::{Value, json};
use tower::ServiceExt;

use runbox::api::http::http_router;
use runbox::api::ws::ws_session_handler;
use runbox::session::LauncherConfig;
use runbox::state::create_app_state;

fn sh_config() -> LauncherConfig {
    LauncherConfig {
        interpreter: "/bin/sh".to_string(),
        interpreter_args: vec![],
        artifact_suffix: ".sh".to_string(),
        grace_period_ms: 200,
        monitor_poll_ms: 25,
        punctuation_cues: true,
        idle_input_detection: false,
        idle_input_ms: 60_000,
    }
}

/// Full app router, same shape the server binary builds.
fn test_app() -> Router {
    let app_state = create_app_state(sh_config());
    Router::new()
        .route("/ws", get(ws_session_handler))
        .merge(http_router(app_state.clone()))
        .with_state(app_state)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Poll /status until the given predicate holds or the deadline passes.
async fn poll_status<F>(app: &Router, session_id: &str, mut pred: F) -> Value
where
    F: FnMut(&Value) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut drained: Vec<Value> = Vec::new();

    loop {
        let (status, mut body) = get_json(app, &format!("/status/{session_id}")).await;
        assert_eq!(status, StatusCode::OK, "status read failed: {body}");

        // Keep everything drained so far visible to the predicate.
        if let Some(output) = body.get("output").and_then(|o| o.as_array()) {
            drained.extend(output.iter().cloned());
        }
        body["output"] = Value::Array(drained.clone());

        if pred(&body) {
            return body;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("status never matched, last: {body}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

fn has_line(body: &Value, text: &str) -> bool {
    body["output"]
        .as_array()
        .map(|lines| lines.iter().any(|l| l["text"] == text))
        .unwrap_or(false)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body.get("version").is_some());
}

#[tokio::test]
async fn run_then_status_reports_output_and_exit() {
    let app = test_app();

    let (status, body) = send_json(&app, "POST", "/run", json!({"code": "echo hello"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    let id = body["session_id"].as_str().unwrap().to_string();

    let final_body = poll_status(&app, &id, |b| b["status"] == "completed").await;
    assert_eq!(final_body["exit_code"], 0);
    assert!(has_line(&final_body, "hello"));

    // The completed session was reaped by that final read.
    let (status, _) = get_json(&app, &format!("/status/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn prompt_input_flow_over_http() {
    let app = test_app();

    let script = "printf 'Enter name:\\n'; read name; echo \"Hi, $name\"";
    let (status, body) = send_json(
        &app,
        "POST",
        "/run",
        json!({"code": script, "session_id": "greeter"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "greeter");

    poll_status(&app, "greeter", |b| b["waiting_for_input"] == true).await;

    let (status, body) =
        send_json(&app, "POST", "/input/greeter", json!({"input": "Ada"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "input_sent");

    let final_body = poll_status(&app, "greeter", |b| b["status"] == "completed").await;
    assert_eq!(final_body["exit_code"], 0);
    assert!(has_line(&final_body, "Hi, Ada"));
}

#[tokio::test]
async fn stderr_is_tagged_as_error_lines() {
    let app = test_app();

    let (_, body) = send_json(&app, "POST", "/run", json!({"code": "echo oops >&2; exit 2"})).await;
    let id = body["session_id"].as_str().unwrap().to_string();

    let final_body = poll_status(&app, &id, |b| b["status"] == "completed").await;
    assert_eq!(final_body["exit_code"], 2);
    let lines = final_body["output"].as_array().unwrap();
    assert!(
        lines
            .iter()
            .any(|l| l["type"] == "error" && l["text"] == "oops")
    );
}

#[tokio::test]
async fn unknown_session_returns_not_found() {
    let app = test_app();

    let (status, body) = get_json(&app, "/status/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("nope"));

    let (status, _) = send_json(&app, "POST", "/input/nope", json!({"input": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sessions_endpoint_lists_live_sessions() {
    let app = test_app();

    let (status, body) = get_json(&app, "/sessions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 0);

    let script = "printf 'name:\\n'; read x";
    let (_, _) = send_json(
        &app,
        "POST",
        "/run",
        json!({"code": script, "session_id": "lister"}),
    )
    .await;

    poll_status(&app, "lister", |b| b["waiting_for_input"] == true).await;

    let (_, body) = get_json(&app, "/sessions").await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], "lister");
    assert_eq!(sessions[0]["status"], "running");
    assert_eq!(sessions[0]["waiting_for_input"], true);
}

#[tokio::test]
async fn malformed_run_body_is_rejected() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/run")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
