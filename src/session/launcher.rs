// src/session/launcher.rs
// Materializes submitted source as an artifact file and spawns it as a child
// process with all three standard streams piped. Registers the session and
// hands the streams to two pumps and the process to an exit monitor; the
// launch call itself never blocks on execution.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use tokio::process::Command;
use tracing::info;
use uuid::Uuid;

use crate::error::{RunError, RunResult};

use super::monitor;
use super::pump;
use super::registry::{SessionHandle, SessionRegistry, remove_artifact};
use super::types::{SessionEvent, SessionStatus};

/// Start a session for the given source text. A session already live under
/// the same identifier is terminated and evicted first; exactly one process
/// per identifier survives. Returns the session id.
pub async fn launch(
    registry: &Arc<SessionRegistry>,
    code: &str,
    session_id: Option<String>,
) -> RunResult<String> {
    let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    // Supersession: the old run is fully torn down before the new one starts.
    registry.evict(&session_id).await;

    let artifact = write_artifact(code, &registry.config().artifact_suffix)?;

    let config = registry.config();
    let mut cmd = Command::new(&config.interpreter);
    cmd.args(&config.interpreter_args)
        .arg(&artifact)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            remove_artifact(&session_id, Some(artifact));
            return Err(RunError::LaunchFailure(format!(
                "failed to spawn {}: {e}",
                config.interpreter
            )));
        }
    };

    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RunError::LaunchFailure("child stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RunError::LaunchFailure("child stderr not captured".to_string()))?;

    let instance = Uuid::new_v4();
    let handle = SessionHandle {
        instance,
        child,
        stdin,
        artifact: Some(artifact),
        output: Vec::new(),
        waiting_for_input: false,
        input_since_output: false,
        status: SessionStatus::Running,
        exit_code: None,
        last_stdout_at: Instant::now(),
        spawned_at: chrono::Utc::now().timestamp(),
    };

    registry.insert(session_id.clone(), handle).await;
    info!(session_id = %session_id, interpreter = %config.interpreter, "session launched");

    registry.broadcast(SessionEvent::Started {
        session_id: session_id.clone(),
    });

    let stdout_pump = pump::spawn_stdout_pump(registry.clone(), session_id.clone(), instance, stdout);
    let stderr_pump = pump::spawn_stderr_pump(registry.clone(), session_id.clone(), instance, stderr);
    monitor::spawn_monitor(
        registry.clone(),
        session_id.clone(),
        instance,
        vec![stdout_pump, stderr_pump],
    );

    Ok(session_id)
}

/// Write source text to a fresh uniquely-named file and keep it past the
/// tempfile guard; the session owns the path from here on.
fn write_artifact(code: &str, suffix: &str) -> RunResult<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("runbox-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| RunError::LaunchFailure(format!("artifact creation failed: {e}")))?;

    file.write_all(code.as_bytes())
        .map_err(|e| RunError::LaunchFailure(format!("artifact write failed: {e}")))?;
    file.flush()
        .map_err(|e| RunError::LaunchFailure(format!("artifact write failed: {e}")))?;

    let (_, path) = file
        .keep()
        .map_err(|e| RunError::LaunchFailure(format!("artifact persist failed: {e}")))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact_unique_paths() {
        let a = write_artifact("echo one", ".sh").unwrap();
        let b = write_artifact("echo two", ".sh").unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "echo one");

        remove_artifact("test", Some(a.clone()));
        remove_artifact("test", Some(b));
        assert!(!a.exists());
        // Second deletion of the same path is a no-op.
        remove_artifact("test", Some(a));
    }
}
