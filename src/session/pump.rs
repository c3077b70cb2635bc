// src/session/pump.rs
// One pump per output stream: reads newline-delimited lines until the pipe
// closes and forwards them to the registry. Pumps run independently of each
// other and of the launch call; they stop on stream close, read error, or
// when their session has been superseded.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::error::RunError;

use super::registry::SessionRegistry;
use super::types::OutputKind;

pub fn spawn_stdout_pump(
    registry: Arc<SessionRegistry>,
    session_id: String,
    instance: Uuid,
    stdout: ChildStdout,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        pump_lines(registry, session_id, instance, stdout, OutputKind::Output).await;
    })
}

pub fn spawn_stderr_pump(
    registry: Arc<SessionRegistry>,
    session_id: String,
    instance: Uuid,
    stderr: ChildStderr,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        pump_lines(registry, session_id, instance, stderr, OutputKind::Error).await;
    })
}

async fn pump_lines<R>(
    registry: Arc<SessionRegistry>,
    session_id: String,
    instance: Uuid,
    stream: R,
    kind: OutputKind,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let text = line.trim_end().to_string();
                if !registry.push_output(&session_id, instance, kind, text).await {
                    debug!(session_id, ?kind, "session gone, pump stopping");
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                // One synthetic error line, then stop; the process itself
                // keeps running and the monitor still sees it through.
                let err = RunError::StreamReadFailure(e.to_string());
                registry
                    .push_output(&session_id, instance, OutputKind::Error, err.to_string())
                    .await;
                break;
            }
        }
    }

    debug!(session_id, ?kind, "pump drained");
}
