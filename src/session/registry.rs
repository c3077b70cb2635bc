// src/session/registry.rs
// Concurrent session store. Single source of truth consulted and mutated by
// the launcher, stream pumps, input relay, exit monitor, and both transport
// bindings. Injected as a collaborator, never ambient state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{RunError, RunResult};

use super::prompt::{CueDetector, PromptDetector};
use super::types::{LauncherConfig, OutputEvent, OutputKind, SessionDetails, SessionEvent, SessionStatus};

/// Broadcast channel capacity for push-binding events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One live (or lingering completed) session.
pub(crate) struct SessionHandle {
    /// Identifies this particular launch so a stale pump or monitor from a
    /// superseded run cannot touch the replacement session.
    pub instance: Uuid,
    /// Child process; owned by the registry for its lifetime.
    pub child: Child,
    /// Child stdin for the input relay.
    pub stdin: Option<ChildStdin>,
    /// Materialized source file, taken exactly once on deletion.
    pub artifact: Option<PathBuf>,
    /// Lines accumulated since the last status drain.
    pub output: Vec<OutputEvent>,
    /// Set by the wait heuristic, cleared by the relay or non-cue output.
    pub waiting_for_input: bool,
    /// Input was relayed and the child has produced no stdout since.
    /// Suppresses the idle fallback while the child processes that input.
    pub input_since_output: bool,
    pub status: SessionStatus,
    pub exit_code: Option<i32>,
    /// Last time the stdout pump produced a line; drives the idle fallback.
    pub last_stdout_at: Instant,
    /// Unix timestamp when spawned
    pub spawned_at: i64,
}

/// Drained view of a session returned by the pull binding.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub status: SessionStatus,
    pub output: Vec<OutputEvent>,
    pub waiting_for_input: bool,
    pub exit_code: Option<i32>,
}

/// Result of one exit-monitor liveness poll.
pub(crate) enum ExitPoll {
    /// Session was evicted (superseded); the monitor becomes a no-op.
    Gone,
    /// Still running.
    Running {
        stdout_idle: Duration,
        waiting_for_input: bool,
    },
    /// Process exited with this code.
    Exited(i32),
}

/// Registry of active sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    event_tx: broadcast::Sender<SessionEvent>,
    detector: Box<dyn PromptDetector>,
    config: LauncherConfig,
}

impl SessionRegistry {
    pub fn new(config: LauncherConfig) -> Self {
        let detector = Box::new(CueDetector::new(config.punctuation_cues));
        Self::with_detector(config, detector)
    }

    /// Build with a custom prompt-detection strategy.
    pub fn with_detector(config: LauncherConfig, detector: Box<dyn PromptDetector>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_tx,
            detector,
            config,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Subscribe to session events (push binding).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn broadcast(&self, event: SessionEvent) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.event_tx.send(event);
    }

    /// Register a session, displacing any entry already live under the same
    /// id. Launches racing on one id each pass through here, so whichever
    /// insert lands last owns the id and every loser is terminated and its
    /// artifact removed rather than silently dropped.
    pub(crate) async fn insert(&self, session_id: String, handle: SessionHandle) {
        let displaced = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), handle)
        };

        if let Some(mut old) = displaced {
            if !old.status.is_terminal() {
                old.status = SessionStatus::Terminated;
                terminate_child(&mut old.child, self.config.grace_period_ms).await;
            }
            remove_artifact(&session_id, old.artifact.take());
            info!(session_id = %session_id, "concurrent launch displaced, child terminated");
        }
        info!(session_id = %session_id, "session registered");
    }

    /// Evict a session if present: graceful SIGTERM, bounded grace wait,
    /// force kill, artifact removal. Termination of an already-dead process
    /// is not an error; all failures here are swallowed or logged.
    pub async fn evict(&self, session_id: &str) {
        let handle = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id)
        };
        let Some(mut handle) = handle else {
            return;
        };

        if !handle.status.is_terminal() {
            handle.status = SessionStatus::Terminated;
            terminate_child(&mut handle.child, self.config.grace_period_ms).await;
        }
        remove_artifact(session_id, handle.artifact.take());
        info!(session_id, "session evicted");
    }

    /// Append one line of child output. Returns false when the session is
    /// gone or this pump belongs to a superseded launch, which tells the
    /// pump to stop.
    pub(crate) async fn push_output(
        &self,
        session_id: &str,
        instance: Uuid,
        kind: OutputKind,
        text: String,
    ) -> bool {
        let mut input_required = false;
        {
            let mut sessions = self.sessions.write().await;
            let Some(handle) = sessions.get_mut(session_id) else {
                return false;
            };
            if handle.instance != instance {
                return false;
            }

            if kind == OutputKind::Output {
                handle.last_stdout_at = Instant::now();
                handle.input_since_output = false;
                if self.detector.is_input_cue(&text) {
                    if !handle.waiting_for_input {
                        handle.waiting_for_input = true;
                        input_required = true;
                    }
                } else {
                    // New output that is not a prompt clears the flag.
                    handle.waiting_for_input = false;
                }
            }

            handle.output.push(OutputEvent {
                kind,
                text: text.clone(),
            });
        }

        self.broadcast(SessionEvent::Output {
            session_id: session_id.to_string(),
            event: OutputEvent { kind, text },
        });
        if input_required {
            self.broadcast(SessionEvent::InputRequired {
                session_id: session_id.to_string(),
            });
        }
        true
    }

    /// Relay caller input to the child's stdin and clear the wait flag.
    ///
    /// The stdin handle is taken out of the session for the duration of the
    /// write so a slow or full pipe parks only this caller, never the
    /// registry lock; pumps, monitors, and status reads for every session
    /// keep running while the write is in flight.
    pub async fn send_input(&self, session_id: &str, input: &str) -> RunResult<()> {
        let (instance, mut stdin) = {
            let mut sessions = self.sessions.write().await;
            let handle = sessions
                .get_mut(session_id)
                .ok_or_else(|| RunError::SessionNotFound(session_id.to_string()))?;

            let exited = handle.status.is_terminal()
                || handle.child.try_wait().map(|s| s.is_some()).unwrap_or(true);
            if exited {
                return Err(RunError::ProcessExited(session_id.to_string()));
            }

            let stdin = handle
                .stdin
                .take()
                .ok_or_else(|| RunError::StdinWriteFailure("stdin unavailable".to_string()))?;
            (handle.instance, stdin)
        };

        let line = format!("{input}\n");
        let write_result = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        }
        .await;

        // Hand stdin back unless the session was reaped or superseded while
        // the write was parked; on success the relay also counts as fresh
        // activity so the idle fallback does not immediately re-fire.
        {
            let mut sessions = self.sessions.write().await;
            if let Some(handle) = sessions.get_mut(session_id) {
                if handle.instance == instance {
                    handle.stdin = Some(stdin);
                    if write_result.is_ok() {
                        handle.waiting_for_input = false;
                        handle.input_since_output = true;
                        handle.last_stdout_at = Instant::now();
                    }
                }
            }
        }

        write_result.map_err(|e| RunError::StdinWriteFailure(e.to_string()))?;
        debug!(session_id, "input relayed to child stdin");
        Ok(())
    }

    /// Draining status read for the pull binding. A session that has reached
    /// a terminal state is reaped after this final report, so its buffered
    /// tail and exit code are observable exactly once.
    pub async fn status_drain(&self, session_id: &str) -> RunResult<StatusSnapshot> {
        let mut sessions = self.sessions.write().await;
        let handle = sessions
            .get_mut(session_id)
            .ok_or_else(|| RunError::SessionNotFound(session_id.to_string()))?;

        let snapshot = StatusSnapshot {
            status: handle.status,
            output: std::mem::take(&mut handle.output),
            waiting_for_input: handle.waiting_for_input,
            exit_code: handle.exit_code,
        };

        if snapshot.status.is_terminal() {
            if let Some(mut handle) = sessions.remove(session_id) {
                remove_artifact(session_id, handle.artifact.take());
            }
            debug!(session_id, "completed session reaped after final status read");
        }

        Ok(snapshot)
    }

    /// List live sessions.
    pub async fn list(&self) -> Vec<SessionDetails> {
        let sessions = self.sessions.read().await;
        let mut details: Vec<SessionDetails> = sessions
            .iter()
            .map(|(id, handle)| SessionDetails {
                session_id: id.clone(),
                status: handle.status,
                waiting_for_input: handle.waiting_for_input,
                spawned_at: handle.spawned_at,
            })
            .collect();
        details.sort_by(|a, b| a.spawned_at.cmp(&b.spawned_at));
        details
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// One liveness poll by the exit monitor. Does not mutate terminal
    /// state; the monitor finalizes separately after the pumps drain.
    pub(crate) async fn check_exit(&self, session_id: &str, instance: Uuid) -> ExitPoll {
        let mut sessions = self.sessions.write().await;
        let Some(handle) = sessions.get_mut(session_id) else {
            return ExitPoll::Gone;
        };
        if handle.instance != instance {
            return ExitPoll::Gone;
        }

        match handle.child.try_wait() {
            Ok(Some(status)) => ExitPoll::Exited(status.code().unwrap_or(-1)),
            Ok(None) => ExitPoll::Running {
                stdout_idle: handle.last_stdout_at.elapsed(),
                waiting_for_input: handle.waiting_for_input,
            },
            Err(e) => {
                warn!(session_id, error = %e, "liveness check failed, treating as exited");
                ExitPoll::Exited(-1)
            }
        }
    }

    /// Idle fallback: flag wait state when stdout has gone quiet while the
    /// process is still alive and no content cue has fired. A quiet child
    /// that was just handed input is presumed busy with it, not blocked, so
    /// the fallback stays silent until the child produces output again.
    pub(crate) async fn flag_idle_wait(&self, session_id: &str, instance: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(handle) = sessions.get_mut(session_id) else {
            return false;
        };
        if handle.instance != instance
            || handle.status.is_terminal()
            || handle.waiting_for_input
            || handle.input_since_output
        {
            return false;
        }
        handle.waiting_for_input = true;
        true
    }

    /// Record a natural exit: status, exit code, artifact handed back for
    /// deletion. Returns None when eviction won the race, in which case the
    /// monitor's cleanup becomes a no-op.
    pub(crate) async fn finalize_exit(
        &self,
        session_id: &str,
        instance: Uuid,
        exit_code: i32,
    ) -> Option<Option<PathBuf>> {
        let mut sessions = self.sessions.write().await;
        let handle = sessions.get_mut(session_id)?;
        if handle.instance != instance {
            return None;
        }

        handle.status = SessionStatus::Completed;
        handle.exit_code = Some(exit_code);
        handle.waiting_for_input = false;
        Some(handle.artifact.take())
    }
}

/// Best-effort child termination: SIGTERM, bounded wait, then force kill.
pub(crate) async fn terminate_child(child: &mut Child, grace_period_ms: u64) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
    }

    let deadline = Instant::now() + Duration::from_millis(grace_period_ms);
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(_) => return,
        }
        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    // Still alive after the grace period; force kill and reap.
    if let Err(e) = child.kill().await {
        debug!(error = %e, "force kill failed (process likely already gone)");
    }
}

/// Idempotent artifact removal. Failures are logged, never surfaced.
pub(crate) fn remove_artifact(session_id: &str, artifact: Option<PathBuf>) {
    let Some(path) = artifact else {
        return;
    };
    if let Err(e) = std::fs::remove_file(&path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            let err = RunError::CleanupFailure(e.to_string());
            warn!(session_id, path = %path.display(), error = %err, "artifact cleanup failed");
        }
    } else {
        debug!(session_id, path = %path.display(), "artifact removed");
    }
}
