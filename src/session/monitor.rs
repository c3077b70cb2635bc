// src/session/monitor.rs
// Exit monitor: one per session. Polls child liveness, drives the idle
// input-wait fallback, and on exit joins both pumps before finalizing, so
// every line the child produced precedes the completion event.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::registry::{ExitPoll, SessionRegistry, remove_artifact};
use super::types::SessionEvent;

pub fn spawn_monitor(
    registry: Arc<SessionRegistry>,
    session_id: String,
    instance: Uuid,
    pumps: Vec<JoinHandle<()>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        monitor(registry, session_id, instance, pumps).await;
    })
}

async fn monitor(
    registry: Arc<SessionRegistry>,
    session_id: String,
    instance: Uuid,
    pumps: Vec<JoinHandle<()>>,
) {
    let poll_interval = Duration::from_millis(registry.config().monitor_poll_ms);
    let idle_threshold = Duration::from_millis(registry.config().idle_input_ms);
    let idle_detection = registry.config().idle_input_detection;

    let exit_code = loop {
        tokio::time::sleep(poll_interval).await;

        match registry.check_exit(&session_id, instance).await {
            ExitPoll::Gone => {
                // Superseded; eviction already killed the process and
                // removed the artifact. The pumps drain on stream close.
                debug!(session_id, "session evicted, monitor stopping");
                return;
            }
            ExitPoll::Running {
                stdout_idle,
                waiting_for_input,
            } => {
                // Liveness fallback for prompts that match no content cue:
                // a quiet stdout on a live process reads as a blocked child.
                if idle_detection && !waiting_for_input && stdout_idle >= idle_threshold {
                    if registry.flag_idle_wait(&session_id, instance).await {
                        debug!(session_id, "idle fallback flagged input wait");
                        registry.broadcast(SessionEvent::InputRequired {
                            session_id: session_id.clone(),
                        });
                    }
                }
            }
            ExitPoll::Exited(code) => break code,
        }
    };

    // The pipes close on exit; let both pumps deliver everything they have
    // left before the completion event becomes observable.
    for pump in pumps {
        let _ = pump.await;
    }

    match registry.finalize_exit(&session_id, instance, exit_code).await {
        Some(artifact) => {
            remove_artifact(&session_id, artifact);
            info!(session_id, exit_code, "session completed");
            registry.broadcast(SessionEvent::Completed {
                session_id: session_id.clone(),
                exit_code,
            });
        }
        None => {
            // Eviction won the race; its cleanup already ran.
            debug!(session_id, "session superseded during finalize, no-op");
        }
    }
}
