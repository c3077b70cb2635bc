// src/session/types.rs
// Core data types for interactive script sessions.

use serde::{Deserialize, Serialize};

// ============================================================================
// Session Types
// ============================================================================

/// Status of a script session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Process is running and active
    Running,
    /// Process exited on its own
    Completed,
    /// Session was killed, usually superseded by a newer run with the same id
    Terminated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }
}

// ============================================================================
// Output Events
// ============================================================================

/// Which stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// A line from stdout
    Output,
    /// A line from stderr (or a synthetic pump failure line)
    Error,
}

/// One line produced by the child process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub text: String,
}

impl OutputEvent {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Output,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Error,
            text: text.into(),
        }
    }
}

// ============================================================================
// Session Events (broadcast to push-binding clients)
// ============================================================================

/// Events broadcast as session activity happens. The pull binding ignores
/// these and drains the per-session buffer instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Process spawned and registered
    Started { session_id: String },

    /// One line of child output
    Output {
        session_id: String,
        event: OutputEvent,
    },

    /// The wait heuristic believes the child is blocked reading input
    InputRequired { session_id: String },

    /// Process exited; artifact cleaned up
    Completed {
        session_id: String,
        exit_code: i32,
    },
}

impl SessionEvent {
    /// Session this event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            Self::Started { session_id }
            | Self::Output { session_id, .. }
            | Self::InputRequired { session_id }
            | Self::Completed { session_id, .. } => session_id,
        }
    }
}

// ============================================================================
// Session Details (for API responses)
// ============================================================================

/// Session summary for the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetails {
    pub session_id: String,
    pub status: SessionStatus,
    pub waiting_for_input: bool,
    pub spawned_at: i64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the launcher and exit monitor. Injected into the
/// registry so tests can swap the interpreter without touching global state.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Interpreter binary (default: "python3")
    pub interpreter: String,
    /// Arguments placed before the artifact path. The default disables
    /// output buffering; without it the wait heuristic never sees
    /// partial output.
    pub interpreter_args: Vec<String>,
    /// File suffix for materialized artifacts
    pub artifact_suffix: String,
    /// How long to wait after SIGTERM before force-killing a superseded child
    pub grace_period_ms: u64,
    /// Exit monitor liveness poll interval
    pub monitor_poll_ms: u64,
    /// Treat ':' and '?' in a stdout line as input cues
    pub punctuation_cues: bool,
    /// Flag wait state when stdout goes quiet while the process is alive
    pub idle_input_detection: bool,
    /// Quiet period before the idle fallback fires
    pub idle_input_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            interpreter_args: vec!["-u".to_string()],
            artifact_suffix: ".py".to_string(),
            grace_period_ms: 500,
            monitor_poll_ms: 100,
            punctuation_cues: true,
            idle_input_detection: true,
            idle_input_ms: 2000,
        }
    }
}

impl LauncherConfig {
    pub fn from_env() -> Self {
        let config = crate::config::RunboxConfig::from_env();
        Self {
            interpreter: config.interpreter,
            interpreter_args: config.interpreter_args,
            artifact_suffix: config.artifact_suffix,
            grace_period_ms: config.grace_period_ms,
            monitor_poll_ms: config.monitor_poll_ms,
            punctuation_cues: config.punctuation_cues,
            idle_input_detection: config.idle_input_detection,
            idle_input_ms: config.idle_input_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Terminated.is_terminal());
    }

    #[test]
    fn test_output_event_wire_shape() {
        let event = OutputEvent::stdout("hello");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "output");
        assert_eq!(json["text"], "hello");

        let event = OutputEvent::stderr("boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
    }

    #[test]
    fn test_session_event_tagged() {
        let event = SessionEvent::Completed {
            session_id: "s1".to_string(),
            exit_code: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(event.session_id(), "s1");
    }
}
