// src/session/mod.rs
// Interactive session core: one child process per session, stream pumps,
// input-wait heuristic, input relay, and exit monitoring over a shared
// registry.

pub mod launcher;
pub mod monitor;
pub mod prompt;
pub mod pump;
pub mod registry;
pub mod types;

pub use launcher::launch;
pub use prompt::{CueDetector, PromptDetector};
pub use registry::{SessionRegistry, StatusSnapshot};
pub use types::{
    LauncherConfig, OutputEvent, OutputKind, SessionDetails, SessionEvent, SessionStatus,
};
