// src/session/prompt.rs
// Input-wait heuristic over stdout line content.
//
// Deliberately permissive: it matches line text, so it both over-fires (any
// line containing ':' or '?') and under-fires (a prompt printed without a
// trailing newline before a blocking read never reaches the pump). The
// liveness fallback in the exit monitor covers part of the second case.

/// Strategy for deciding whether a stdout line is an input prompt.
///
/// Kept behind a trait so the substring heuristic can be replaced by a more
/// precise signal (explicit prompt markers, real blocking-read detection)
/// without touching the pump pipeline.
pub trait PromptDetector: Send + Sync {
    fn is_input_cue(&self, line: &str) -> bool;
}

/// Substring-based detector: a line is an input cue if it contains "input"
/// case-insensitively, or (when punctuation cues are enabled) a ':' or '?'.
#[derive(Debug, Clone)]
pub struct CueDetector {
    punctuation_cues: bool,
}

impl CueDetector {
    pub fn new(punctuation_cues: bool) -> Self {
        Self { punctuation_cues }
    }
}

impl Default for CueDetector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PromptDetector for CueDetector {
    fn is_input_cue(&self, line: &str) -> bool {
        if line.to_lowercase().contains("input") {
            return true;
        }
        self.punctuation_cues && (line.contains(':') || line.contains('?'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_substring_cue() {
        let detector = CueDetector::new(false);
        assert!(detector.is_input_cue("Please provide input"));
        assert!(detector.is_input_cue("INPUT expected"));
        assert!(detector.is_input_cue("waiting for Input now"));
        assert!(!detector.is_input_cue("plain progress line"));
    }

    #[test]
    fn test_punctuation_cues() {
        let detector = CueDetector::new(true);
        assert!(detector.is_input_cue("Enter name:"));
        assert!(detector.is_input_cue("Continue?"));
        assert!(!detector.is_input_cue("no cue here"));
    }

    #[test]
    fn test_punctuation_cues_disabled() {
        let detector = CueDetector::new(false);
        assert!(!detector.is_input_cue("Enter name:"));
        assert!(!detector.is_input_cue("Continue?"));
    }

    #[test]
    fn test_detector_is_swappable() {
        struct MarkerDetector;
        impl PromptDetector for MarkerDetector {
            fn is_input_cue(&self, line: &str) -> bool {
                line.starts_with(">>PROMPT<<")
            }
        }

        let detector: Box<dyn PromptDetector> = Box::new(MarkerDetector);
        assert!(detector.is_input_cue(">>PROMPT<< name"));
        assert!(!detector.is_input_cue("Enter name:"));
    }
}
