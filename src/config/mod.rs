// src/config/mod.rs
// Environment-driven server configuration. Every value can be set from the
// environment (or a .env file); the defaults are usable out of the box.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct RunboxConfig {
    // ── Server Configuration
    pub host: String,
    pub port: u16,

    // ── Interpreter Configuration
    pub interpreter: String,
    pub interpreter_args: Vec<String>,
    pub artifact_suffix: String,

    // ── Session Lifecycle
    pub grace_period_ms: u64,
    pub monitor_poll_ms: u64,

    // ── Input-Wait Heuristic
    pub punctuation_cues: bool,
    pub idle_input_detection: bool,
    pub idle_input_ms: u64,

    // ── Logging Configuration
    pub log_level: String,
}

// Handles values with trailing comments and extra whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl RunboxConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists
        let _ = dotenvy::dotenv();

        Self {
            host: env_var_or("RUNBOX_HOST", "0.0.0.0".to_string()),
            port: env_var_or("RUNBOX_PORT", 8080),
            interpreter: env_var_or("RUNBOX_INTERPRETER", "python3".to_string()),
            interpreter_args: env_var_or("RUNBOX_INTERPRETER_ARGS", "-u".to_string())
                .split_whitespace()
                .map(String::from)
                .collect(),
            artifact_suffix: env_var_or("RUNBOX_ARTIFACT_SUFFIX", ".py".to_string()),
            grace_period_ms: env_var_or("RUNBOX_GRACE_PERIOD_MS", 500),
            monitor_poll_ms: env_var_or("RUNBOX_MONITOR_POLL_MS", 100),
            punctuation_cues: env_var_or("RUNBOX_PUNCTUATION_CUES", true),
            idle_input_detection: env_var_or("RUNBOX_IDLE_INPUT_DETECTION", true),
            idle_input_ms: env_var_or("RUNBOX_IDLE_INPUT_MS", 2000),
            log_level: env_var_or("RUNBOX_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<RunboxConfig> = Lazy::new(RunboxConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RunboxConfig::from_env();

        assert_eq!(config.interpreter, "python3");
        assert_eq!(config.interpreter_args, vec!["-u".to_string()]);
        assert!(config.grace_period_ms > 0);
    }

    #[test]
    fn test_bind_address() {
        let config = RunboxConfig::from_env();
        assert!(config.bind_address().contains(':'));
    }

    #[test]
    fn test_env_var_or_strips_comments() {
        unsafe { std::env::set_var("RUNBOX_TEST_COMMENTED", "42 # poll interval") };
        let parsed: u64 = env_var_or("RUNBOX_TEST_COMMENTED", 0);
        assert_eq!(parsed, 42);
        unsafe { std::env::remove_var("RUNBOX_TEST_COMMENTED") };
    }
}
