// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

pub use error::{RunError, RunResult};
