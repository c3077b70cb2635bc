// src/api/mod.rs
// API module with clean, organized structure

pub mod error;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used items for external convenience
pub use error::{ApiError, ApiResult};
pub use types::*;

// Note: Router composition is handled directly in main.rs
