// src/api/http/mod.rs

mod handlers;
mod router;
mod sessions;

pub use handlers::health_handler;
pub use router::http_router;
pub use sessions::{input_handler, list_sessions_handler, run_handler, status_handler};
