// src/api/ws/mod.rs
// WebSocket API module: connection handling and event fan-out.
// Router composition is handled directly in main.rs.

pub mod message;
pub mod session;

pub use message::{WsClientMessage, WsServerMessage};
pub use session::ws_session_handler;
