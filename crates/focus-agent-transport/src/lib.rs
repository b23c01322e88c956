//! Transport layer for focus sessions.
//!
//! Provides:
//! - Wire bodies for the HTTP API
//! - HTTP handlers and router
//! - WebSocket subscription endpoint

pub mod error;
pub mod http;
pub mod protocol;
pub mod websocket;

pub use error::ApiError;
pub use http::{AppState, create_router};
pub use protocol::{AnalyzeRequest, AnalyzeResponse, SessionInfo, SessionStartRequest};
