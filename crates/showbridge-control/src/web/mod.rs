//! Client-facing WebSocket and HTTP API

pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod server;
pub mod websocket;

pub use handlers::{ApiResponse, StatusResponse};
pub use protocol::{ClientCommand, ExecCommand, ServerEvent};
pub use server::{app, AppState, WebServer};
