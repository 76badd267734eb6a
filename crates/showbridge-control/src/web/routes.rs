//! Route definitions

use axum::{routing::get, Router};

use super::handlers::{get_executors, get_status};
use super::server::AppState;
use super::websocket::ws_handler;

/// Build the router: the client socket plus the status API
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/api/status", get(get_status))
        .route("/api/executors", get(get_executors))
}
