//! WebSocket handler for the client connection

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::protocol::{ClientCommand, ServerEvent};
use super::server::AppState;

/// Events buffered per client before new ones are dropped
pub const CLIENT_OUTBOX_CAPACITY: usize = 256;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut events) = mpsc::channel::<ServerEvent>(CLIENT_OUTBOX_CAPACITY);

    let id = match state.hub.connect(outbox).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Rejecting WebSocket client: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    // Writer: the hub closes the outbox to disconnect us
    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match ClientCommand::decode(&text) {
                Ok(command) => {
                    if state.hub.command(id, command).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(client = id, "Error handling WebSocket message: {}", e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(client = id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    state.hub.disconnect(id).await;
    if let Err(e) = writer.await {
        tracing::debug!(client = id, "WebSocket writer ended abnormally: {}", e);
    }
}
