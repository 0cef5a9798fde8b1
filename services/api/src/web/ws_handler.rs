//! services/api/src/web/ws_handler.rs
//!
//! The WebSocket change feed. Each connection subscribes to the store's event
//! broadcast and forwards every change until the client goes away.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use campus_core::store::StoreEvent;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

type WsSender = SplitSink<WebSocket, Message>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // Subscribe before reading the revision so no change falls in between.
    let mut events = app_state.service.subscribe();
    let revision = app_state.service.read(|s| s.revision()).await;
    info!(revision, "New WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    if send(&mut sender, &ServerMessage::Connected { revision }).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                let delivered = match event {
                    Ok(event) => forward_event(&mut sender, event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client fell behind the change feed");
                        send(&mut sender, &ServerMessage::Lagged { skipped }).await.is_ok()
                    }
                    Err(RecvError::Closed) => false,
                };
                if !delivered {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if handle_text_message(text.as_str(), &app_state, &mut sender).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client disconnected.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive failed: {}", e);
                    break;
                }
            }
        }
    }

    info!("WebSocket connection closed.");
}

async fn forward_event(sender: &mut WsSender, event: StoreEvent) -> bool {
    for change in event.changes {
        let msg = ServerMessage::StateChanged {
            change,
            revision: event.revision,
        };
        if send(sender, &msg).await.is_err() {
            return false;
        }
    }
    true
}

async fn handle_text_message(
    text: &str,
    app_state: &AppState,
    sender: &mut WsSender,
) -> Result<(), axum::Error> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => {
            let revision = app_state.service.read(|s| s.revision()).await;
            send(sender, &ServerMessage::Pong { revision }).await
        }
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let msg = ServerMessage::Error {
                message: "unrecognised message".to_string(),
            };
            send(sender, &msg).await
        }
    }
}

async fn send(sender: &mut WsSender, msg: &ServerMessage) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to encode server message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}
