//! WebSocket handler for controller and info-screen connections
//!
//! Handles WebSocket upgrade, connection lifecycle, and frame dispatch to the
//! coordinator.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::messages::{ClientEvent, ServerEvent};
use crate::coordinator::HandoffCoordinator;
use crate::core_types::SessionId;
use crate::gateway::state::AppState;

/// WebSocket upgrade handler
///
/// Endpoint: GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let coordinator = state.coordinator.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

/// Handle WebSocket connection lifecycle
async fn handle_socket(socket: WebSocket, coordinator: Arc<HandoffCoordinator>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Queues the `connected` greeting ahead of anything else
    let session_id = coordinator.attach(tx).await;

    // Forward events from the channel to the socket, in channel order
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(session_id, error = %e, "Failed to encode frame");
                }
            }
        }
    });

    // Inbound frames are applied one at a time, in arrival order
    let recv_coordinator = coordinator.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    dispatch_text(&recv_coordinator, session_id, text.as_str()).await
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    coordinator.detach(session_id).await;
}

async fn dispatch_text(coordinator: &HandoffCoordinator, session_id: SessionId, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            tracing::debug!(session_id, event = event.name(), "Frame received");
            coordinator.handle_client_event(session_id, event).await;
        }
        Err(e) => {
            tracing::warn!(session_id, error = %e, "Unparsable frame");
            coordinator.connections().send_to(
                session_id,
                ServerEvent::Error {
                    code: "INVALID_MESSAGE".to_string(),
                    msg: e.to_string(),
                    request: None,
                },
            );
        }
    }
}
