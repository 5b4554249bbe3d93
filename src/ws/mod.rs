mod admin;
pub mod handlers;
mod viewer;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

pub fn parse_role(role: Option<&str>) -> Role {
    match role {
        Some("admin") => Role::Admin,
        _ => Role::Viewer,
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request: role={:?}", params.role);
    let role = parse_role(params.role.as_deref());
    ws.on_upgrade(move |socket| handle_socket(socket, role, state))
}

/// Welcome message with the current snapshot for a freshly connected session
pub async fn welcome(state: &AppState, role: Role) -> ServerMessage {
    ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role,
        snapshot: state.snapshot().await,
        broadcast_interval_ms: state.config.broadcast_interval.as_millis() as u64,
        server_now: chrono::Utc::now().to_rfc3339(),
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("WebSocket connected with role: {:?}", role);

    // Subscribe before building the welcome so no mutation falls in between
    let mut broadcast_rx = state.broadcast.subscribe();

    let welcome = welcome(&state, role).await;
    if let Ok(msg) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(msg.into())).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // The next snapshot or heartbeat brings the session back in sync
                        tracing::warn!("Session lagged, skipped {} messages", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handlers::handle_message(client_msg, &role, &state).await,
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };

                        if let Some(response) = response {
                            if let Ok(json) = serde_json::to_string(&response) {
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    tracing::error!("Failed to send response");
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParticipantRecord;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(Some("admin")), Role::Admin);
        assert_eq!(parse_role(Some("viewer")), Role::Viewer);
        assert_eq!(parse_role(Some("host")), Role::Viewer);
        assert_eq!(parse_role(None), Role::Viewer);
    }

    #[tokio::test]
    async fn test_welcome_carries_snapshot_and_interval() {
        let state = AppState::default();
        state
            .replace_roster(&[ParticipantRecord::new("A", "B", "C", "1")])
            .await
            .unwrap();

        match welcome(&state, Role::Viewer).await {
            ServerMessage::Welcome {
                role,
                snapshot,
                broadcast_interval_ms,
                ..
            } => {
                assert_eq!(role, Role::Viewer);
                assert_eq!(snapshot.participants.len(), 1);
                assert_eq!(broadcast_interval_ms, 5000);
            }
            other => panic!("Expected Welcome, got {:?}", other),
        }
    }
}
