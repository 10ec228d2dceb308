//! WebSocket upgrade and per-socket read/write pairing.
//!
//! One query parameter decides the lane: `?role=base` registers a base
//! device, anything else is a player socket. Each accepted connection gets a
//! generated `socket_id`, an entry in `AppState::sockets` for outbound
//! delivery, and a reader loop that turns frames into [`EngineCommand`]s.
//! Reader and writer run as split halves over the same socket, with an
//! `mpsc` channel feeding the writer so a slow client never blocks the
//! engine actor's broadcast fan-out.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientMessage, PlayerId, ServerMessage};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::commands::{EngineCommand, SocketKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    #[serde(default)]
    role: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<SocketQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let kind = if query.role.as_deref() == Some("base") { SocketKind::Base } else { SocketKind::Player };
    ws.on_upgrade(move |socket| handle_socket(socket, state, kind))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, kind: SocketKind) {
    let socket_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    state.sockets.write().await.insert(socket_id.clone(), tx);

    let writer_socket_id = socket_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        tracing::debug!(socket_id = %writer_socket_id, "writer task exiting");
    });

    let mut player_id: Option<PlayerId> = None;
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                if let Some(joined) = handle_text(&text, &socket_id, kind, &state).await {
                    player_id = Some(joined);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    writer.abort();
    state.sockets.write().await.remove(&socket_id);
    let _ = state
        .engine_tx
        .send(EngineCommand::SocketClosed { socket_id: socket_id.clone(), kind })
        .await;
    tracing::info!(socket_id = %socket_id, ?kind, "socket closed");
}

/// Dispatches one inbound frame. Returns the player id the socket just
/// authenticated as, when this frame was a successful join/reconnect.
async fn handle_text(text: &str, socket_id: &str, kind: SocketKind, state: &AppState) -> Option<PlayerId> {
    let parsed: Result<ClientMessage, _> = serde_json::from_str(text);
    let Ok(msg) = parsed else {
        send_error(state, socket_id, "bad_request", "malformed message").await;
        return None;
    };

    match msg {
        ClientMessage::PlayerJoin { player_id, name } => {
            if kind != SocketKind::Player {
                return None;
            }
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = state
                .engine_tx
                .send(EngineCommand::PlayerJoin { player_id, socket_id: socket_id.to_string(), name: name.clone(), reply: reply_tx })
                .await;
            match reply_rx.await {
                Ok(Ok(outcome)) => {
                    send_to(
                        state,
                        socket_id,
                        ServerMessage::PlayerJoined {
                            success: true,
                            session_token: Some(outcome.token),
                            player_id,
                            player_number: Some(outcome.number),
                            name,
                            team_id: outcome.team_id,
                        },
                    )
                    .await;
                    Some(player_id)
                }
                Ok(Err(e)) => {
                    send_error(state, socket_id, e.wire_code(), &e.to_string()).await;
                    None
                }
                Err(_) => None,
            }
        }
        ClientMessage::PlayerReconnect { token, .. } => {
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = state
                .engine_tx
                .send(EngineCommand::PlayerReconnect { token, socket_id: socket_id.to_string(), reply: reply_tx })
                .await;
            match reply_rx.await {
                Ok(outcome) => {
                    let resolved = outcome.player_id;
                    send_to(
                        state,
                        socket_id,
                        ServerMessage::PlayerReconnected {
                            success: outcome.success,
                            player_id: outcome.player_id,
                            player_number: outcome.number,
                            name: outcome.name,
                            team_id: outcome.team_id,
                        },
                    )
                    .await;
                    resolved
                }
                Err(_) => None,
            }
        }
        ClientMessage::PlayerMove { player_id, x, y, z, .. } => {
            let _ = state.engine_tx.send(EngineCommand::PlayerMove { player_id, x, y, z }).await;
            None
        }
        ClientMessage::PlayerReady { player_id } => {
            let _ = state.engine_tx.send(EngineCommand::PlayerReady { player_id }).await;
            None
        }
        ClientMessage::PlayerTeamSwitch { player_id } => {
            let _ = state.engine_tx.send(EngineCommand::PlayerTeamSwitch { player_id }).await;
            None
        }
        ClientMessage::BaseJoin => {
            if kind != SocketKind::Base {
                return None;
            }
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = state.engine_tx.send(EngineCommand::BaseJoin { socket_id: socket_id.to_string(), reply: reply_tx }).await;
            if let Ok(Err(e)) = reply_rx.await {
                send_error(state, socket_id, e.wire_code(), &e.to_string()).await;
            }
            None
        }
        ClientMessage::BaseTap { base_id } => {
            let _ = state.engine_tx.send(EngineCommand::BaseTap { base_id }).await;
            None
        }
        ClientMessage::Ping => {
            let _ = state.engine_tx.send(EngineCommand::Ping { socket_id: socket_id.to_string() }).await;
            None
        }
    }
}

async fn send_to(state: &AppState, socket_id: &str, message: ServerMessage) {
    let Ok(text) = serde_json::to_string(&message) else { return };
    if let Some(sender) = state.sockets.read().await.get(socket_id) {
        let _ = sender.send(Message::Text(text.into()));
    }
}

async fn send_error(state: &AppState, socket_id: &str, code: &str, message: &str) {
    send_to(state, socket_id, ServerMessage::Error { code: code.to_string(), message: message.to_string() }).await;
}
