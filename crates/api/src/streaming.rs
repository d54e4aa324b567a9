//! WebSocket streaming API.
//!
//! `GET /streaming?i=<token>` upgrades to a WebSocket once the token resolves
//! to a user. The connection joins that user's room immediately. Server
//! frames are `{"type": <event>, "body": <payload>}`; clients may send
//! `{"type": "join" | "leave", "body": {"userId": n}}`.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use recipebox_common::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::middleware::AppState;
use crate::realtime::{ChannelRegistry, ConnectionId};

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Room addressed by a client message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomBody {
    /// Owner of the room.
    pub user_id: i64,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join a room.
    Join(RoomBody),
    /// Leave a room.
    Leave(RoomBody),
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let token = query.token.ok_or(AppError::Unauthorized)?;
    let user = state.user_service.authenticate_by_token(&token).await?;

    info!(user_id = user.id, "New streaming connection");

    let registry = state.registry.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, registry, user.id)))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, registry: ChannelRegistry, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();
    let (connection, mut outbound) = registry.connect(user_id).await;

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) =
                            handle_client_message(&registry, connection, text.as_str()).await
                        {
                            if sender.send(Message::Text(reply.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, connection, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    registry.disconnect(connection).await;
    info!(user_id, connection, "Streaming connection closed");
}

/// Apply a client message. Returns an error frame to send back, if any.
async fn handle_client_message(
    registry: &ChannelRegistry,
    connection: ConnectionId,
    text: &str,
) -> Option<String> {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, connection, "Failed to parse client message");
            return None;
        }
    };

    match msg {
        ClientMessage::Join(RoomBody { user_id }) => {
            match registry.join(connection, user_id).await {
                Ok(()) => {
                    debug!(connection, user_id, "Joined room");
                    None
                }
                Err(e) => Some(error_frame(&e)),
            }
        }
        ClientMessage::Leave(RoomBody { user_id }) => {
            registry.leave(connection, user_id).await;
            debug!(connection, user_id, "Left room");
            None
        }
    }
}

fn error_frame(err: &AppError) -> String {
    json!({
        "type": "error",
        "body": { "code": err.error_code(), "message": err.to_string() },
    })
    .to_string()
}
