//! services/api/src/web/ws_handler.rs
//!
//! The WebSocket channel for a cooking session. It carries the same named
//! events as the SSE stream and additionally accepts action frames, so a
//! hands-free client can drive the session over one connection.

use crate::{
    cook::{CookAction, Subscription},
    error::ApiError,
    web::{
        cook::{parse_session_id, value_to_string},
        protocol::{ClientMessage, ServerMessage},
        state::AppState,
    },
};
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
///
/// The session is resolved before the upgrade, so an unknown id is answered
/// with a plain 404 instead of an open-then-close socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let session_id = parse_session_id(Some(&session_id))?;
    let subscription = app_state.cook.subscribe(session_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, app_state, session_id, subscription)))
}

async fn handle_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    session_id: Uuid,
    subscription: Subscription,
) {
    info!(%session_id, "New WebSocket connection established.");

    // The sender is shared between the event pump and the reply path.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Event Pump ---
    let pump = {
        let ws_sender = ws_sender.clone();
        let keepalive = app_state.config.cook.keepalive;
        tokio::spawn(pump_events(subscription, ws_sender, keepalive))
    };

    // --- 2. Main Message Loop ---
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                handle_text_message(text.as_str(), &app_state, session_id, &ws_sender).await;
            }
            Some(Ok(Message::Close(_))) => {
                info!(%session_id, "Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(%session_id, "WebSocket receive failed: {}", e);
                break;
            }
            None => {
                info!(%session_id, "Client disconnected.");
                break;
            }
        }
    }

    // --- 3. Cleanup ---
    // Aborting the pump drops the subscription, which detaches the listener.
    pump.abort();
    info!(%session_id, "WebSocket connection closed.");
}

/// Forwards broadcaster events to the socket and pings it on the keep-alive cadence.
/// Ends when the session is removed or the socket stops accepting writes.
async fn pump_events(mut subscription: Subscription, ws_sender: WsSender, keepalive: Duration) {
    let mut ping = tokio::time::interval(keepalive);
    ping.tick().await;

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    if send_json(&ws_sender, &event).await.is_err() {
                        break;
                    }
                }
                None => {
                    debug!(session_id = %subscription.session_id(), "Session closed; ending WebSocket stream.");
                    let _ = ws_sender.lock().await.send(Message::Close(None)).await;
                    break;
                }
            },
            _ = ping.tick() => {
                if ws_sender.lock().await.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn send_json<T: Serialize>(ws_sender: &WsSender, message: &T) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    ws_sender.lock().await.send(Message::Text(json.into())).await
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    session_id: Uuid,
    ws_sender: &WsSender,
) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Action { action, value }) => {
            match apply_client_action(app_state, session_id, &action, value).await {
                Ok(reply) => reply,
                Err(e) => ServerMessage::Error {
                    message: e.to_string(),
                },
            }
        }
        Ok(ClientMessage::Ping) => ServerMessage::Pong,
        Err(e) => {
            warn!(%session_id, "Failed to deserialize client message: {}", e);
            ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            }
        }
    };

    if let Err(e) = send_json(ws_sender, &reply).await {
        debug!(%session_id, "Failed to send WebSocket reply: {}", e);
    }
}

async fn apply_client_action(
    app_state: &Arc<AppState>,
    session_id: Uuid,
    action: &str,
    value: Option<serde_json::Value>,
) -> Result<ServerMessage, ApiError> {
    let action = action.parse::<CookAction>()?;
    let value = value_to_string(value);
    let outcome = app_state
        .cook
        .apply_action(session_id, action, value.as_deref())
        .await?;
    Ok(ServerMessage::ActionResult(outcome))
}

