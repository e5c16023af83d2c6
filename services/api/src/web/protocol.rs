//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol for a cooking session. Server pushes
//! reuse the `CookEvent` envelope (`{"event": ..., "data": ...}`); the messages
//! below are the ones only the bidirectional channel needs.

use crate::cook::ActionOutcome;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Issues a cooking action, exactly as `POST /cook/action` would.
    Action {
        action: String,
        #[serde(default)]
        value: Option<serde_json::Value>,
    },

    /// Application-level liveness probe; answered with `pong`.
    Ping,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// Replies to client messages. Shares the `event`/`data` envelope with `CookEvent`.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The result of an `action` message.
    ActionResult(ActionOutcome),

    Pong,

    /// Reports a rejected message. The connection stays open.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_message_accepts_numeric_and_missing_values() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"action","action":"add_time","value":30}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Action {
                action: "add_time".to_string(),
                value: Some(serde_json::json!(30)),
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"action","action":"next"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Action { value: None, .. }));
    }

    #[test]
    fn error_reply_uses_event_envelope() {
        let json = serde_json::to_value(ServerMessage::Error {
            message: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "nope");
    }
}
