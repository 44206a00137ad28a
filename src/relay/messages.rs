//! Wire types for the peer relay.

use serde::{Deserialize, Serialize};

/// A move travelling between peers in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub room_id: String,
    pub move_san: String,
    /// Client or session that produced the move.
    #[serde(default)]
    pub source_player_id: String,
}

/// Envelope pushed to relay clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RelayEvent {
    /// Sent once to a client after it joins a room.
    Joined {
        room_id: String,
        player_id: String,
        players: usize,
    },
    /// A move made by someone else in the room.
    Move(RelayMessage),
    /// Something the client sent could not be used.
    Error { message: String },
}

impl RelayEvent {
    pub fn error(message: impl Into<String>) -> Self {
        RelayEvent::Error {
            message: message.into(),
        }
    }

    /// Serialize to a JSON string for sending over WS.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","message":"serialization failed"}"#.to_string()
        })
    }
}
