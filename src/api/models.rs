use serde::{Deserialize, Serialize};

use crate::engine::types::Color;
use crate::session::{ExternalTurn, MoveOutcome, Opponent, SessionSnapshot};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    Local,
    #[default]
    External,
    Peer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub opponent: Option<OpponentKind>,
    /// Colour played by the external opponent or peer. Defaults to black.
    pub color: Option<Color>,
    /// Relay room, required for peer sessions.
    pub room: Option<String>,
    pub elo: Option<u32>,
    pub fen: Option<String>,
}

impl CreateSessionRequest {
    /// Resolve the opponent description, or explain what is missing.
    pub fn opponent(&self) -> Result<Opponent, String> {
        let color = self.color.unwrap_or(Color::Black);
        match self.opponent.unwrap_or_default() {
            OpponentKind::Local => Ok(Opponent::Local),
            OpponentKind::External => Ok(Opponent::External { color }),
            OpponentKind::Peer => match self.room.as_deref().map(str::trim) {
                Some(room) if !room.is_empty() => Ok(Opponent::Peer {
                    color,
                    room: room.to_string(),
                }),
                _ => Err("peer sessions need a room".to_string()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub square: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMoveRequest {
    pub move_san: String,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub suggester: String,
    pub sessions: usize,
    pub relay_connections: usize,
    pub uptime: u64,
}

/// What the external opponent did after a local move.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTurnResponse {
    pub suggester: String,
    pub token: Option<String>,
    pub attempts: u32,
    pub forfeited: bool,
}

impl ExternalTurnResponse {
    pub fn new(suggester: &str, turn: ExternalTurn) -> Self {
        match turn {
            ExternalTurn::Played { token, attempts } => Self {
                suggester: suggester.to_string(),
                token: Some(token),
                attempts,
                forfeited: false,
            },
            ExternalTurn::Forfeited { attempts } => Self {
                suggester: suggester.to_string(),
                token: None,
                attempts,
                forfeited: true,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub accepted: bool,
    pub token: Option<String>,
    pub reason: Option<String>,
    pub external: Option<ExternalTurnResponse>,
    pub session: SessionSnapshot,
}

impl MoveResponse {
    pub fn new(
        outcome: MoveOutcome,
        external: Option<ExternalTurnResponse>,
        session: SessionSnapshot,
    ) -> Self {
        Self {
            accepted: outcome.accepted,
            token: outcome.token,
            reason: outcome.reason,
            external,
            session,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    pub ply: usize,
    pub total_plies: usize,
    pub board: [[String; 8]; 8],
    /// Token that led to this board; empty at ply 0.
    pub last_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_opponent_is_external_black() {
        let req: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(
            req.opponent(),
            Ok(Opponent::External {
                color: Color::Black
            })
        );
    }

    #[test]
    fn peer_needs_a_room() {
        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"opponent":"peer","color":"white"}"#).unwrap();
        assert!(req.opponent().is_err());

        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"opponent":"peer","color":"white","room":"r1"}"#).unwrap();
        assert_eq!(
            req.opponent(),
            Ok(Opponent::Peer {
                color: Color::White,
                room: "r1".into()
            })
        );
    }

    #[test]
    fn peer_move_request_uses_move_san() {
        let req: PeerMoveRequest = serde_json::from_str(r#"{"moveSan":"Nf3"}"#).unwrap();
        assert_eq!(req.move_san, "Nf3");
    }

    #[test]
    fn external_turn_response_shapes() {
        let played = ExternalTurnResponse::new(
            "random",
            ExternalTurn::Played {
                token: "e5".into(),
                attempts: 2,
            },
        );
        assert!(!played.forfeited);
        assert_eq!(played.token.as_deref(), Some("e5"));

        let lost = ExternalTurnResponse::new("gemini", ExternalTurn::Forfeited { attempts: 10 });
        let json = serde_json::to_value(&lost).unwrap();
        assert_eq!(json["forfeited"], true);
        assert_eq!(json["attempts"], 10);
        assert!(json["token"].is_null());
    }
}
