use serde::{Deserialize, Serialize};

use crate::engine::game::GameState;
use crate::engine::notation;
use crate::engine::types::{Color, PieceType};

// ---------------------------------------------------------------------------
// Request sent to a suggester
// ---------------------------------------------------------------------------

/// One occupied square in `boardState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCell {
    pub piece: PieceType,
    /// `"W"` or `"B"`.
    pub color: String,
}

/// Everything a suggester is told about the position. Field names follow
/// the `/api/data` JSON contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    /// Tokens played so far, in order.
    pub move_history: Vec<String>,
    /// Whether the side to move is in check.
    pub is_check: bool,
    /// Row 0 = rank 8; `null` for empty squares.
    pub board_state: Vec<Vec<Option<BoardCell>>>,
    /// Opaque difficulty.
    pub elo_skill: u32,
    #[serde(default)]
    pub fen: String,
    pub side_to_move: Color,
    /// Tokens of every legal move for the side to move.
    #[serde(default)]
    pub legal_moves: Vec<String>,
}

impl SuggestRequest {
    /// Snapshot the game for the side to move.
    pub fn from_game(game: &GameState, elo_skill: u32) -> Self {
        let board = game.board();
        let board_state = board
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        cell.map(|piece| BoardCell {
                            piece: piece.kind,
                            color: match piece.color {
                                Color::White => "W".to_string(),
                                Color::Black => "B".to_string(),
                            },
                        })
                    })
                    .collect()
            })
            .collect();

        SuggestRequest {
            move_history: game.tokens(),
            is_check: game.is_check(),
            board_state,
            elo_skill,
            fen: game.to_fen(),
            side_to_move: game.side_to_move(),
            legal_moves: game
                .legal_moves()
                .iter()
                .map(|mv| notation::encode(board, mv))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures talking to a suggester. All of them are retried by the session.
#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("unsupported suggester: {0}")]
    UnsupportedProvider(String),

    #[error("no API key configured for suggester: {0}")]
    MissingApiKey(String),

    #[error("suggester unreachable: {0}")]
    Unreachable(String),

    #[error("suggester error: {0}")]
    Provider(String),

    #[error("failed to parse suggester response: {0}")]
    Parse(String),

    #[error("suggester returned no move")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_from_starting_game() {
        let game = GameState::new();
        let req = SuggestRequest::from_game(&game, 1500);
        assert!(req.move_history.is_empty());
        assert!(!req.is_check);
        assert_eq!(req.elo_skill, 1500);
        assert_eq!(req.side_to_move, Color::White);
        assert_eq!(req.legal_moves.len(), 20);
        assert_eq!(
            req.board_state[0][0],
            Some(BoardCell {
                piece: PieceType::Rook,
                color: "B".into()
            })
        );
        assert_eq!(req.board_state[4][4], None);
    }

    #[test]
    fn request_serialises_with_wire_names() {
        let mut game = GameState::new();
        game.apply_token("e4").unwrap();
        let req = SuggestRequest::from_game(&game, 1800);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["moveHistory"], serde_json::json!(["e4"]));
        assert_eq!(json["isCheck"], false);
        assert_eq!(json["eloSkill"], 1800);
        assert_eq!(json["sideToMove"], "black");
        assert_eq!(json["boardState"][7][4]["piece"], "King");
        assert_eq!(json["boardState"][7][4]["color"], "W");
        assert!(json["boardState"][3][3].is_null());
    }
}
