//! Stateful game record wrapping a [`Position`].
//!
//! `GameState` is the single mutable entity of the engine. It only moves
//! forward: every accepted move is validated by the legality engine,
//! applied by the executor, encoded, and appended to the history together
//! with the board it produced. Replay is a read-only view over those
//! stored boards.

use crate::engine::board::{Board, Position};
use crate::engine::types::{CandidateMove, ChessError, Color, DrawReason, GameStatus, Square};
use crate::engine::{executor, legality, notation, outcome};

// =========================================================================
// MoveRecord
// =========================================================================

/// A recorded move in the game history.
#[derive(Clone, Debug)]
pub struct MoveRecord {
    /// The move that was played.
    pub mv: CandidateMove,
    /// Who played it.
    pub color: Color,
    /// The token for the move, including any `+` / `#` suffix.
    pub token: String,
    /// What game status resulted from this move.
    pub status_after: GameStatus,
}

// =========================================================================
// GameState
// =========================================================================

/// A chess game with history, replay boards and status tracking.
#[derive(Clone, Debug)]
pub struct GameState {
    position: Position,
    history: Vec<MoveRecord>,
    /// Board before the first move, then after every ply.
    boards: Vec<Board>,
    /// Every position reached, including the current one, for repetition.
    positions: Vec<Position>,
    halfmove_clock: u32,
    fullmove_number: u32,
    status: GameStatus,
}

impl GameState {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        let position = Position::starting();
        Self {
            position,
            history: Vec::new(),
            boards: vec![position.board],
            positions: vec![position],
            halfmove_clock: 0,
            fullmove_number: 1,
            status: GameStatus::InProgress,
        }
    }

    /// Create a game from a FEN string. The en passant field is accepted
    /// and ignored; missing clocks default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let position = Position::from_fen(fen)?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let clock = |idx: usize, default: u32| -> Result<u32, ChessError> {
            match fields.get(idx) {
                None => Ok(default),
                Some(s) => s
                    .parse()
                    .map_err(|_| ChessError::InvalidFen(format!("bad move counter '{s}'"))),
            }
        };
        let halfmove_clock = clock(4, 0)?;
        let fullmove_number = clock(5, 1)?.max(1);

        let mut game = Self {
            position,
            history: Vec::new(),
            boards: vec![position.board],
            positions: vec![position],
            halfmove_clock,
            fullmove_number,
            status: GameStatus::InProgress,
        };
        game.status = game.compute_status()?;
        Ok(game)
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn board(&self) -> &Board {
        &self.position.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Move tokens in play order.
    pub fn tokens(&self) -> Vec<String> {
        self.history.iter().map(|r| r.token.clone()).collect()
    }

    /// All legal moves for the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<CandidateMove> {
        if self.is_game_over() {
            return Vec::new();
        }
        legality::legal_moves(&self.position)
    }

    /// Legal destinations from `sq`; empty once the game is over.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Square> {
        if self.is_game_over() {
            return Vec::new();
        }
        legality::legal_moves_from(&self.position, sq)
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    pub fn is_check(&self) -> bool {
        self.status.is_check()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of half-moves played.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Current position as a full FEN string (en passant is always `-`).
    pub fn to_fen(&self) -> String {
        format!(
            "{} - {} {}",
            self.position.to_fen_fields(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Board after `ply` half-moves; `0` is the starting board.
    pub fn board_at(&self, ply: usize) -> Option<&Board> {
        self.boards.get(ply)
    }

    // -----------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------

    /// Play `from -> to` for the side to move. Returns the token recorded
    /// for the move.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> Result<String, ChessError> {
        self.ensure_not_over()?;
        let mv = legality::classify(&self.position, from, to)
            .ok_or_else(|| ChessError::illegal(from, to, "not a legal move"))?;
        self.play(mv)
    }

    /// Decode `token` for the side to move and play it.
    pub fn apply_token(&mut self, token: &str) -> Result<String, ChessError> {
        self.ensure_not_over()?;
        let mv = notation::decode(&self.position, token, self.position.side_to_move)
            .ok_or_else(|| ChessError::UnrecognizedMove(token.to_string()))?;
        self.play(mv)
    }

    /// End the game in favour of the opponent of `loser`.
    pub fn forfeit(&mut self, loser: Color) {
        if !self.is_game_over() {
            self.status = GameStatus::Forfeit { winner: !loser };
        }
    }

    fn ensure_not_over(&self) -> Result<(), ChessError> {
        if self.is_game_over() {
            return Err(ChessError::GameOver(self.status.to_string()));
        }
        Ok(())
    }

    /// Apply a move already approved by the legality engine.
    fn play(&mut self, mv: CandidateMove) -> Result<String, ChessError> {
        let color = self.position.side_to_move;
        let token = notation::encode(&self.position.board, &mv);

        let applied = executor::apply(&mut self.position, mv)?;

        if applied.is_irreversible() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if color == Color::Black {
            self.fullmove_number += 1;
        }
        self.positions.push(self.position);
        self.boards.push(self.position.board);

        let status = self.compute_status()?;
        self.status = status;

        let token = match status {
            GameStatus::Checkmate { .. } => format!("{token}#"),
            GameStatus::Check(_) => format!("{token}+"),
            _ => token,
        };

        self.history.push(MoveRecord {
            mv,
            color,
            token: token.clone(),
            status_after: status,
        });

        Ok(token)
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    fn compute_status(&self) -> Result<GameStatus, ChessError> {
        let status = outcome::evaluate(&self.position, self.position.side_to_move)?;
        if status.is_game_over() {
            return Ok(status);
        }

        if self.halfmove_clock >= 100 {
            return Ok(GameStatus::Draw(DrawReason::FiftyMoveRule));
        }
        if self.is_threefold_repetition() {
            return Ok(GameStatus::Draw(DrawReason::ThreefoldRepetition));
        }
        if outcome::is_insufficient_material(&self.position.board) {
            return Ok(GameStatus::Draw(DrawReason::InsufficientMaterial));
        }

        Ok(status)
    }

    /// The current placement, side and castling rights have occurred 3+ times.
    fn is_threefold_repetition(&self) -> bool {
        let current = self.position;
        self.positions.iter().filter(|&&p| p == current).count() >= 3
    }

    // -----------------------------------------------------------------
    // Board array (for API responses)
    // -----------------------------------------------------------------

    /// 8×8 board array, row 0 = rank 8. Empty squares are empty strings,
    /// pieces are like "wP", "bK".
    pub fn board_array(&self) -> [[String; 8]; 8] {
        board_array(&self.position.board)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// 8×8 array of "wP"-style piece codes for any board.
pub fn board_array(board: &Board) -> [[String; 8]; 8] {
    let rows = board.rows();
    std::array::from_fn(|r| {
        std::array::from_fn(|c| match rows[r][c] {
            Some(piece) => {
                let color = match piece.color {
                    Color::White => 'w',
                    Color::Black => 'b',
                };
                format!("{color}{}", piece.kind.letter())
            }
            None => String::new(),
        })
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::START_FEN;
    use crate::engine::types::{Piece, PieceType};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play(g: &mut GameState, from: &str, to: &str) -> String {
        g.attempt_move(sq(from), sq(to)).unwrap()
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    #[test]
    fn new_game_is_in_progress() {
        let g = GameState::new();
        assert_eq!(g.status(), GameStatus::InProgress);
        assert!(!g.is_game_over());
        assert_eq!(g.side_to_move(), Color::White);
        assert_eq!(g.fullmove_number(), 1);
        assert_eq!(g.to_fen(), START_FEN);
        assert_eq!(g.legal_moves().len(), 20);
    }

    #[test]
    fn game_from_fen() {
        let g =
            GameState::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        assert_eq!(g.side_to_move(), Color::Black);
        assert_eq!(
            g.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn game_from_invalid_fen() {
        assert!(GameState::from_fen("invalid").is_err());
        assert!(GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1").is_err());
    }

    // -----------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------

    #[test]
    fn attempt_move_records_token() {
        let mut g = GameState::new();
        assert_eq!(play(&mut g, "e2", "e4"), "e4");
        assert_eq!(g.side_to_move(), Color::Black);
        assert_eq!(g.tokens(), vec!["e4"]);
        assert_eq!(g.history()[0].color, Color::White);
    }

    #[test]
    fn illegal_move_leaves_state_untouched() {
        let mut g = GameState::new();
        let before = g.to_fen();
        let err = g.attempt_move(sq("e2"), sq("e5")).unwrap_err();
        assert!(matches!(err, ChessError::IllegalMove { .. }));
        assert_eq!(g.to_fen(), before);
        assert!(g.history().is_empty());
    }

    #[test]
    fn apply_token_decodes_for_side_to_move() {
        let mut g = GameState::new();
        g.apply_token("e4").unwrap();
        assert_eq!(g.apply_token("e5").unwrap(), "e5");
        assert_eq!(
            g.apply_token("Nf6"),
            Err(ChessError::UnrecognizedMove("Nf6".into()))
        );
        assert_eq!(g.apply_token("Nf3").unwrap(), "Nf3");
    }

    #[test]
    fn check_suffix() {
        let mut g = GameState::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "f7", "f6");
        assert_eq!(play(&mut g, "d1", "h5"), "Qh5+");
        assert_eq!(g.status(), GameStatus::Check(Color::Black));
    }

    #[test]
    fn move_on_finished_game_errors() {
        // Fool's mate: 1. f3 e5 2. g4 Qh4#
        let mut g = GameState::new();
        play(&mut g, "f2", "f3");
        play(&mut g, "e7", "e5");
        play(&mut g, "g2", "g4");
        assert_eq!(play(&mut g, "d8", "h4"), "Qh4#");
        assert_eq!(
            g.status(),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert!(g.legal_moves().is_empty());
        assert!(matches!(
            g.attempt_move(sq("e2"), sq("e4")),
            Err(ChessError::GameOver(_))
        ));
    }

    #[test]
    fn forfeit_ends_the_game() {
        let mut g = GameState::new();
        g.forfeit(Color::Black);
        assert_eq!(
            g.status(),
            GameStatus::Forfeit {
                winner: Color::White
            }
        );
        assert!(g.apply_token("e4").is_err());
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    #[test]
    fn scholars_mate() {
        let mut g = GameState::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "e7", "e5");
        play(&mut g, "f1", "c4");
        play(&mut g, "b8", "c6");
        play(&mut g, "d1", "h5");
        play(&mut g, "g8", "f6");
        assert_eq!(play(&mut g, "h5", "f7"), "Qxf7#");
        assert_eq!(
            g.status(),
            GameStatus::Checkmate {
                winner: Color::White
            }
        );
    }

    #[test]
    fn stalemate_detection() {
        let g = GameState::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(g.status(), GameStatus::Stalemate);
    }

    #[test]
    fn fifty_move_rule_detection() {
        let g = GameState::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        assert_eq!(g.status(), GameStatus::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_moves_and_captures() {
        let mut g = GameState::new();
        play(&mut g, "g1", "f3");
        play(&mut g, "b8", "c6");
        assert_eq!(g.halfmove_clock(), 2);
        play(&mut g, "e2", "e4");
        assert_eq!(g.halfmove_clock(), 0);
        assert_eq!(g.fullmove_number(), 2);
    }

    #[test]
    fn insufficient_material_ends_the_game() {
        let mut g = GameState::from_fen("4k3/8/8/8/8/8/4n3/4K3 w - - 0 1").unwrap();
        assert_eq!(
            g.status(),
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        );
        // Already drawn, nothing more can be played.
        assert!(g.attempt_move(sq("e1"), sq("e2")).is_err());
    }

    #[test]
    fn sufficient_material_with_pawns() {
        let g = GameState::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(g.status(), GameStatus::InProgress);
    }

    #[test]
    fn threefold_repetition() {
        let mut g = GameState::new();
        for _ in 0..2 {
            play(&mut g, "g1", "f3");
            play(&mut g, "g8", "f6");
            play(&mut g, "f3", "g1");
            play(&mut g, "f6", "g8");
        }
        assert_eq!(
            g.status(),
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        );
    }

    #[test]
    fn repetition_counts_castling_rights() {
        // The rook shuffle changes castling rights, so the first position
        // never repeats.
        let mut g = GameState::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        for _ in 0..2 {
            play(&mut g, "a1", "a2");
            play(&mut g, "e8", "d8");
            play(&mut g, "a2", "a1");
            play(&mut g, "d8", "e8");
        }
        assert_eq!(g.status(), GameStatus::InProgress);
        play(&mut g, "a1", "a2");
        assert_eq!(
            g.status(),
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        );
    }

    // -----------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------

    #[test]
    fn board_at_each_ply() {
        let mut g = GameState::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "e7", "e5");
        assert_eq!(g.ply(), 2);
        assert_eq!(g.board_at(0), Some(&Board::starting()));
        let after_first = g.board_at(1).unwrap();
        assert_eq!(
            after_first.piece_at(sq("e4")),
            Some(Piece::new(PieceType::Pawn, Color::White))
        );
        assert!(after_first.is_empty(sq("e5")));
        assert_eq!(g.board_at(2), Some(g.board()));
        assert_eq!(g.board_at(3), None);
    }

    #[test]
    fn board_array_starting_position() {
        let g = GameState::new();
        let board = g.board_array();
        assert_eq!(board[0][0], "bR");
        assert_eq!(board[7][4], "wK");
        assert_eq!(board[3][0], "");
    }
}
