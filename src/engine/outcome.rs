//! Game-termination detection.
//!
//! `evaluate` answers the rules-of-chess question for one side: can it move,
//! and if not, is it mated or stalemated. Draws that depend on history
//! (fifty moves, repetition) are layered on by `GameState`; the material
//! test lives here because it only needs the board.

use crate::engine::attacks;
use crate::engine::board::{Board, Position};
use crate::engine::legality;
use crate::engine::types::{ChessError, Color, GameStatus, PieceType};

/// Status of the position from the point of view of `color` being to move.
///
/// Fails only when `color` has no king on the board.
pub fn evaluate(pos: &Position, color: Color) -> Result<GameStatus, ChessError> {
    let pos = if pos.side_to_move == color {
        *pos
    } else {
        pos.with_side_to_move(color)
    };

    let in_check = attacks::is_king_in_check(&pos.board, color)?;

    if legality::has_legal_move(&pos) {
        return Ok(if in_check {
            GameStatus::Check(color)
        } else {
            GameStatus::InProgress
        });
    }

    Ok(if in_check {
        GameStatus::Checkmate { winner: !color }
    } else {
        GameStatus::Stalemate
    })
}

/// Neither side can possibly mate: K v K, K+minor v K, or K+B v K+B with
/// both bishops on the same square colour.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut minors = [0usize; 2];
    let mut bishops: [Vec<u8>; 2] = [Vec::new(), Vec::new()];

    for color in [Color::White, Color::Black] {
        for (sq, piece) in board.pieces(color) {
            match piece.kind {
                PieceType::King => {}
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
                PieceType::Knight => minors[color.index()] += 1,
                PieceType::Bishop => {
                    minors[color.index()] += 1;
                    bishops[color.index()].push((sq.row + sq.col) & 1);
                }
            }
        }
    }

    match (minors[0], minors[1]) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (1, 1) => {
            let (w, b) = (&bishops[0], &bishops[1]);
            w.len() == 1 && b.len() == 1 && w[0] == b[0]
        }
        _ => false,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn starting_position_in_progress() {
        let p = Position::starting();
        assert_eq!(evaluate(&p, Color::White), Ok(GameStatus::InProgress));
        assert_eq!(evaluate(&p, Color::Black), Ok(GameStatus::InProgress));
    }

    #[test]
    fn check_with_escape() {
        let p = pos("4k3/8/8/8/8/8/8/4RK2 b - -");
        assert_eq!(evaluate(&p, Color::Black), Ok(GameStatus::Check(Color::Black)));
    }

    #[test]
    fn back_rank_mate() {
        let p = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - -");
        assert_eq!(
            evaluate(&p, Color::Black),
            Ok(GameStatus::Checkmate {
                winner: Color::White
            })
        );
    }

    #[test]
    fn lone_king_stalemate_is_not_mate() {
        let p = pos("k7/2K5/1Q6/8/8/8/8/8 b - -");
        assert_eq!(evaluate(&p, Color::Black), Ok(GameStatus::Stalemate));
    }

    #[test]
    fn evaluates_for_the_requested_colour() {
        // White to move on paper, but ask about Black.
        let p = pos("k7/2K5/1Q6/8/8/8/8/8 w - -");
        assert_eq!(evaluate(&p, Color::Black), Ok(GameStatus::Stalemate));
        assert_eq!(evaluate(&p, Color::White), Ok(GameStatus::InProgress));
    }

    #[test]
    fn missing_king_surfaces_as_error() {
        let p = Position {
            board: Board::empty(),
            ..Position::starting()
        };
        assert_eq!(
            evaluate(&p, Color::White),
            Err(ChessError::MissingKing(Color::White))
        );
    }

    #[test]
    fn insufficient_material_cases() {
        let b = |fen: &str| pos(fen).board;
        assert!(is_insufficient_material(&b("4k3/8/8/8/8/8/8/4K3 w - -")));
        assert!(is_insufficient_material(&b("4k3/8/8/8/8/8/8/4KB2 w - -")));
        assert!(is_insufficient_material(&b("4k3/8/8/8/8/8/8/4KN2 w - -")));
        // c1 and f8 are both dark.
        assert!(is_insufficient_material(&b("4kb2/8/8/8/8/8/8/2B1K3 w - -")));
        // c1 dark, c8 light.
        assert!(!is_insufficient_material(&b("2b1k3/8/8/8/8/8/8/2B1K3 w - -")));
        assert!(!is_insufficient_material(&b("4k3/8/8/8/8/8/4P3/4K3 w - -")));
        assert!(!is_insufficient_material(&b("4k3/8/8/8/8/8/8/3NKN2 w - -")));
        assert!(!is_insufficient_material(&Board::starting()));
    }
}
