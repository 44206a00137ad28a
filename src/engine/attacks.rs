//! Attack detection by brute-force geometry.
//!
//! Everything here is pure piece geometry over a [`Board`]: no turn, no
//! castling, and no king-safety filtering. The legality engine builds king
//! safety on top of these functions, so they must never call back into it.

use crate::engine::board::Board;
use crate::engine::types::{ChessError, Color, Piece, PieceType, Square};

// =========================================================================
// Public API
// =========================================================================

/// Is `target` attacked by any piece of colour `by`?
pub fn is_attacked(board: &Board, target: Square, by: Color) -> bool {
    board
        .pieces(by)
        .any(|(from, piece)| attacks_square(board, from, piece, target))
}

/// Is the king of `color` attacked by the opponent?
pub fn is_king_in_check(board: &Board, color: Color) -> Result<bool, ChessError> {
    let king = board.king_square(color)?;
    Ok(is_attacked(board, king, !color))
}

/// Would `piece` standing on `from` attack `target`? Pawns attack only
/// diagonally forward; sliders need every square strictly between the two
/// squares to be empty, whichever colour occupies them.
pub fn attacks_square(board: &Board, from: Square, piece: Piece, target: Square) -> bool {
    if from == target {
        return false;
    }
    let (dr, dc) = delta(from, target);
    match piece.kind {
        PieceType::Pawn => dr == piece.color.forward() && dc.abs() == 1,
        PieceType::Knight => is_knight_jump(dr, dc),
        PieceType::King => dr.abs() <= 1 && dc.abs() <= 1,
        PieceType::Bishop => dr.abs() == dc.abs() && path_clear(board, from, target),
        PieceType::Rook => (dr == 0 || dc == 0) && path_clear(board, from, target),
        PieceType::Queen => is_line(dr, dc) && path_clear(board, from, target),
    }
}

// =========================================================================
// Geometry helpers (shared with the legality engine)
// =========================================================================

/// Row and column distance from `from` to `to`.
#[inline]
pub fn delta(from: Square, to: Square) -> (i8, i8) {
    (
        to.row as i8 - from.row as i8,
        to.col as i8 - from.col as i8,
    )
}

#[inline]
pub fn is_knight_jump(dr: i8, dc: i8) -> bool {
    matches!((dr.abs(), dc.abs()), (1, 2) | (2, 1))
}

/// Straight or diagonal line of any length.
#[inline]
pub fn is_line(dr: i8, dc: i8) -> bool {
    dr == 0 || dc == 0 || dr.abs() == dc.abs()
}

/// True when every square strictly between `from` and `to` is empty.
/// The two squares must lie on a common line.
pub fn path_clear(board: &Board, from: Square, to: Square) -> bool {
    let (dr, dc) = delta(from, to);
    debug_assert!(is_line(dr, dc), "path_clear on non-line {from}->{to}");
    let step = (dr.signum(), dc.signum());
    let mut cur = from;
    loop {
        cur = match cur.offset(step.0, step.1) {
            Some(next) => next,
            None => return false,
        };
        if cur == to {
            return true;
        }
        if !board.is_empty(cur) {
            return false;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::Position;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Position::from_fen(fen).unwrap().board
    }

    #[test]
    fn starting_position_third_ranks_covered() {
        let b = Board::starting();
        for col in 0..8 {
            assert!(is_attacked(&b, Square::at(5, col), Color::White));
            assert!(is_attacked(&b, Square::at(2, col), Color::Black));
        }
        assert!(!is_attacked(&b, sq("e4"), Color::White));
        assert!(!is_attacked(&b, sq("e5"), Color::Black));
    }

    #[test]
    fn pawn_attacks_diagonally_forward_only() {
        let b = board("4k3/8/8/8/4P3/8/8/4K3 w - -");
        assert!(is_attacked(&b, sq("d5"), Color::White));
        assert!(is_attacked(&b, sq("f5"), Color::White));
        assert!(!is_attacked(&b, sq("e5"), Color::White));
        assert!(!is_attacked(&b, sq("d3"), Color::White));

        let b = board("4k3/8/8/4p3/8/8/8/4K3 b - -");
        assert!(is_attacked(&b, sq("d4"), Color::Black));
        assert!(!is_attacked(&b, sq("d6"), Color::Black));
    }

    #[test]
    fn knight_jumps_over_pieces() {
        let b = Board::starting();
        assert!(is_attacked(&b, sq("f3"), Color::White));
        let knight = Piece::new(PieceType::Knight, Color::White);
        assert!(attacks_square(&b, sq("g1"), knight, sq("h3")));
        assert!(!attacks_square(&b, sq("g1"), knight, sq("g3")));
    }

    #[test]
    fn sliders_are_blocked_by_either_colour() {
        // Rook a1, own pawn a3, enemy pawn d1.
        let b = board("4k3/8/8/8/8/P7/8/R2p2K1 w - -");
        let rook = Piece::new(PieceType::Rook, Color::White);
        assert!(attacks_square(&b, sq("a1"), rook, sq("a2")));
        assert!(attacks_square(&b, sq("a1"), rook, sq("a3")));
        assert!(!attacks_square(&b, sq("a1"), rook, sq("a4")));
        assert!(attacks_square(&b, sq("a1"), rook, sq("d1")));
        assert!(!attacks_square(&b, sq("a1"), rook, sq("e1")));
    }

    #[test]
    fn bishop_and_queen_lines() {
        let b = board("4k3/8/8/8/8/8/8/2B1KQ2 w - -");
        assert!(is_attacked(&b, sq("h6"), Color::White));
        assert!(is_attacked(&b, sq("f8"), Color::White));
        let bishop = Piece::new(PieceType::Bishop, Color::White);
        assert!(!attacks_square(&b, sq("c1"), bishop, sq("c2")));
    }

    #[test]
    fn king_in_check_detection() {
        let b = board("4k3/8/8/8/8/8/8/4KR2 b - -");
        assert_eq!(is_king_in_check(&b, Color::Black), Ok(false));
        let b = board("4k3/8/8/8/8/8/8/4RK2 b - -");
        assert_eq!(is_king_in_check(&b, Color::Black), Ok(true));
    }

    #[test]
    fn missing_king_is_an_invariant_error() {
        assert_eq!(
            is_king_in_check(&Board::empty(), Color::Black),
            Err(ChessError::MissingKing(Color::Black))
        );
    }

    #[test]
    fn path_clear_adjacent_is_trivially_clear() {
        let b = Board::starting();
        assert!(path_clear(&b, sq("e1"), sq("e2")));
        assert!(!path_clear(&b, sq("a1"), sq("a3")));
    }
}
