//! Applies validated moves.
//!
//! The executor trusts its input: the candidate must come from
//! [`legality::classify`](crate::engine::legality::classify). It performs
//! the castling rook hop, auto-promotion, castling-rights bookkeeping and
//! the turn flip, nothing else.

use crate::engine::board::Position;
use crate::engine::types::{CandidateMove, ChessError, Piece, PieceType, Square};

/// What happened when a move was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    /// The piece that moved, as it stood before the move.
    pub moved: Piece,
    /// Piece removed from the destination, if any.
    pub captured: Option<Piece>,
    /// Piece that now stands on the destination after promotion.
    pub promoted: Option<Piece>,
}

impl Applied {
    /// Captures and pawn moves reset the fifty-move clock.
    pub fn is_irreversible(&self) -> bool {
        self.captured.is_some() || self.moved.kind == PieceType::Pawn
    }
}

/// Apply `mv` to `pos` in place.
pub fn apply(pos: &mut Position, mv: CandidateMove) -> Result<Applied, ChessError> {
    let moved = pos
        .board
        .piece_at(mv.from)
        .ok_or_else(|| ChessError::illegal(mv.from, mv.to, "no piece on source square"))?;
    if moved.color != pos.side_to_move {
        return Err(ChessError::illegal(mv.from, mv.to, "not the side to move"));
    }

    let captured = pos.board.apply_raw(mv.from, mv.to);

    if let Some(side) = mv.castle {
        let home = moved.color.home_row();
        pos.board.apply_raw(
            Square::at(home, side.rook_from_col()),
            Square::at(home, side.rook_to_col()),
        );
    }

    let promoted = mv.promotion.map(|kind| {
        let piece = Piece::new(kind, moved.color);
        pos.board.set(mv.to, Some(piece));
        piece
    });

    pos.castling.touch(mv.from);
    pos.castling.touch(mv.to);
    pos.side_to_move = !pos.side_to_move;

    Ok(Applied {
        moved,
        captured,
        promoted,
    })
}

// =========================================================================
// Tests
// =========================================================================
