//! Legal move generation.
//!
//! Pipeline for a single `(from, to)` pair, short-circuiting on the first
//! failure:
//!   1. Ownership: a piece of the side to move on `from`, a real move, and
//!      a destination that is neither friendly nor a king.
//!   2. Piece geometry.
//!   3. Path clearance for sliders and the pawn double step.
//!   4. Castling preconditions for a two-square king move.
//!   5. King safety: simulate on a scratch board, reject if the mover's king
//!      ends up attacked.
//!
//! Destination sets are found by brute force over all 64 squares. At this
//! board size that is cheap enough to run for every evaluation.

use crate::engine::attacks::{self, delta, is_knight_jump, is_line, path_clear};
use crate::engine::board::{Board, Position};
use crate::engine::types::{CandidateMove, CastleSide, Color, Piece, PieceType, Square};

// =========================================================================
// Public API
// =========================================================================

/// Is moving the piece on `from` to `to` legal for the side to move?
pub fn is_legal(pos: &Position, from: Square, to: Square) -> bool {
    classify(pos, from, to).is_some()
}

/// Validate `from -> to` and, if legal, return it annotated with its
/// promotion and castling side.
pub fn classify(pos: &Position, from: Square, to: Square) -> Option<CandidateMove> {
    let us = pos.side_to_move;
    let piece = pos.board.piece_at(from).filter(|p| p.color == us)?;
    if from == to {
        return None;
    }
    if let Some(target) = pos.board.piece_at(to) {
        // Kings are never captured: a position where that would be possible
        // is already broken.
        if target.color == us || target.kind == PieceType::King {
            return None;
        }
    }

    let castle = match piece.kind {
        PieceType::King => castle_side(from, to, us),
        _ => None,
    };

    match castle {
        Some(side) => {
            if !castling_allowed(pos, side) {
                return None;
            }
        }
        None => {
            if !geometry_allows(&pos.board, from, to, piece) {
                return None;
            }
        }
    }

    if leaves_king_attacked(pos, from, to, castle) {
        return None;
    }

    let promotion = (piece.kind == PieceType::Pawn && to.row == us.promotion_row())
        .then_some(PieceType::Queen);

    Some(CandidateMove {
        from,
        to,
        promotion,
        castle,
    })
}

/// Destinations reachable from `sq` by a legal move of the side to move.
pub fn legal_moves_from(pos: &Position, sq: Square) -> Vec<Square> {
    if pos
        .board
        .piece_at(sq)
        .is_none_or(|p| p.color != pos.side_to_move)
    {
        return Vec::new();
    }
    Square::all()
        .filter(|&to| is_legal(pos, sq, to))
        .collect()
}

/// Every legal move for the side to move, in row-major scan order of the
/// source square and then the destination.
pub fn legal_moves(pos: &Position) -> Vec<CandidateMove> {
    let us = pos.side_to_move;
    pos.board
        .pieces(us)
        .flat_map(|(from, _)| Square::all().filter_map(move |to| classify(pos, from, to)))
        .collect()
}

/// Does the side to move have at least one legal move?
pub fn has_legal_move(pos: &Position) -> bool {
    let us = pos.side_to_move;
    pos.board
        .pieces(us)
        .any(|(from, _)| Square::all().any(|to| is_legal(pos, from, to)))
}

// =========================================================================
// Geometry
// =========================================================================

/// Movement rules for a non-castling move, including path clearance.
/// The destination is known not to hold a friendly piece.
fn geometry_allows(board: &Board, from: Square, to: Square, piece: Piece) -> bool {
    let (dr, dc) = delta(from, to);
    match piece.kind {
        PieceType::King => dr.abs() <= 1 && dc.abs() <= 1,
        PieceType::Knight => is_knight_jump(dr, dc),
        PieceType::Bishop => dr.abs() == dc.abs() && path_clear(board, from, to),
        PieceType::Rook => (dr == 0 || dc == 0) && path_clear(board, from, to),
        PieceType::Queen => is_line(dr, dc) && path_clear(board, from, to),
        PieceType::Pawn => pawn_allows(board, from, to, piece.color, dr, dc),
    }
}

fn pawn_allows(board: &Board, from: Square, to: Square, color: Color, dr: i8, dc: i8) -> bool {
    let fwd = color.forward();
    let target = board.piece_at(to);

    if dc == 0 {
        // Pushes never capture.
        if target.is_some() {
            return false;
        }
        if dr == fwd {
            return true;
        }
        return dr == 2 * fwd && from.row == color.pawn_row() && path_clear(board, from, to);
    }

    // Diagonal step onto an enemy piece; no en passant.
    dr == fwd && dc.abs() == 1 && target.is_some_and(|p| p.color != color)
}

// =========================================================================
// Castling
// =========================================================================

/// Recognise a two-square horizontal king move from its home square.
fn castle_side(from: Square, to: Square, color: Color) -> Option<CastleSide> {
    let home = color.home_row();
    if from != Square::at(home, 4) || to.row != home {
        return None;
    }
    CastleSide::BOTH
        .into_iter()
        .find(|side| to.col == side.king_to_col())
}

fn castling_allowed(pos: &Position, side: CastleSide) -> bool {
    let us = pos.side_to_move;
    let them = !us;
    let home = us.home_row();
    let board = &pos.board;

    if !pos.castling.may_castle(us, side) {
        return false;
    }

    let rook_sq = Square::at(home, side.rook_from_col());
    if board.piece_at(rook_sq) != Some(Piece::new(PieceType::Rook, us)) {
        return false;
    }

    // Everything between king and rook must be empty.
    let king_sq = Square::at(home, 4);
    if !path_clear(board, king_sq, rook_sq) {
        return false;
    }

    // Not out of, through, or into check.
    let pass = Square::at(home, side.rook_to_col());
    let dest = Square::at(home, side.king_to_col());
    !attacks::is_attacked(board, king_sq, them)
        && !attacks::is_attacked(board, pass, them)
        && !attacks::is_attacked(board, dest, them)
}

// =========================================================================
// King safety
// =========================================================================

fn leaves_king_attacked(
    pos: &Position,
    from: Square,
    to: Square,
    castle: Option<CastleSide>,
) -> bool {
    let us = pos.side_to_move;
    let mut scratch = pos.board.with_move(from, to);
    if let Some(side) = castle {
        let home = us.home_row();
        scratch.apply_raw(
            Square::at(home, side.rook_from_col()),
            Square::at(home, side.rook_to_col()),
        );
    }
    // A board without our king cannot be judged safe.
    !matches!(attacks::is_king_in_check(&scratch, us), Ok(false))
}

// =========================================================================
// Tests
// =========================================================================
