//! Move tokens exchanged with suggesters and peers.
//!
//! The encoding is a reduced SAN: `e4`, `Nf3`, `xd5`, `Bxe5`, `a8=Q`,
//! `O-O`. Pawns carry no letter and nothing is disambiguated. `+` and `#`
//! are appended by the game once the resulting status is known.
//!
//! Decoding is forgiving because tokens come from outside: it also
//! understands the full-SAN spellings (`exd5`, `Nbd2`, `R1a4`, `Qh4e1`)
//! and coordinate moves (`e2e4`, `e2-e4`). A token that matches nothing
//! yields `None`.

use crate::engine::board::{Board, Position};
use crate::engine::legality;
use crate::engine::types::{CandidateMove, CastleSide, Color, PieceType, Square};

// =========================================================================
// Encoding
// =========================================================================

/// Encode a legal move against the board it is played on.
///
/// An empty source square is encoded as a pawn move.
pub fn encode(board: &Board, mv: &CandidateMove) -> String {
    if let Some(side) = mv.castle {
        return side.token().to_string();
    }

    let kind = board.piece_at(mv.from).map_or(PieceType::Pawn, |p| p.kind);
    let mut token = String::with_capacity(6);
    if kind != PieceType::Pawn {
        token.push(kind.letter());
    }
    if !board.is_empty(mv.to) {
        token.push('x');
    }
    token.push_str(&mv.to.to_algebraic());
    if let Some(promo) = mv.promotion {
        token.push('=');
        token.push(promo.letter());
    }
    token
}

// =========================================================================
// Decoding
// =========================================================================

/// Find the legal move of `color` that `token` names.
///
/// Tries an exact-case match over every candidate first, then a
/// case-insensitive one; within a pass the first legal move in scan order
/// wins.
pub fn decode(pos: &Position, token: &str, color: Color) -> Option<CandidateMove> {
    let pos = if pos.side_to_move == color {
        *pos
    } else {
        pos.with_side_to_move(color)
    };

    let token = clean(token);
    if token.is_empty() {
        return None;
    }

    if let Some(side) = castle_literal(token) {
        let home = color.home_row();
        return legality::classify(
            &pos,
            Square::at(home, 4),
            Square::at(home, side.king_to_col()),
        )
        .filter(|mv| mv.castle == Some(side));
    }

    let candidates: Vec<(CandidateMove, Vec<String>)> = legality::legal_moves(&pos)
        .into_iter()
        .map(|mv| (mv, spellings(&pos.board, &mv)))
        .collect();

    candidates
        .iter()
        .find(|(_, names)| names.iter().any(|n| n == token))
        .or_else(|| {
            candidates
                .iter()
                .find(|(_, names)| names.iter().any(|n| n.eq_ignore_ascii_case(token)))
        })
        .map(|(mv, _)| *mv)
}

/// Strip whitespace and trailing check, mate and annotation marks.
fn clean(token: &str) -> &str {
    token.trim().trim_end_matches(['+', '#', '!', '?']).trim_end()
}

fn castle_literal(token: &str) -> Option<CastleSide> {
    match token.to_ascii_uppercase().as_str() {
        "O-O" | "0-0" => Some(CastleSide::King),
        "O-O-O" | "0-0-0" => Some(CastleSide::Queen),
        _ => None,
    }
}

/// Every spelling a move answers to. The canonical encoding comes first.
fn spellings(board: &Board, mv: &CandidateMove) -> Vec<String> {
    let mut names = vec![encode(board, mv)];
    if mv.castle.is_some() {
        return names;
    }

    let kind = board.piece_at(mv.from).map_or(PieceType::Pawn, |p| p.kind);
    let capture = !board.is_empty(mv.to);
    let dest = mv.to.to_algebraic();
    let file = mv.from.file_char().to_string();
    let rank = mv.from.rank_char().to_string();

    let prefixes: Vec<String> = if kind == PieceType::Pawn {
        if capture { vec![file] } else { vec![String::new()] }
    } else {
        let letter = kind.letter();
        vec![
            letter.to_string(),
            format!("{letter}{file}"),
            format!("{letter}{rank}"),
            format!("{letter}{file}{rank}"),
        ]
    };

    let captures: &[&str] = if capture { &["x", ""] } else { &[""] };
    let promos: &[&str] = if mv.promotion.is_some() {
        &["=Q", "Q"]
    } else {
        &[""]
    };

    for prefix in &prefixes {
        for x in captures {
            for promo in promos {
                names.push(format!("{prefix}{x}{dest}{promo}"));
            }
        }
    }

    // Coordinate forms.
    let from = mv.from.to_algebraic();
    for sep in ["", "-"] {
        for promo in promos {
            names.push(format!("{from}{sep}{dest}{promo}"));
        }
    }

    names
}

// =========================================================================
// Tests
// =========================================================================
