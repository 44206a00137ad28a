use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Row of this side's back rank (row 0 is rank 8).
    #[inline]
    pub const fn home_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Row on which this side's pawns start.
    #[inline]
    pub const fn pawn_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row on which this side's pawns promote.
    #[inline]
    pub const fn promotion_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Row delta of a forward pawn step.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Parse "white" / "black" / "w" / "b" (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Some(Color::White),
            "black" | "b" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType / Piece
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Uppercase notation letter (`P` for pawns, which SAN omits).
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = self.letter();
        match color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    /// Parse a FEN piece character; case selects the color.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some((color, piece))
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "Pawn"),
            PieceType::Knight => write!(f, "Knight"),
            PieceType::Bishop => write!(f, "Bishop"),
            PieceType::Rook => write!(f, "Rook"),
            PieceType::Queen => write!(f, "Queen"),
            PieceType::King => write!(f, "King"),
        }
    }
}

/// A piece on the board. Promotion produces a new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceType,
    pub color: Color,
}

impl Piece {
    #[inline]
    pub const fn new(kind: PieceType, color: Color) -> Self {
        Piece { kind, color }
    }

    /// FEN character for this piece.
    pub fn to_char(self) -> char {
        self.kind.to_char(self.color)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board coordinate. Row 0 is rank 8 (Black's back rank), column 0 is
/// the a-file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const NUM: usize = 64;

    /// Checked constructor.
    #[inline]
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < 8 && col < 8).then_some(Square { row, col })
    }

    /// Unchecked constructor for known-good coordinates.
    #[inline]
    pub const fn at(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Square { row, col }
    }

    /// All 64 squares in row-major order (a8, b8, … h1).
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }

    /// Shift by a row/column delta, `None` if it leaves the board.
    #[inline]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Square> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square::at(row as u8, col as u8))
        } else {
            None
        }
    }

    /// File letter, `a`..`h`.
    #[inline]
    pub fn file_char(self) -> char {
        (b'a' + self.col) as char
    }

    /// Rank digit, `1`..`8`.
    #[inline]
    pub fn rank_char(self) -> char {
        (b'8' - self.row) as char
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if col < 8 && rank < 8 {
            Some(Square::at(7 - rank, col))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

// ---------------------------------------------------------------------------
// CandidateMove
// ---------------------------------------------------------------------------

/// Which rook a castling move uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column the king lands on.
    #[inline]
    pub const fn king_to_col(self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    /// Column of the rook before castling.
    #[inline]
    pub const fn rook_from_col(self) -> u8 {
        match self {
            CastleSide::King => 7,
            CastleSide::Queen => 0,
        }
    }

    /// Column of the rook after castling (next to the king, inner side).
    #[inline]
    pub const fn rook_to_col(self) -> u8 {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }

    /// Notation literal.
    pub const fn token(self) -> &'static str {
        match self {
            CastleSide::King => "O-O",
            CastleSide::Queen => "O-O-O",
        }
    }
}

/// A move approved by the legality engine, consumed once by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CandidateMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
    pub castle: Option<CastleSide>,
}

impl CandidateMove {
    pub fn new(from: Square, to: Square) -> Self {
        CandidateMove {
            from,
            to,
            promotion: None,
            castle: None,
        }
    }
}

impl fmt::Display for CandidateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "={}", promo.letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Explicit move-history flags for castling: a king or rook that has ever
/// left its home square loses the right for good, even if it returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    king_moved: [bool; 2],
    /// `rook_moved[color][side]`.
    rook_moved: [[bool; 2]; 2],
}

impl CastlingRights {
    /// Fresh rights: nothing has moved.
    pub const ALL: CastlingRights = CastlingRights {
        king_moved: [false; 2],
        rook_moved: [[false; 2]; 2],
    };

    /// No castling available for either side.
    pub const NONE: CastlingRights = CastlingRights {
        king_moved: [true; 2],
        rook_moved: [[true; 2]; 2],
    };

    #[inline]
    pub fn may_castle(self, color: Color, side: CastleSide) -> bool {
        !self.king_moved[color.index()] && !self.rook_moved[color.index()][side.index()]
    }

    pub fn mark_king_moved(&mut self, color: Color) {
        self.king_moved[color.index()] = true;
    }

    pub fn mark_rook_moved(&mut self, color: Color, side: CastleSide) {
        self.rook_moved[color.index()][side.index()] = true;
    }

    /// Record that something left or landed on `sq`: the king or rook that
    /// started there can no longer castle.
    pub fn touch(&mut self, sq: Square) {
        for color in [Color::White, Color::Black] {
            if sq.row != color.home_row() {
                continue;
            }
            if sq.col == 4 {
                self.mark_king_moved(color);
            }
            for side in CastleSide::BOTH {
                if sq.col == side.rook_from_col() {
                    self.mark_rook_moved(color, side);
                }
            }
        }
    }

    /// Parse the FEN castling field (e.g. "KQkq", "-", "Kq").
    pub fn from_fen(s: &str) -> Option<Self> {
        let mut rights = CastlingRights::NONE;
        if s == "-" {
            return Some(rights);
        }
        for c in s.chars() {
            let (color, side) = match c {
                'K' => (Color::White, CastleSide::King),
                'Q' => (Color::White, CastleSide::Queen),
                'k' => (Color::Black, CastleSide::King),
                'q' => (Color::Black, CastleSide::Queen),
                _ => return None,
            };
            rights.king_moved[color.index()] = false;
            rights.rook_moved[color.index()][side.index()] = false;
        }
        Some(rights)
    }

    /// Convert to the FEN castling field.
    pub fn to_fen(self) -> String {
        let mut s = String::with_capacity(4);
        for (color, side, c) in [
            (Color::White, CastleSide::King, 'K'),
            (Color::White, CastleSide::Queen, 'Q'),
            (Color::Black, CastleSide::King, 'k'),
            (Color::Black, CastleSide::Queen, 'q'),
        ] {
            if self.may_castle(color, side) {
                s.push(c);
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Current status of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    /// The given side is to move and in check.
    Check(Color),
    Checkmate {
        winner: Color,
    },
    Stalemate,
    Draw(DrawReason),
    /// The external opponent never produced a legal move.
    Forfeit {
        winner: Color,
    },
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Check(_) => "check",
            GameStatus::Checkmate { .. } => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw(reason) => reason.as_str(),
            GameStatus::Forfeit { .. } => "forfeit",
        }
    }

    /// Human-readable outcome line for the presentation layer.
    pub fn outcome_text(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "In progress",
            GameStatus::Check(_) => "Check",
            GameStatus::Checkmate { .. } => "Checkmate",
            GameStatus::Stalemate => "Stalemate",
            GameStatus::Draw(_) => "Draw",
            GameStatus::Forfeit { .. } => "Forfeit",
        }
    }

    pub fn is_game_over(&self) -> bool {
        !matches!(self, GameStatus::InProgress | GameStatus::Check(_))
    }

    pub fn is_check(&self) -> bool {
        matches!(self, GameStatus::Check(_))
    }

    pub fn winner(&self) -> Option<Color> {
        match *self {
            GameStatus::Checkmate { winner } | GameStatus::Forfeit { winner } => Some(winner),
            _ => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason for a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl DrawReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::ThreefoldRepetition => "threefold_repetition",
            DrawReason::InsufficientMaterial => "insufficient_material",
        }
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("illegal move: {from} -> {to}: {reason}")]
    IllegalMove {
        from: String,
        to: String,
        reason: String,
    },

    #[error("no legal move matches '{0}'")]
    UnrecognizedMove(String),

    #[error("board invariant violated: no {0} king on the board")]
    MissingKing(Color),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("game is already over: {0}")]
    GameOver(String),
}

impl ChessError {
    pub fn illegal(from: Square, to: Square, reason: &str) -> Self {
        ChessError::IllegalMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            reason: reason.to_string(),
        }
    }

    /// Only a broken board is fatal to a session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChessError::MissingKing(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn color_toggle() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
    }

    #[test]
    fn color_rows() {
        assert_eq!(Color::White.home_row(), 7);
        assert_eq!(Color::Black.home_row(), 0);
        assert_eq!(Color::White.pawn_row(), 6);
        assert_eq!(Color::Black.promotion_row(), 7);
        assert_eq!(Color::White.forward(), -1);
    }

    #[test]
    fn color_from_str() {
        assert_eq!(Color::from_str_loose("Black"), Some(Color::Black));
        assert_eq!(Color::from_str_loose("w"), Some(Color::White));
        assert_eq!(Color::from_str_loose("red"), None);
    }

    #[test]
    fn piece_type_char_round_trip() {
        for pt in PieceType::ALL {
            let wc = pt.to_char(Color::White);
            let bc = pt.to_char(Color::Black);
            assert!(wc.is_ascii_uppercase());
            assert!(bc.is_ascii_lowercase());
            assert_eq!(PieceType::from_char(wc), Some((Color::White, pt)));
            assert_eq!(PieceType::from_char(bc), Some((Color::Black, pt)));
        }
        assert_eq!(PieceType::from_char('x'), None);
    }

    #[test]
    fn square_orientation() {
        assert_eq!(sq("a8"), Square::at(0, 0));
        assert_eq!(sq("h1"), Square::at(7, 7));
        assert_eq!(sq("e1"), Square::at(7, 4));
        assert_eq!(sq("e4"), Square::at(4, 4));
        assert_eq!(Square::at(6, 4).to_algebraic(), "e2");
    }

    #[test]
    fn square_algebraic_round_trip() {
        for s in Square::all() {
            assert_eq!(Square::from_algebraic(&s.to_algebraic()), Some(s));
        }
        assert_eq!(Square::all().count(), Square::NUM);
    }

    #[test]
    fn square_from_algebraic_invalid() {
        assert_eq!(Square::from_algebraic(""), None);
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("abc"), None);
        assert_eq!(Square::new(8, 0), None);
    }

    #[test]
    fn square_offset_stays_on_board() {
        assert_eq!(sq("a1").offset(1, 0), None);
        assert_eq!(sq("a1").offset(-1, 1), Some(sq("b2")));
        assert_eq!(sq("h8").offset(0, 1), None);
    }

    #[test]
    fn castling_rights_fen_round_trip() {
        for s in ["-", "K", "Kq", "KQkq", "kq", "Q"] {
            let cr = CastlingRights::from_fen(s).unwrap();
            assert_eq!(cr.to_fen(), s);
        }
        assert_eq!(CastlingRights::from_fen("KZ"), None);
    }

    #[test]
    fn castling_rights_touch() {
        let mut cr = CastlingRights::ALL;
        cr.touch(sq("h1"));
        assert!(!cr.may_castle(Color::White, CastleSide::King));
        assert!(cr.may_castle(Color::White, CastleSide::Queen));

        cr.touch(sq("e8"));
        assert!(!cr.may_castle(Color::Black, CastleSide::Queen));
        assert_eq!(cr.to_fen(), "Q");

        // A square off the back rank changes nothing.
        let mut fresh = CastlingRights::ALL;
        fresh.touch(sq("e4"));
        assert_eq!(fresh, CastlingRights::ALL);
    }

    #[test]
    fn game_status_strings() {
        assert_eq!(GameStatus::InProgress.as_str(), "in_progress");
        assert_eq!(GameStatus::Check(Color::Black).as_str(), "check");
        assert_eq!(
            GameStatus::Checkmate {
                winner: Color::White
            }
            .outcome_text(),
            "Checkmate"
        );
        assert_eq!(GameStatus::Stalemate.outcome_text(), "Stalemate");
        assert_eq!(
            GameStatus::Draw(DrawReason::InsufficientMaterial).outcome_text(),
            "Draw"
        );
    }

    #[test]
    fn game_status_is_game_over() {
        assert!(!GameStatus::InProgress.is_game_over());
        assert!(!GameStatus::Check(Color::White).is_game_over());
        assert!(GameStatus::Stalemate.is_game_over());
        assert!(
            GameStatus::Forfeit {
                winner: Color::White
            }
            .is_game_over()
        );
        assert_eq!(
            GameStatus::Checkmate {
                winner: Color::Black
            }
            .winner(),
            Some(Color::Black)
        );
    }

    #[test]
    fn candidate_display() {
        let mut mv = CandidateMove::new(sq("e7"), sq("e8"));
        mv.promotion = Some(PieceType::Queen);
        assert_eq!(mv.to_string(), "e7e8=Q");
    }

    #[test]
    fn only_missing_king_is_fatal() {
        assert!(ChessError::MissingKing(Color::White).is_fatal());
        assert!(!ChessError::UnrecognizedMove("Nf9".into()).is_fatal());
        assert!(!ChessError::illegal(sq("e2"), sq("e5"), "geometry").is_fatal());
    }
}
