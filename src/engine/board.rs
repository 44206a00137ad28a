//! Mailbox board representation.
//!
//! `Board` is a plain 8×8 grid of `Option<Piece>` with no rules knowledge.
//! `Position` adds the side to move and castling rights, which is everything
//! the legality engine needs to judge a move.

use std::fmt;

use crate::engine::types::{CastlingRights, ChessError, Color, Piece, PieceType, Square};

/// Placement field of the standard starting position.
pub const START_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// Full FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Exactly 64 entries, row 0 = rank 8.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        let mut board = Board::empty();
        let back = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for color in [Color::White, Color::Black] {
            for (col, &kind) in back.iter().enumerate() {
                let col = col as u8;
                board.set(Square::at(color.home_row(), col), Some(Piece::new(kind, color)));
                board.set(
                    Square::at(color.pawn_row(), col),
                    Some(Piece::new(PieceType::Pawn, color)),
                );
            }
        }
        board
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row as usize][sq.col as usize]
    }

    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row as usize][sq.col as usize] = piece;
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.piece_at(sq).is_none()
    }

    /// Rows of the grid, rank 8 first.
    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }

    /// Every occupied square holding a piece of `color`, row-major.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.piece_at(sq)
                .filter(|p| p.color == color)
                .map(|p| (sq, p))
        })
    }

    /// Location of the king of `color`.
    pub fn king_square(&self, color: Color) -> Result<Square, ChessError> {
        let king = Piece::new(PieceType::King, color);
        Square::all()
            .find(|&sq| self.piece_at(sq) == Some(king))
            .ok_or(ChessError::MissingKing(color))
    }

    /// Count of pieces matching `piece`.
    pub fn count(&self, piece: Piece) -> usize {
        Square::all()
            .filter(|&sq| self.piece_at(sq) == Some(piece))
            .count()
    }

    // -----------------------------------------------------------------------
    // Raw relocation
    // -----------------------------------------------------------------------

    /// Move whatever stands on `from` to `to`, emptying `from`. No rules are
    /// checked; whatever was on `to` is overwritten and returned.
    pub fn apply_raw(&mut self, from: Square, to: Square) -> Option<Piece> {
        let moving = self.piece_at(from);
        let captured = self.piece_at(to);
        self.set(to, moving);
        self.set(from, None);
        captured
    }

    /// Copying variant of [`Board::apply_raw`] for what-if simulation.
    pub fn with_move(&self, from: Square, to: Square) -> Board {
        let mut next = *self;
        next.apply_raw(from, to);
        next
    }

    // -----------------------------------------------------------------------
    // FEN placement
    // -----------------------------------------------------------------------

    /// Parse the placement field of a FEN string.
    pub fn from_placement(field: &str) -> Result<Self, ChessError> {
        let rows: Vec<&str> = field.split('/').collect();
        if rows.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                rows.len()
            )));
        }

        let mut board = Board::empty();
        for (row, text) in rows.iter().enumerate() {
            let mut col = 0u8;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(ChessError::InvalidFen(format!("bad empty count '{c}'")));
                    }
                    col += skip as u8;
                } else {
                    let (color, kind) = PieceType::from_char(c)
                        .ok_or_else(|| ChessError::InvalidFen(format!("bad piece '{c}'")))?;
                    if col >= 8 {
                        return Err(ChessError::InvalidFen(format!("rank '{text}' too long")));
                    }
                    board.set(Square::at(row as u8, col), Some(Piece::new(kind, color)));
                    col += 1;
                }
                if col > 8 {
                    return Err(ChessError::InvalidFen(format!("rank '{text}' too long")));
                }
            }
            if col != 8 {
                return Err(ChessError::InvalidFen(format!("rank '{text}' too short")));
            }
        }
        Ok(board)
    }

    /// Render the placement field of a FEN string (rank 8 first).
    pub fn to_placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for (row, cells) in self.squares.iter().enumerate() {
            let mut empty = 0;
            for cell in cells {
                match cell {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.to_char());
                    }
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }

    /// Text diagram with file and rank labels, drawn from `perspective`'s
    /// side of the board.
    pub fn diagram(&self, perspective: Color) -> String {
        let rows: Vec<u8> = match perspective {
            Color::White => (0..8).collect(),
            Color::Black => (0..8).rev().collect(),
        };
        let mut lines = vec!["  a b c d e f g h".to_string()];
        for row in rows {
            let mut line = format!("{} ", 8 - row);
            for col in 0..8 {
                match self.piece_at(Square::at(row, col)) {
                    Some(piece) => line.push(piece.to_char()),
                    None => line.push('.'),
                }
                line.push(' ');
            }
            lines.push(line.trim_end().to_string());
        }
        lines.push("  a b c d e f g h".to_string());
        lines.join("\n")
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board({})", self.to_placement())?;
        writeln!(f, "{}", self.diagram(Color::White))
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Board plus the turn and castling state the rules depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub board: Board,
    pub side_to_move: Color,
    pub castling: CastlingRights,
}

impl Position {
    /// Standard starting position, White to move.
    pub fn starting() -> Self {
        Position {
            board: Board::starting(),
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
        }
    }

    /// Same position with a different side to move.
    pub fn with_side_to_move(&self, color: Color) -> Self {
        Position {
            side_to_move: color,
            ..*self
        }
    }

    /// Parse the first three FEN fields (placement, side, castling). Any
    /// trailing fields are validated by the caller.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let mut fields = fen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| ChessError::InvalidFen("empty FEN".into()))?;
        let board = Board::from_placement(placement)?;

        let side_to_move = match fields.next() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => {
                return Err(ChessError::InvalidFen(format!("bad side to move '{other}'")));
            }
        };

        let castling = match fields.next() {
            None => CastlingRights::NONE,
            Some(s) => CastlingRights::from_fen(s)
                .ok_or_else(|| ChessError::InvalidFen(format!("bad castling field '{s}'")))?,
        };

        for color in [Color::White, Color::Black] {
            let kings = board.count(Piece::new(PieceType::King, color));
            if kings != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "expected exactly one {color} king, found {kings}"
                )));
            }
        }

        Ok(Position {
            board,
            side_to_move,
            castling,
        })
    }

    /// Placement, side and castling fields.
    pub fn to_fen_fields(&self) -> String {
        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!("{} {} {}", self.board.to_placement(), side, self.castling)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::starting()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
