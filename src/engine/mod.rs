pub mod attacks;
pub mod board;
pub mod executor;
pub mod game;
pub mod legality;
pub mod notation;
pub mod outcome;
pub mod types;

pub use board::{Board, Position};
pub use game::{GameState, MoveRecord};
pub use legality::{is_legal, legal_moves, legal_moves_from};
pub use types::*;
