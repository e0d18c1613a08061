pub mod attacks;
pub mod board;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod perft;
pub mod types;

pub use board::{Board, Position};
pub use game::{Game, MoveRecord, apply_move, status};
pub use movegen::{capture_moves, has_legal_move, legal_moves, legal_moves_from, quiet_moves};
pub use perft::{PerftResult, divide_total, perft, perft_divide};
pub use types::*;
