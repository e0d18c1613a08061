use crate::engine::board::Position;
use crate::engine::types::{BoardSize, ChessError};

/// Perft runner configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerftConfig {
    /// Position text; the starting layout for `board_size` when unset.
    pub fen: Option<String>,
    /// Board edge length.
    pub board_size: BoardSize,
    /// Plies to enumerate.
    pub depth: u32,
    /// Report a per-root-move breakdown.
    pub divide: bool,
}

impl PerftConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; unparsable values fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = PerftConfig::default();
        PerftConfig {
            fen: lookup("CHESS_FEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            board_size: lookup("CHESS_BOARD_SIZE")
                .and_then(|v| v.trim().parse::<u8>().ok())
                .and_then(|n| BoardSize::new(n).ok())
                .unwrap_or(defaults.board_size),
            depth: lookup("PERFT_DEPTH")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.depth),
            divide: lookup("PERFT_DIVIDE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.divide),
        }
    }

    /// The position to count from.
    pub fn position(&self) -> Result<Position, ChessError> {
        match &self.fen {
            Some(fen) => Position::from_fen_sized(fen, self.board_size),
            None => Ok(Position::starting(self.board_size)),
        }
    }
}

impl Default for PerftConfig {
    fn default() -> Self {
        PerftConfig {
            fen: None,
            board_size: BoardSize::STANDARD,
            depth: 3,
            divide: false,
        }
    }
}
