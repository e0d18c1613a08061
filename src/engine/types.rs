use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
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

    /// Rank step a pawn of this colour advances by.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// FEN side-to-move letter.
    pub fn to_fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
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
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
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

    /// Promotion choices, in generation order.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Index for array lookups: Pawn=0 .. King=5.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase letter used by FEN and coordinate notation.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = self.letter();
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a piece character; the case selects the colour.
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

    /// Whether a pawn may promote to this type.
    #[inline]
    pub fn is_promotion_target(self) -> bool {
        Self::PROMOTIONS.contains(&self)
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A coloured piece standing on a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceType) -> Self {
        Piece { color, kind }
    }

    #[inline]
    pub fn is(self, color: Color, kind: PieceType) -> bool {
        self.color == color && self.kind == kind
    }

    /// FEN letter for this piece.
    pub fn to_char(self) -> char {
        self.kind.to_char(self.color)
    }
}

// ---------------------------------------------------------------------------
// BoardSize
// ---------------------------------------------------------------------------

/// Edge length of a square board, always within `MIN..=MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BoardSize(u8);

impl BoardSize {
    pub const MIN: u8 = 8;
    pub const MAX: u8 = 16;

    /// The standard 8×8 board.
    pub const STANDARD: BoardSize = BoardSize(8);

    pub fn new(size: u8) -> Result<Self, ChessError> {
        if (Self::MIN..=Self::MAX).contains(&size) {
            Ok(BoardSize(size))
        } else {
            Err(ChessError::InvalidBoardSize(size as usize))
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Number of squares on the board.
    #[inline]
    pub const fn area(self) -> usize {
        self.0 as usize * self.0 as usize
    }

    /// Highest rank/file index.
    #[inline]
    pub const fn last(self) -> u8 {
        self.0 - 1
    }

    /// Whether signed file/rank coordinates lie on the board.
    #[inline]
    pub fn contains(self, file: i8, rank: i8) -> bool {
        file >= 0 && rank >= 0 && (file as u8) < self.0 && (rank as u8) < self.0
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        BoardSize::STANDARD
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on a board of up to 16×16.
///
/// File in the low nibble, rank in the high nibble: a1 = 0x00, p1 = 0x0f,
/// a16 = 0xf0. The encoding does not depend on the board size, so the same
/// value names the same square on every board that contains it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(pub u8);

impl Square {
    /// Number of addressable squares (16×16).
    pub const NUM: usize = 256;

    #[inline]
    pub fn file(self) -> u8 {
        self.0 & 0x0f
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.0 >> 4
    }

    #[inline]
    pub fn from_file_rank(file: u8, rank: u8) -> Self {
        debug_assert!(file < 16 && rank < 16);
        Square((rank << 4) | file)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Step by a file/rank delta, returning `None` when leaving the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8, size: BoardSize) -> Option<Square> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if size.contains(file, rank) {
            Some(Square::from_file_rank(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Whether this square exists on a board of `size`.
    #[inline]
    pub fn is_on(self, size: BoardSize) -> bool {
        self.file() < size.get() && self.rank() < size.get()
    }

    /// Parse algebraic notation like "e4" or "p16", validated for `size`.
    pub fn from_algebraic(s: &str, size: BoardSize) -> Option<Self> {
        let mut chars = s.chars();
        let file_ch = chars.next()?;
        if !file_ch.is_ascii_lowercase() {
            return None;
        }
        let file = file_ch as u8 - b'a';
        let digits = chars.as_str();
        if digits.is_empty()
            || digits.len() > 2
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let rank: u8 = digits.parse().ok()?;
        if rank == 0 || file >= size.get() || rank > size.get() {
            return None;
        }
        Some(Square::from_file_rank(file, rank - 1))
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A move: from-square, to-square and an optional promotion type.
///
/// Special moves carry no flags; castling, en passant and captures are
/// recognised from the position the move is played in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceType) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parse coordinate notation such as `e2e4`, `e7e8q` or `j15j16n`.
    pub fn parse(text: &str, size: BoardSize) -> Result<Self, ChessError> {
        let invalid = || ChessError::InvalidMoveText(text.to_string());

        // The destination starts at the second file letter.
        let split = text
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_lowercase())
            .map(|(i, _)| i)
            .ok_or_else(invalid)?;
        let from = Square::from_algebraic(&text[..split], size).ok_or_else(invalid)?;

        let rest = &text[split..];
        let (to_text, promotion) = match rest.char_indices().last() {
            Some((i, c)) if i > 0 && c.is_ascii_alphabetic() => {
                let kind = PieceType::from_char(c)
                    .map(|(_, kind)| kind)
                    .filter(|kind| kind.is_promotion_target())
                    .ok_or_else(invalid)?;
                (&rest[..i], Some(kind))
            }
            _ => (rest, None),
        };
        let to = Square::from_algebraic(to_text, size).ok_or_else(invalid)?;

        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Castling availability bitfield: bits 0-3 = WK, WQ, BK, BQ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Flag for one colour and side.
    #[inline]
    pub const fn flag(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::King) => Self::WHITE_KINGSIDE,
            (Color::White, CastleSide::Queen) => Self::WHITE_QUEENSIDE,
            (Color::Black, CastleSide::King) => Self::BLACK_KINGSIDE,
            (Color::Black, CastleSide::Queen) => Self::BLACK_QUEENSIDE,
        }
    }

    #[inline]
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn remove(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    #[inline]
    pub fn allows(self, color: Color, side: CastleSide) -> bool {
        self.has(Self::flag(color, side))
    }

    /// Clear both rights of one colour.
    #[inline]
    pub fn clear_color(&mut self, color: Color) {
        self.remove(Self::flag(color, CastleSide::King) | Self::flag(color, CastleSide::Queen));
    }

    /// Parse the FEN castling field (e.g. "KQkq", "-", "Kq").
    ///
    /// Letters may come in any order but none may repeat.
    pub fn from_fen(s: &str) -> Option<Self> {
        if s == "-" {
            return Some(CastlingRights::NONE);
        }
        if s.is_empty() {
            return None;
        }
        let mut rights = 0u8;
        for c in s.chars() {
            let flag = match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => return None,
            };
            if rights & flag != 0 {
                return None;
            }
            rights |= flag;
        }
        Some(CastlingRights(rights))
    }

    /// Convert to FEN castling string.
    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.has(Self::WHITE_KINGSIDE) {
            s.push('K');
        }
        if self.has(Self::WHITE_QUEENSIDE) {
            s.push('Q');
        }
        if self.has(Self::BLACK_KINGSIDE) {
            s.push('k');
        }
        if self.has(Self::BLACK_QUEENSIDE) {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

/// Which rook a king castles with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    /// Towards the highest file.
    King,
    /// Towards file a.
    Queen,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];

    /// File step the king takes towards the rook.
    #[inline]
    pub const fn direction(self) -> i8 {
        match self {
            CastleSide::King => 1,
            CastleSide::Queen => -1,
        }
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Status of the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }

    /// Whether the side to move is attacked (check or checkmate).
    pub fn is_check(&self) -> bool {
        matches!(self, GameStatus::Check | GameStatus::Checkmate)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which rule of the position text was violated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("expected 6 space-separated fields, got {0}")]
    FieldCount(usize),

    #[error("board size {0} is outside 8..=16")]
    BoardSize(usize),

    #[error("expected {expected} ranks, got {found}")]
    RankCount { expected: usize, found: usize },

    #[error("rank {rank} has {found} squares instead of {expected}")]
    RankWidth {
        rank: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid empty-square run '{run}' in rank {rank}")]
    EmptyRun { rank: usize, run: String },

    #[error("invalid piece character '{ch}' in rank {rank}")]
    PieceChar { rank: usize, ch: char },

    #[error("invalid side to move: '{0}'")]
    ActiveColor(String),

    #[error("invalid castling field: '{0}'")]
    Castling(String),

    #[error("invalid en passant square: '{0}'")]
    EnPassantSquare(String),

    #[error("en passant square {square} is not on rank 3 or {far_rank}")]
    EnPassantRank { square: String, far_rank: u8 },

    #[error("invalid halfmove clock: '{0}'")]
    HalfmoveClock(String),

    #[error("invalid fullmove number: '{0}'")]
    FullmoveNumber(String),
}

/// Domain errors for the chess engine.
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(#[from] FenError),

    #[error("board size {0} is outside 8..=16")]
    InvalidBoardSize(usize),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("invalid move notation: {0}")]
    InvalidMoveText(String),

    #[error("illegal move: {0}")]
    IllegalMove(Move),

    #[error("game is already over: {0}")]
    GameOver(GameStatus),

    #[error("no moves to undo")]
    NothingToUndo,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
