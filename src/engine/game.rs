//! Move application, status detection and the `Game` move log.
//!
//! `apply_move` is a pure transition: it validates a move against the legal
//! move list and returns the next position, leaving the input untouched.
//! `Game` wraps a current position with the history of accepted moves.

use serde::Serialize;
use tracing::debug;

use crate::engine::board::{self, Position};
use crate::engine::movegen;
use crate::engine::types::{
    BoardSize, CastleSide, CastlingRights, ChessError, Color, GameStatus, Move, Piece, PieceType,
    Square,
};

// =========================================================================
// Pure transitions
// =========================================================================

/// Apply a move to a position, producing the next one.
///
/// Returns `None` (and changes nothing) unless `mv` is one of the legal
/// moves of the piece on `mv.from`, promotion included.
pub fn apply_move(pos: &Position, mv: Move) -> Option<Position> {
    if !movegen::legal_moves_from(pos, mv.from).contains(&mv) {
        return None;
    }
    play(pos, mv)
}

/// Apply a move already known to be legal. `None` only if `mv.from` is empty.
pub(crate) fn play(pos: &Position, mv: Move) -> Option<Position> {
    let us = pos.side_to_move;
    let mut next = pos.clone();

    let piece = next.board.take(mv.from)?;
    let captured = next.board.get(mv.to);
    let en_passant = captured.is_none() && board::is_en_passant_capture(piece, mv, pos.en_passant);

    // 1. En-passant victim stands beside the mover's origin.
    if en_passant {
        next.board.take(Square::from_file_rank(mv.to.file(), mv.from.rank()));
    }

    // 2. Move (or promote) the piece.
    let kind = mv.promotion.unwrap_or(piece.kind);
    next.board.put(mv.to, Piece::new(us, kind));

    // 3. Castling rook lands on the square the king crossed.
    if let Some(side) = castle_side(piece, mv) {
        let rook_from = pos.rook_home(us, side);
        if let Some(rook_to) = mv.from.offset(side.direction(), 0, pos.size())
            && let Some(rook) = next.board.take(rook_from)
        {
            next.board.put(rook_to, rook);
        }
    }

    // 4. Castling rights.
    if piece.kind == PieceType::King {
        next.castling_rights.clear_color(us);
    }
    for color in [Color::White, Color::Black] {
        for side in CastleSide::BOTH {
            let corner = pos.rook_home(color, side);
            if mv.from == corner || mv.to == corner {
                next.castling_rights.remove(CastlingRights::flag(color, side));
            }
        }
    }

    // 5. En-passant target after a double push.
    next.en_passant = if piece.kind == PieceType::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2
    {
        mv.from.offset(0, us.forward(), pos.size())
    } else {
        None
    };

    // 6-8. Clocks and turn.
    if piece.kind == PieceType::Pawn || captured.is_some() || en_passant {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }
    if us == Color::Black {
        next.fullmove_number = next.fullmove_number.saturating_add(1);
    }
    next.side_to_move = !us;

    Some(next)
}

/// Which side a king move castles towards, if it is a castle.
fn castle_side(piece: Piece, mv: Move) -> Option<CastleSide> {
    if piece.kind != PieceType::King || mv.from.file().abs_diff(mv.to.file()) != 2 {
        return None;
    }
    Some(if mv.to.file() > mv.from.file() {
        CastleSide::King
    } else {
        CastleSide::Queen
    })
}

/// Status of the side to move. Draw rules are not considered.
pub fn status(pos: &Position) -> GameStatus {
    let in_check = pos.is_in_check();
    match (movegen::has_legal_move(pos), in_check) {
        (false, true) => GameStatus::Checkmate,
        (false, false) => GameStatus::Stalemate,
        (true, true) => GameStatus::Check,
        (true, false) => GameStatus::Active,
    }
}

// =========================================================================
// MoveRecord
// =========================================================================

/// A recorded move in the game history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// The move that was played.
    #[serde(rename = "move")]
    pub mv: Move,
    /// The piece type that moved (before any promotion).
    pub piece: PieceType,
    /// Captured piece type, en passant included.
    pub captured: Option<PieceType>,
    /// What game status resulted from this move.
    pub status_after: GameStatus,
}

// =========================================================================
// Game
// =========================================================================

/// A game in progress: the current position plus the log of accepted moves.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    status: GameStatus,
    history: Vec<MoveRecord>,
    /// Positions before each recorded move, for undo.
    previous: Vec<Position>,
    starting_fen: String,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Start a game from the starting layout for `size`.
    pub fn new(size: BoardSize) -> Self {
        Self::from_position(Position::starting(size))
    }

    /// Start a game from position text for a board of `size`.
    pub fn from_fen(fen: &str, size: BoardSize) -> Result<Self, ChessError> {
        Ok(Self::from_position(Position::from_fen_sized(fen, size)?))
    }

    pub fn from_position(position: Position) -> Self {
        Self {
            status: status(&position),
            starting_fen: position.to_fen(),
            position,
            history: Vec::new(),
            previous: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current board position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    /// Completed move history.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&self.position)
    }

    /// Legal moves from a specific square.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        movegen::legal_moves_from(&self.position, sq)
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    /// Current position as text.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// Position text the game started from.
    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    // -----------------------------------------------------------------
    // Play / undo
    // -----------------------------------------------------------------

    /// Play a move and return the resulting status.
    ///
    /// Fails with `ChessError::GameOver` once the game is decided and with
    /// `ChessError::IllegalMove` for anything not in the legal move list.
    pub fn play(&mut self, mv: Move) -> Result<GameStatus, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status));
        }

        let Some(next) = apply_move(&self.position, mv) else {
            debug!(mv = %mv, fen = %self.position.to_fen(), "illegal move rejected");
            return Err(ChessError::IllegalMove(mv));
        };

        let captured = if movegen::is_en_passant(&self.position, mv) {
            Some(PieceType::Pawn)
        } else {
            self.position.piece_at(mv.to).map(|p| p.kind)
        };
        let piece = self
            .position
            .piece_at(mv.from)
            .map_or(PieceType::Pawn, |p| p.kind);

        let status_after = status(&next);
        let previous = std::mem::replace(&mut self.position, next);
        self.previous.push(previous);
        self.status = status_after;
        self.history.push(MoveRecord {
            mv,
            piece,
            captured,
            status_after,
        });

        debug!(mv = %mv, status = %status_after, ply = self.history.len(), "move played");
        Ok(status_after)
    }

    /// Parse coordinate notation for this board and play it.
    pub fn play_text(&mut self, text: &str) -> Result<GameStatus, ChessError> {
        let mv = Move::parse(text, self.position.size())?;
        self.play(mv)
    }

    /// Take back the last move. Returns the move that was undone.
    pub fn undo(&mut self) -> Result<Move, ChessError> {
        let record = self.history.pop().ok_or(ChessError::NothingToUndo)?;
        let previous = self.previous.pop().ok_or(ChessError::NothingToUndo)?;
        self.position = previous;
        self.status = status(&self.position);
        Ok(record.mv)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(BoardSize::STANDARD)
    }
}

// =========================================================================
// Tests
// =========================================================================
