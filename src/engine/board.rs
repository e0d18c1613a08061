//! Mailbox board and position representation.
//!
//! `Board` stores one optional piece per square in a fixed 16×16 array, so a
//! board of any supported size is a plain `Copy` value. `Position` adds the
//! side to move, castling rights, en-passant target and move counters.

use serde::{Serialize, Serializer};

use crate::engine::attacks::{self, BISHOP_RAYS, ROOK_RAYS};
use crate::engine::types::{
    BoardSize, CastleSide, CastlingRights, Color, Move, Piece, PieceType, Square,
};

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Piece placement for an N×N board.
///
/// Squares outside the board are always empty. King squares are cached per
/// colour. With more than one king of a colour the cache tracks the one placed
/// last, and moves to another of them when that one leaves its square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    size: BoardSize,
    cells: [Option<Piece>; Square::NUM],
    kings: [Option<Square>; 2],
}

impl Board {
    /// An empty board.
    pub fn empty(size: BoardSize) -> Self {
        Board {
            size,
            cells: [None; Square::NUM],
            kings: [None; 2],
        }
    }

    #[inline]
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()]
    }

    /// Place a piece, replacing any occupant.
    #[inline]
    pub fn put(&mut self, sq: Square, piece: Piece) {
        debug_assert!(sq.is_on(self.size), "square {sq} is off a {} board", self.size);
        let old = self.cells[sq.index()].replace(piece);
        self.forget_king(sq, old);
        if piece.kind == PieceType::King {
            self.kings[piece.color.index()] = Some(sq);
        }
    }

    /// Remove and return the occupant of a square.
    #[inline]
    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        let old = self.cells[sq.index()].take();
        self.forget_king(sq, old);
        old
    }

    /// Drops the cached king square once its king has left `sq`, falling back
    /// to any other king of that colour still on the board.
    #[inline]
    fn forget_king(&mut self, sq: Square, old: Option<Piece>) {
        if let Some(king) = old
            && king.kind == PieceType::King
            && self.kings[king.color.index()] == Some(sq)
        {
            let remaining = self.squares().find(|&other| self.get(other) == Some(king));
            self.kings[king.color.index()] = remaining;
        }
    }

    /// Square of the given colour's king, if it has one.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.kings[color.index()]
    }

    /// All on-board squares, rank 1 first.
    pub fn squares(&self) -> impl Iterator<Item = Square> + use<> {
        let n = self.size.get();
        (0..n).flat_map(move |rank| (0..n).map(move |file| Square::from_file_rank(file, rank)))
    }

    /// Squares holding a piece of `color`, with the piece.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares().filter_map(move |sq| match self.get(sq) {
            Some(piece) if piece.color == color => Some((sq, piece)),
            _ => None,
        })
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Looks outward from `sq` for pawns, knights, kings and the first piece on
    /// every ray, which finds exactly the squares an opposing non-castling
    /// pseudo-legal move could capture on. Pawn pushes are not attacks, and a
    /// square holding one of `by`'s own pieces is never a target.
    pub fn is_attacked_by(&self, sq: Square, by: Color) -> bool {
        self.count_attackers(sq, by, 1) > 0
    }

    /// Count distinct pieces of colour `by` attacking `sq`, stopping at `limit`.
    pub fn count_attackers(&self, sq: Square, by: Color, limit: usize) -> usize {
        if self.get(sq).is_some_and(|p| p.color == by) {
            return 0;
        }
        let t = attacks::tables(self.size);
        let mut count = 0;
        let mut hit = |found: bool| {
            if found {
                count += 1;
            }
            count >= limit
        };

        // A pawn of `by` attacks `sq` from the squares a pawn of the other
        // colour on `sq` would capture onto.
        for &from in t.pawn_attacks(!by, sq) {
            if hit(self.get(from) == Some(Piece::new(by, PieceType::Pawn))) {
                return limit;
            }
        }
        for &from in t.knight_attacks(sq) {
            if hit(self.get(from) == Some(Piece::new(by, PieceType::Knight))) {
                return limit;
            }
        }
        for &from in t.king_attacks(sq) {
            if hit(self.get(from) == Some(Piece::new(by, PieceType::King))) {
                return limit;
            }
        }
        for dir in ROOK_RAYS {
            let blocker = self.first_piece(t.ray(sq, dir));
            let found = blocker.is_some_and(|p| {
                p.color == by && matches!(p.kind, PieceType::Rook | PieceType::Queen)
            });
            if hit(found) {
                return limit;
            }
        }
        for dir in BISHOP_RAYS {
            let blocker = self.first_piece(t.ray(sq, dir));
            let found = blocker.is_some_and(|p| {
                p.color == by && matches!(p.kind, PieceType::Bishop | PieceType::Queen)
            });
            if hit(found) {
                return limit;
            }
        }
        count
    }

    #[inline]
    fn first_piece(&self, ray: &[Square]) -> Option<Piece> {
        ray.iter().find_map(|&sq| self.get(sq))
    }

    // -----------------------------------------------------------------------
    // Trial moves (legality filter scratch space)
    // -----------------------------------------------------------------------

    /// Play a move on this board for a king-safety probe: remove an en-passant
    /// victim, relocate the piece and substitute a promotion. Castling rooks
    /// stay put. Returns what is needed to restore the board.
    pub(crate) fn make_trial(&mut self, mv: Move, en_passant: Option<Square>) -> TrialUndo {
        let moved = self.take(mv.from);
        let victim = match moved {
            Some(p) if is_en_passant_capture(p, mv, en_passant) && self.get(mv.to).is_none() => {
                let victim_sq = Square::from_file_rank(mv.to.file(), mv.from.rank());
                self.take(victim_sq).map(|piece| (victim_sq, piece))
            }
            _ => None,
        };
        let captured = self.take(mv.to);
        if let Some(piece) = moved {
            let kind = mv.promotion.unwrap_or(piece.kind);
            self.put(mv.to, Piece::new(piece.color, kind));
        }
        TrialUndo {
            mv,
            moved,
            captured,
            victim,
        }
    }

    /// Reverse a `make_trial`.
    pub(crate) fn undo_trial(&mut self, undo: TrialUndo) {
        self.take(undo.mv.to);
        if let Some(piece) = undo.captured {
            self.put(undo.mv.to, piece);
        }
        if let Some((sq, piece)) = undo.victim {
            self.put(sq, piece);
        }
        if let Some(piece) = undo.moved {
            self.put(undo.mv.from, piece);
        }
    }
}

/// State saved by `Board::make_trial`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TrialUndo {
    mv: Move,
    moved: Option<Piece>,
    captured: Option<Piece>,
    victim: Option<(Square, Piece)>,
}

/// Whether `piece` playing `mv` takes en passant on the `en_passant` target.
#[inline]
pub(crate) fn is_en_passant_capture(piece: Piece, mv: Move, en_passant: Option<Square>) -> bool {
    piece.kind == PieceType::Pawn && en_passant == Some(mv.to) && mv.from.file() != mv.to.file()
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete position on an N×N board.
///
/// Positions are values: the engine never mutates one a caller holds, every
/// move produces a fresh `Position`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Piece placement.
    pub board: Board,

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Half-move clock (reset on pawn move or capture).
    pub halfmove_clock: u32,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u32,
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl Position {
    /// An empty board with White to move and no rights.
    pub fn empty(size: BoardSize) -> Self {
        Position {
            board: Board::empty(size),
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The starting layout generalized to N×N.
    ///
    /// Rooks, knights and bishops fill the files nearest each corner, the
    /// queen stands on file `N/2 - 1` and the king on file `N/2`; remaining
    /// back-rank files stay empty. Pawns fill rank 2 and rank N-1.
    pub fn starting(size: BoardSize) -> Self {
        let mut pos = Position::empty(size);
        let last = size.last();
        for file in 0..size.get() {
            let kind = back_rank_piece(file, size);
            for (color, back, pawns) in [(Color::White, 0, 1), (Color::Black, last, last - 1)] {
                if let Some(kind) = kind {
                    pos.board.put(Square::from_file_rank(file, back), Piece::new(color, kind));
                }
                pos.board.put(Square::from_file_rank(file, pawns), Piece::new(color, PieceType::Pawn));
            }
        }
        pos.castling_rights = CastlingRights::ALL;
        pos
    }

    /// Board size of this position.
    #[inline]
    pub fn size(&self) -> BoardSize {
        self.board.size()
    }

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    /// Find the king square for the given colour.
    #[inline]
    pub fn king_sq(&self, color: Color) -> Option<Square> {
        self.board.king_square(color)
    }

    /// Is `sq` attacked by the opponent of `defending`?
    pub fn is_square_attacked(&self, sq: Square, defending: Color) -> bool {
        sq.is_on(self.size()) && self.board.is_attacked_by(sq, !defending)
    }

    /// Is the side-to-move's king currently attacked? `false` without a king.
    pub fn is_in_check(&self) -> bool {
        self.king_sq(self.side_to_move)
            .is_some_and(|king| self.is_square_attacked(king, self.side_to_move))
    }

    // -----------------------------------------------------------------------
    // Geometry helpers
    // -----------------------------------------------------------------------

    /// Rank index a colour's pieces start on.
    #[inline]
    pub fn back_rank(&self, color: Color) -> u8 {
        match color {
            Color::White => 0,
            Color::Black => self.size().last(),
        }
    }

    /// Rank index pawns may double-push from.
    #[inline]
    pub fn pawn_home_rank(&self, color: Color) -> u8 {
        match color {
            Color::White => 1,
            Color::Black => self.size().last() - 1,
        }
    }

    /// Rank index pawns promote on.
    #[inline]
    pub fn promotion_rank(&self, color: Color) -> u8 {
        self.back_rank(!color)
    }

    /// Home corner of the rook a colour castles with on `side`.
    #[inline]
    pub fn rook_home(&self, color: Color, side: CastleSide) -> Square {
        let file = match side {
            CastleSide::King => self.size().last(),
            CastleSide::Queen => 0,
        };
        Square::from_file_rank(file, self.back_rank(color))
    }

    // -----------------------------------------------------------------------
    // Board views
    // -----------------------------------------------------------------------

    /// The grid with row 0 at the highest rank and column 0 at file a.
    pub fn rows(&self) -> Vec<Vec<Option<Piece>>> {
        let n = self.size().get();
        (0..n)
            .rev()
            .map(|rank| {
                (0..n)
                    .map(|file| self.piece_at(Square::from_file_rank(file, rank)))
                    .collect()
            })
            .collect()
    }

    /// Render the board as text (highest rank at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let n = self.size().get();
        let mut s = String::with_capacity((n as usize + 1) * (n as usize * 2 + 4));
        for (row, cells) in self.rows().iter().enumerate() {
            s.push_str(&format!("{:>2} ", n as usize - row));
            let line: Vec<String> = cells
                .iter()
                .map(|cell| cell.map_or('.', Piece::to_char).to_string())
                .collect();
            s.push_str(&line.join(" "));
            s.push('\n');
        }
        s.push_str("   ");
        let files: Vec<String> = (0..n).map(|f| ((b'a' + f) as char).to_string()).collect();
        s.push_str(&files.join(" "));
        s
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::starting(BoardSize::STANDARD)
    }
}

/// Back-rank piece of the generalized starting layout on `file`.
fn back_rank_piece(file: u8, size: BoardSize) -> Option<PieceType> {
    let last = size.last();
    let king_file = size.get() / 2;
    match file {
        f if f == 0 || f == last => Some(PieceType::Rook),
        f if f == 1 || f == last - 1 => Some(PieceType::Knight),
        f if f == 2 || f == last - 2 => Some(PieceType::Bishop),
        f if f == king_file - 1 => Some(PieceType::Queen),
        f if f == king_file => Some(PieceType::King),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

/// Positions serialize as their FEN text.
impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_fen())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: u8) -> BoardSize {
        BoardSize::new(n).unwrap()
    }

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name, size(16)).unwrap()
    }

    fn piece(c: char) -> Piece {
        let (color, kind) = PieceType::from_char(c).unwrap();
        Piece::new(color, kind)
    }

    fn board_with(n: u8, pieces: &[(&str, char)]) -> Board {
        let mut board = Board::empty(size(n));
        for &(name, c) in pieces {
            board.put(sq(name), piece(c));
        }
        board
    }

    // ===================================================================
    // Starting layouts
    // ===================================================================

    #[test]
    fn starting_position_standard_layout() {
        let pos = Position::default();
        let back: String = (0..8)
            .map(|f| pos.piece_at(Square::from_file_rank(f, 0)).unwrap().to_char())
            .collect();
        assert_eq!(back, "RNBQKBNR");
        let top: String = (0..8)
            .map(|f| pos.piece_at(Square::from_file_rank(f, 7)).unwrap().to_char())
            .collect();
        assert_eq!(top, "rnbqkbnr");
        assert_eq!(pos.king_sq(Color::White), Some(sq("e1")));
        assert_eq!(pos.king_sq(Color::Black), Some(sq("e8")));
        assert_eq!(pos.castling_rights, CastlingRights::ALL);
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.en_passant, None);
    }

    #[test]
    fn starting_position_piece_counts_all_sizes() {
        for n in 8..=16 {
            let pos = Position::starting(size(n));
            for color in [Color::White, Color::Black] {
                let pieces: Vec<_> = pos.board.pieces_of(color).collect();
                let pawns = pieces.iter().filter(|(_, p)| p.kind == PieceType::Pawn).count();
                let kings = pieces.iter().filter(|(_, p)| p.kind == PieceType::King).count();
                assert_eq!(pawns, n as usize);
                assert_eq!(kings, 1);
                assert_eq!(pieces.len(), n as usize + 8);
            }
        }
    }

    #[test]
    fn starting_position_ten_by_ten() {
        let pos = Position::starting(size(10));
        assert_eq!(pos.king_sq(Color::White), Some(sq("f1")));
        assert_eq!(pos.piece_at(sq("e1")), Some(piece('Q')));
        assert_eq!(pos.piece_at(sq("d1")), None);
        assert_eq!(pos.piece_at(sq("h10")), Some(piece('b')));
        assert_eq!(pos.piece_at(sq("j10")), Some(piece('r')));
        assert_eq!(pos.piece_at(sq("c9")), Some(piece('p')));
    }

    // ===================================================================
    // Board bookkeeping
    // ===================================================================

    #[test]
    fn put_and_take_piece() {
        let mut board = Board::empty(BoardSize::STANDARD);
        board.put(sq("e4"), piece('N'));
        assert_eq!(board.get(sq("e4")), Some(piece('N')));
        assert_eq!(board.take(sq("e4")), Some(piece('N')));
        assert_eq!(board.get(sq("e4")), None);
        assert_eq!(board.take(sq("e4")), None);
    }

    #[test]
    fn king_cache_follows_moves() {
        let mut board = board_with(8, &[("e1", 'K')]);
        assert_eq!(board.king_square(Color::White), Some(sq("e1")));
        let king = board.take(sq("e1")).unwrap();
        assert_eq!(board.king_square(Color::White), None);
        board.put(sq("f2"), king);
        assert_eq!(board.king_square(Color::White), Some(sq("f2")));
        board.put(sq("f2"), piece('q'));
        assert_eq!(board.king_square(Color::White), None);
    }

    #[test]
    fn position_serializes_as_fen() {
        let json = serde_json::to_string(&Position::default()).unwrap();
        assert_eq!(
            json,
            "\"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\""
        );
    }

    #[test]
    fn king_cache_falls_back_to_remaining_king() {
        let mut board = board_with(8, &[("a1", 'K'), ("h1", 'K'), ("e8", 'k')]);
        assert_eq!(board.king_square(Color::White), Some(sq("h1")));
        board.put(sq("h1"), piece('r'));
        assert_eq!(board.king_square(Color::White), Some(sq("a1")));
        board.take(sq("a1"));
        assert_eq!(board.king_square(Color::White), None);
        assert_eq!(board.king_square(Color::Black), Some(sq("e8")));
    }

    #[test]
    fn second_king_keeps_its_side_in_check_after_capture() {
        // Two white kings; the rook takes the cached one and still attacks the other.
        let pos = Position::from_fen("7k/8/8/8/8/8/8/K5Kr b - - 0 1").unwrap();
        assert_eq!(pos.king_sq(Color::White), Some(sq("g1")));
        let next = crate::engine::game::apply_move(&pos, Move::new(sq("h1"), sq("g1"))).unwrap();
        assert_eq!(next.king_sq(Color::White), Some(sq("a1")));
        assert!(next.is_in_check());
    }

    #[test]
    fn rows_put_highest_rank_first() {
        let pos = Position::default();
        let rows = pos.rows();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0][0], Some(piece('r')));
        assert_eq!(rows[7][4], Some(piece('K')));
        assert_eq!(rows[3][0], None);
    }

    #[test]
    fn board_string_starting() {
        let s = Position::default().board_string();
        assert!(s.starts_with(" 8 r n b q k b n r"));
        assert!(s.ends_with("a b c d e f g h"));
        let wide = Position::starting(size(12)).board_string();
        assert!(wide.starts_with("12 r n b . . q k . . b n r"));
    }

    // ===================================================================
    // Attack detection
    // ===================================================================

    #[test]
    fn pawn_attacks_diagonally_only() {
        let board = board_with(8, &[("e4", 'P')]);
        assert!(board.is_attacked_by(sq("d5"), Color::White));
        assert!(board.is_attacked_by(sq("f5"), Color::White));
        assert!(!board.is_attacked_by(sq("e5"), Color::White));
        assert!(!board.is_attacked_by(sq("d3"), Color::White));
    }

    #[test]
    fn sliders_are_blocked() {
        let board = board_with(8, &[("a1", 'r'), ("a4", 'P'), ("h8", 'b')]);
        assert!(board.is_attacked_by(sq("a3"), Color::Black));
        assert!(board.is_attacked_by(sq("a4"), Color::Black));
        assert!(!board.is_attacked_by(sq("a5"), Color::Black));
        assert!(board.is_attacked_by(sq("h1"), Color::Black));
        assert!(board.is_attacked_by(sq("b2"), Color::Black));
    }

    #[test]
    fn own_piece_is_not_a_target() {
        let board = board_with(8, &[("a1", 'r'), ("a2", 'n')]);
        assert!(!board.is_attacked_by(sq("a2"), Color::Black));
    }

    #[test]
    fn count_attackers_double_check() {
        // Rook on e-file and knight on d3 both hit e1.
        let board = board_with(8, &[("e1", 'K'), ("e8", 'r'), ("d3", 'n')]);
        assert_eq!(board.count_attackers(sq("e1"), Color::Black, 8), 2);
        assert_eq!(board.count_attackers(sq("e1"), Color::Black, 1), 1);
    }

    #[test]
    fn attacks_reach_across_large_boards() {
        let board = board_with(16, &[("a1", 'q')]);
        assert!(board.is_attacked_by(sq("p16"), Color::Black));
        assert!(board.is_attacked_by(sq("a16"), Color::Black));
        assert!(!board.is_attacked_by(sq("b16"), Color::Black));
    }

    #[test]
    fn position_attack_query_without_king() {
        let pos = Position::empty(BoardSize::STANDARD);
        assert!(!pos.is_in_check());
        assert!(!pos.is_square_attacked(sq("e4"), Color::White));
        assert!(!pos.is_square_attacked(sq("i9"), Color::White));
    }

    // ===================================================================
    // Trial make/undo
    // ===================================================================

    #[test]
    fn trial_round_trip_restores_board() {
        let board = board_with(8, &[("e5", 'P'), ("d5", 'p'), ("e1", 'K'), ("e8", 'k')]);
        let mut scratch = board;
        let mv = Move::new(sq("e5"), sq("d6"));
        let undo = scratch.make_trial(mv, Some(sq("d6")));
        assert_eq!(scratch.get(sq("d5")), None);
        assert_eq!(scratch.get(sq("d6")), Some(piece('P')));
        scratch.undo_trial(undo);
        assert_eq!(scratch, board);
    }

    #[test]
    fn trial_promotion_and_capture() {
        let board = board_with(8, &[("g7", 'P'), ("h8", 'r'), ("a1", 'K')]);
        let mut scratch = board;
        let undo = scratch.make_trial(Move::with_promotion(sq("g7"), sq("h8"), PieceType::Knight), None);
        assert_eq!(scratch.get(sq("h8")), Some(piece('N')));
        scratch.undo_trial(undo);
        assert_eq!(scratch, board);
    }

    #[test]
    fn trial_king_move_updates_cache() {
        let board = board_with(8, &[("e1", 'K')]);
        let mut scratch = board;
        let undo = scratch.make_trial(Move::new(sq("e1"), sq("e2")), None);
        assert_eq!(scratch.king_square(Color::White), Some(sq("e2")));
        scratch.undo_trial(undo);
        assert_eq!(scratch.king_square(Color::White), Some(sq("e1")));
    }
}
