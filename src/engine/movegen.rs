//! Legal move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves per piece (ignoring pins / check evasion).
//!   2. Filter: play the move on a scratch board, verify the mover's king is
//!      not attacked, restore the scratch board.

use crate::engine::attacks::{self, BISHOP_RAYS, QUEEN_RAYS, ROOK_RAYS};
use crate::engine::board::{self, Board, Position};
use crate::engine::types::{CastleSide, Color, Move, Piece, PieceType, Square};

// =========================================================================
// Public API
// =========================================================================

/// Generate all legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(64);
    for (from, piece) in pos.board.pieces_of(pos.side_to_move) {
        generate_piece_moves(pos, from, piece, &mut pseudo);
    }
    retain_legal(pos, pseudo)
}

/// Legal moves of the piece on `from`. Empty when the square is empty, off
/// the board, or holds an opponent piece.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    if !from.is_on(pos.size()) {
        return Vec::new();
    }
    match pos.piece_at(from) {
        Some(piece) if piece.color == pos.side_to_move => {
            let mut pseudo = Vec::with_capacity(32);
            generate_piece_moves(pos, from, piece, &mut pseudo);
            retain_legal(pos, pseudo)
        }
        _ => Vec::new(),
    }
}

/// Whether the side to move has at least one legal move. Stops at the first.
pub fn has_legal_move(pos: &Position) -> bool {
    let us = pos.side_to_move;
    let mut scratch = pos.board;
    let mut pseudo = Vec::with_capacity(32);
    for (from, piece) in pos.board.pieces_of(us) {
        pseudo.clear();
        generate_piece_moves(pos, from, piece, &mut pseudo);
        if pseudo
            .iter()
            .any(|&mv| leaves_king_safe(&mut scratch, mv, us, pos.en_passant))
        {
            return true;
        }
    }
    false
}

/// Legal moves that capture (en passant included).
pub fn capture_moves(pos: &Position) -> Vec<Move> {
    legal_moves(pos)
        .into_iter()
        .filter(|&mv| is_capture(pos, mv))
        .collect()
}

/// Legal moves that capture nothing.
pub fn quiet_moves(pos: &Position) -> Vec<Move> {
    legal_moves(pos)
        .into_iter()
        .filter(|&mv| !is_capture(pos, mv))
        .collect()
}

// =========================================================================
// Move classification
// =========================================================================

/// Does `mv` displace an occupant or take en passant?
pub fn is_capture(pos: &Position, mv: Move) -> bool {
    pos.piece_at(mv.to).is_some() || is_en_passant(pos, mv)
}

/// Is `mv` a pawn taking en passant in `pos`?
pub fn is_en_passant(pos: &Position, mv: Move) -> bool {
    pos.piece_at(mv.from)
        .is_some_and(|piece| board::is_en_passant_capture(piece, mv, pos.en_passant))
        && pos.piece_at(mv.to).is_none()
}

/// Is `mv` a king moving two files?
pub fn is_castle(pos: &Position, mv: Move) -> bool {
    pos.piece_at(mv.from)
        .is_some_and(|piece| piece.kind == PieceType::King)
        && mv.from.rank() == mv.to.rank()
        && mv.from.file().abs_diff(mv.to.file()) == 2
}

// =========================================================================
// Legality filter
// =========================================================================

fn retain_legal(pos: &Position, mut moves: Vec<Move>) -> Vec<Move> {
    let us = pos.side_to_move;
    // Without a king there is nothing to expose.
    if pos.king_sq(us).is_none() {
        return moves;
    }
    let mut scratch = pos.board;
    moves.retain(|&mv| leaves_king_safe(&mut scratch, mv, us, pos.en_passant));
    moves
}

fn leaves_king_safe(scratch: &mut Board, mv: Move, us: Color, en_passant: Option<Square>) -> bool {
    let undo = scratch.make_trial(mv, en_passant);
    let safe = scratch
        .king_square(us)
        .is_none_or(|king| !scratch.is_attacked_by(king, !us));
    scratch.undo_trial(undo);
    safe
}

// =========================================================================
// Pseudo-legal generation (internal)
// =========================================================================

fn generate_piece_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let t = attacks::tables(pos.size());
    let us = piece.color;
    match piece.kind {
        PieceType::Pawn => generate_pawn_moves(pos, from, us, moves),
        PieceType::Knight => generate_leaper_moves(pos, from, us, t.knight_attacks(from), moves),
        PieceType::King => {
            generate_leaper_moves(pos, from, us, t.king_attacks(from), moves);
            generate_castling_moves(pos, from, us, moves);
        }
        PieceType::Bishop => generate_slider_moves(pos, from, us, BISHOP_RAYS, moves),
        PieceType::Rook => generate_slider_moves(pos, from, us, ROOK_RAYS, moves),
        PieceType::Queen => generate_slider_moves(pos, from, us, QUEEN_RAYS, moves),
    }
}

// =========================================================================
// Pawn moves
// =========================================================================

fn generate_pawn_moves(pos: &Position, from: Square, us: Color, moves: &mut Vec<Move>) {
    let size = pos.size();
    let promo_rank = pos.promotion_rank(us);

    // --- Single and double push ---
    if let Some(one) = from.offset(0, us.forward(), size)
        && pos.piece_at(one).is_none()
    {
        push_pawn_move(from, one, promo_rank, moves);

        if from.rank() == pos.pawn_home_rank(us)
            && let Some(two) = one.offset(0, us.forward(), size)
            && pos.piece_at(two).is_none()
        {
            moves.push(Move::new(from, two));
        }
    }

    // --- Captures (including promotion captures and en passant) ---
    for &to in attacks::tables(size).pawn_attacks(us, from) {
        match pos.piece_at(to) {
            Some(target) if target.color != us => push_pawn_move(from, to, promo_rank, moves),
            None if en_passant_available(pos, from, to, us) => moves.push(Move::new(from, to)),
            _ => {}
        }
    }
}

/// The target must be the recorded en-passant square on the rank behind an
/// enemy double push, with the enemy pawn standing beside the capturer.
fn en_passant_available(pos: &Position, from: Square, to: Square, us: Color) -> bool {
    let target_rank = match us {
        Color::White => pos.size().last() - 2,
        Color::Black => 2,
    };
    pos.en_passant == Some(to)
        && to.rank() == target_rank
        && pos.piece_at(Square::from_file_rank(to.file(), from.rank()))
            == Some(Piece::new(!us, PieceType::Pawn))
}

/// Push a pawn move, expanding it to all four promotions on the last rank.
fn push_pawn_move(from: Square, to: Square, promo_rank: u8, moves: &mut Vec<Move>) {
    if to.rank() == promo_rank {
        for promo in PieceType::PROMOTIONS {
            moves.push(Move::with_promotion(from, to, promo));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

// =========================================================================
// Knight and king moves (non-castling)
// =========================================================================

fn generate_leaper_moves(
    pos: &Position,
    from: Square,
    us: Color,
    targets: &[Square],
    moves: &mut Vec<Move>,
) {
    for &to in targets {
        if pos.piece_at(to).is_none_or(|p| p.color != us) {
            moves.push(Move::new(from, to));
        }
    }
}

// =========================================================================
// Slider moves (bishop, rook, queen)
// =========================================================================

fn generate_slider_moves(
    pos: &Position,
    from: Square,
    us: Color,
    dirs: std::ops::Range<usize>,
    moves: &mut Vec<Move>,
) {
    let t = attacks::tables(pos.size());
    for dir in dirs {
        for &to in t.ray(from, dir) {
            match pos.piece_at(to) {
                None => moves.push(Move::new(from, to)),
                Some(p) => {
                    if p.color != us {
                        moves.push(Move::new(from, to));
                    }
                    break;
                }
            }
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

fn generate_castling_moves(pos: &Position, king: Square, us: Color, moves: &mut Vec<Move>) {
    // Only from the back rank, and never out of check.
    if king.rank() != pos.back_rank(us) || pos.is_square_attacked(king, us) {
        return;
    }

    for side in CastleSide::BOTH {
        if !pos.castling_rights.allows(us, side) {
            continue;
        }
        let rook = pos.rook_home(us, side);
        if pos.piece_at(rook) != Some(Piece::new(us, PieceType::Rook)) {
            continue;
        }

        let dir = side.direction();
        let Some(target) = king.offset(2 * dir, 0, pos.size()) else {
            continue;
        };
        let has_room = match side {
            CastleSide::King => target.file() < rook.file(),
            CastleSide::Queen => target.file() > rook.file(),
        };
        if !has_room {
            continue;
        }

        let (lo, hi) = if king.file() < rook.file() {
            (king.file() + 1, rook.file())
        } else {
            (rook.file() + 1, king.file())
        };
        let path_clear =
            (lo..hi).all(|file| pos.piece_at(Square::from_file_rank(file, king.rank())).is_none());
        if !path_clear {
            continue;
        }

        let transit_safe = [dir, 2 * dir].iter().all(|&df| {
            king.offset(df, 0, pos.size())
                .is_some_and(|sq| !pos.is_square_attacked(sq, us))
        });
        if transit_safe {
            moves.push(Move::new(king, target));
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
