//! Pre-computed move tables for every supported board size.
//!
//! Each board size gets its own immutable `AttackTables`, built lazily on
//! first use (via `OnceLock`) and kept for the lifetime of the process. The
//! tables hold leaper targets (knight, king, pawn captures) and, for sliding
//! pieces, the ordered squares along each ray up to the board edge.

use std::sync::OnceLock;

use crate::engine::types::{BoardSize, Color, Square};

// =========================================================================
// Public API
// =========================================================================

const SIZE_COUNT: usize = (BoardSize::MAX - BoardSize::MIN + 1) as usize;

/// Get the tables for a board size, building them on first use.
pub fn tables(size: BoardSize) -> &'static AttackTables {
    static TABLES: [OnceLock<AttackTables>; SIZE_COUNT] = [const { OnceLock::new() }; SIZE_COUNT];
    TABLES[(size.get() - BoardSize::MIN) as usize].get_or_init(|| AttackTables::init(size))
}

/// Ray directions as (file delta, rank delta). Orthogonal rays first.
pub const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Indices into `DIRECTIONS` used by rooks.
pub const ROOK_RAYS: std::ops::Range<usize> = 0..4;
/// Indices into `DIRECTIONS` used by bishops.
pub const BISHOP_RAYS: std::ops::Range<usize> = 4..8;
/// Indices into `DIRECTIONS` used by queens.
pub const QUEEN_RAYS: std::ops::Range<usize> = 0..8;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Pre-computed target lists for one board size, indexed by `Square::index`.
/// Entries for squares off the board are empty.
pub struct AttackTables {
    pub size: BoardSize,
    knight: Vec<Vec<Square>>,
    king: Vec<Vec<Square>>,
    /// `pawn_attacks[color][square]`: squares a pawn on `square` attacks.
    pawn_attacks: [Vec<Vec<Square>>; 2],
    /// `rays[square][direction]`: squares along a ray, nearest first.
    rays: Vec<[Vec<Square>; 8]>,
}

impl AttackTables {
    /// Knight targets from a square.
    #[inline]
    pub fn knight_attacks(&self, sq: Square) -> &[Square] {
        &self.knight[sq.index()]
    }

    /// King targets from a square (no castling).
    #[inline]
    pub fn king_attacks(&self, sq: Square) -> &[Square] {
        &self.king[sq.index()]
    }

    /// Squares a pawn of `color` on `sq` captures onto.
    #[inline]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> &[Square] {
        &self.pawn_attacks[color.index()][sq.index()]
    }

    /// Squares along ray `dir` (an index into `DIRECTIONS`), nearest first.
    #[inline]
    pub fn ray(&self, sq: Square, dir: usize) -> &[Square] {
        &self.rays[sq.index()][dir]
    }
}

// =========================================================================
// Initialisation
// =========================================================================

impl AttackTables {
    fn init(size: BoardSize) -> Self {
        let mut knight = vec![Vec::new(); Square::NUM];
        let mut king = vec![Vec::new(); Square::NUM];
        let mut pawn_attacks = [vec![Vec::new(); Square::NUM], vec![Vec::new(); Square::NUM]];
        let mut rays: Vec<[Vec<Square>; 8]> = (0..Square::NUM).map(|_| Default::default()).collect();

        for rank in 0..size.get() {
            for file in 0..size.get() {
                let sq = Square::from_file_rank(file, rank);
                let i = sq.index();

                knight[i] = leaper_targets(sq, &KNIGHT_OFFSETS, size);

                king[i] = leaper_targets(sq, &DIRECTIONS, size);

                for color in [Color::White, Color::Black] {
                    let dr = color.forward();
                    pawn_attacks[color.index()][i] = leaper_targets(sq, &[(-1, dr), (1, dr)], size);
                }

                for (dir, &(df, dr)) in DIRECTIONS.iter().enumerate() {
                    let mut ray = Vec::new();
                    let mut cur = sq;
                    while let Some(next) = cur.offset(df, dr, size) {
                        ray.push(next);
                        cur = next;
                    }
                    rays[i][dir] = ray;
                }
            }
        }

        AttackTables {
            size,
            knight,
            king,
            pawn_attacks,
            rays,
        }
    }
}

fn leaper_targets(sq: Square, offsets: &[(i8, i8)], size: BoardSize) -> Vec<Square> {
    offsets
        .iter()
        .filter_map(|&(df, dr)| sq.offset(df, dr, size))
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
