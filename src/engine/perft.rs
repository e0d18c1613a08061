//! Perft: exhaustive move-tree enumeration with move classification.
//!
//! Counters other than `nodes` describe the moves of the last ply only (the
//! moves whose subtree has depth 0) and are summed upward unchanged.

use std::ops::AddAssign;

use serde::Serialize;
use tracing::debug;

use crate::engine::board::Position;
use crate::engine::game;
use crate::engine::movegen;
use crate::engine::types::{Move, PieceType};

/// Leaf count plus classification of the frontier moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerftResult {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    /// Checks, checkmates included.
    pub checks: u64,
    pub discovery_checks: u64,
    pub double_checks: u64,
    pub checkmates: u64,
}

impl PerftResult {
    fn leaf() -> Self {
        PerftResult {
            nodes: 1,
            ..Default::default()
        }
    }
}

impl AddAssign for PerftResult {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.discovery_checks += rhs.discovery_checks;
        self.double_checks += rhs.double_checks;
        self.checkmates += rhs.checkmates;
    }
}

/// Count the move tree below `pos` to `depth` plies.
pub fn perft(pos: &Position, depth: u32) -> PerftResult {
    if depth == 0 {
        return PerftResult::leaf();
    }
    let mut result = PerftResult::default();
    for mv in movegen::legal_moves(pos) {
        result += perft_after(pos, mv, depth);
    }
    result
}

/// Per-root-move breakdown of `perft(pos, depth)`. Empty at depth 0.
pub fn perft_divide(pos: &Position, depth: u32) -> Vec<(Move, PerftResult)> {
    if depth == 0 {
        return Vec::new();
    }
    movegen::legal_moves(pos)
        .into_iter()
        .map(|mv| {
            let result = perft_after(pos, mv, depth);
            debug!(mv = %mv, nodes = result.nodes, "divide");
            (mv, result)
        })
        .collect()
}

/// Total of a `perft_divide` breakdown taken at `depth`. Matches
/// `perft(pos, depth)`, including the single root node at depth 0.
pub fn divide_total(rows: &[(Move, PerftResult)], depth: u32) -> PerftResult {
    if depth == 0 {
        return PerftResult::leaf();
    }
    let mut total = PerftResult::default();
    for (_, result) in rows {
        total += *result;
    }
    total
}

/// Subtree of one legal move, `depth` counted from `pos`.
fn perft_after(pos: &Position, mv: Move, depth: u32) -> PerftResult {
    let Some(child) = game::play(pos, mv) else {
        return PerftResult::default();
    };
    if depth == 1 {
        classify(pos, mv, &child)
    } else {
        perft(&child, depth - 1)
    }
}

fn classify(parent: &Position, mv: Move, child: &Position) -> PerftResult {
    let mut result = PerftResult::leaf();
    let mover = parent.side_to_move;

    if movegen::is_capture(parent, mv) {
        result.captures = 1;
    }
    if movegen::is_en_passant(parent, mv) {
        result.en_passant = 1;
    }
    if movegen::is_castle(parent, mv) {
        result.castles = 1;
    }
    if mv.promotion.is_some_and(PieceType::is_promotion_target) {
        result.promotions = 1;
    }

    let Some(king) = child.king_sq(!mover) else {
        return result;
    };
    if !child.board.is_attacked_by(king, mover) {
        return result;
    }

    result.checks = 1;
    if !movegen::has_legal_move(child) {
        result.checkmates = 1;
    }

    // Lift the mover off the parent board and look again.
    let mut lifted = parent.board;
    lifted.take(mv.from);
    if lifted.is_attacked_by(king, mover) {
        result.discovery_checks = 1;
    }
    if child.board.count_attackers(king, mover, 2) >= 2 {
        result.double_checks = 1;
    }
    result
}

// =========================================================================
// Tests
// =========================================================================
