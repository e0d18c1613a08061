//! Rule properties checked over random games on every supported board size.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use chess_rules::engine::board::Position;
use chess_rules::engine::fen;
use chess_rules::engine::game::{Game, apply_move, status};
use chess_rules::engine::movegen::{
    capture_moves, has_legal_move, is_castle, legal_moves, legal_moves_from, quiet_moves,
};
use chess_rules::engine::types::{
    BoardSize, ChessError, Color, GameStatus, Move, PieceType, Square,
};

fn size(n: u8) -> BoardSize {
    BoardSize::new(n).unwrap()
}

fn sq(name: &str) -> Square {
    Square::from_algebraic(name, size(16)).unwrap()
}

/// Checks that must hold in every reachable position.
fn check_position(pos: &Position) {
    let mover = pos.side_to_move;
    let moves = legal_moves(pos);

    // Text round trip.
    let text = pos.to_fen();
    let back = fen::parse(&text, pos.size().get() as usize).unwrap();
    assert_eq!(&back, pos, "round trip of {text}");

    // Per-square generation agrees with the full list.
    let per_square: usize = pos
        .board
        .pieces_of(mover)
        .map(|(from, _)| legal_moves_from(pos, from).len())
        .sum();
    assert_eq!(per_square, moves.len(), "{text}");
    assert_eq!(capture_moves(pos).len() + quiet_moves(pos).len(), moves.len());
    assert_eq!(has_legal_move(pos), !moves.is_empty());

    // No legal move leaves the mover's king attacked.
    for &mv in &moves {
        let child = apply_move(pos, mv).unwrap_or_else(|| panic!("{mv} rejected in {text}"));
        if let Some(king) = child.king_sq(mover) {
            assert!(
                !child.is_square_attacked(king, mover),
                "{mv} leaves the king attacked in {text}"
            );
        }
        assert_eq!(child.side_to_move, !mover);
        if is_castle(pos, mv) {
            assert!(!pos.is_in_check(), "castled out of check in {text}");
        }
    }

    let expected = match (moves.is_empty(), pos.is_in_check()) {
        (true, true) => GameStatus::Checkmate,
        (true, false) => GameStatus::Stalemate,
        (false, true) => GameStatus::Check,
        (false, false) => GameStatus::Active,
    };
    assert_eq!(status(pos), expected, "{text}");
}

fn random_playout(n: u8, seed: u64, plies: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos = Position::starting(size(n));
    for _ in 0..plies {
        check_position(&pos);
        let moves = legal_moves(&pos);
        let Some(&mv) = moves.choose(&mut rng) else {
            break;
        };
        pos = apply_move(&pos, mv).unwrap();
    }
}

#[test]
fn random_games_on_standard_board() {
    for seed in 0..8 {
        random_playout(8, seed, 120);
    }
}

#[test]
fn random_games_on_larger_boards() {
    for n in 9..=16u8 {
        random_playout(n, 1_000 + n as u64, 80);
    }
}

#[test]
fn random_games_from_tactical_position() {
    for seed in 0..4 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pos =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        for _ in 0..60 {
            check_position(&pos);
            let moves = legal_moves(&pos);
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };
            pos = apply_move(&pos, mv).unwrap();
        }
    }
}

// =====================================================================
// Castling preconditions
// =====================================================================

fn castle_targets(fen: &str) -> Vec<Square> {
    let pos = Position::from_fen(fen).unwrap();
    let mut targets: Vec<Square> = legal_moves(&pos)
        .into_iter()
        .filter(|&m| is_castle(&pos, m))
        .map(|m| m.to)
        .collect();
    targets.sort();
    targets
}

#[test]
fn castling_offered_when_every_condition_holds() {
    assert_eq!(
        castle_targets("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"),
        vec![sq("c1"), sq("g1")]
    );
    assert_eq!(
        castle_targets("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1"),
        vec![sq("c8"), sq("g8")]
    );
}

#[test]
fn each_violated_condition_suppresses_castling() {
    // Right missing.
    assert_eq!(castle_targets("r3k2r/8/8/8/8/8/8/R3K2R w Q - 0 1"), vec![sq("c1")]);
    // Rook missing.
    assert_eq!(castle_targets("r3k2r/8/8/8/8/8/8/4K2R w KQ - 0 1"), vec![sq("g1")]);
    // Piece in between.
    assert_eq!(castle_targets("r3k2r/8/8/8/8/8/8/R3KB1R w KQ - 0 1"), vec![sq("c1")]);
    // In check.
    assert!(castle_targets("r3k2r/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").is_empty());
    // Crossing an attacked square.
    assert_eq!(castle_targets("r3k2r/8/8/8/8/8/3r4/R3K2R w KQ - 0 1"), vec![sq("g1")]);
    // Landing on an attacked square.
    assert_eq!(castle_targets("r3k2r/8/8/8/8/8/6r1/R3K2R w KQ - 0 1"), vec![sq("c1")]);
}

// =====================================================================
// En passant window
// =====================================================================

#[test]
fn en_passant_only_on_the_following_ply() {
    let mut game = Game::from_fen("4k3/2p5/8/3P4/8/8/8/4K3 b - - 0 1", size(8)).unwrap();
    game.play_text("c7c5").unwrap();
    assert_eq!(game.position().en_passant, Some(sq("c6")));
    assert!(game.legal_moves_from(sq("d5")).contains(&Move::new(sq("d5"), sq("c6"))));

    game.play_text("e1d2").unwrap();
    game.play_text("e8d7").unwrap();
    assert!(!game.legal_moves_from(sq("d5")).contains(&Move::new(sq("d5"), sq("c6"))));
    assert!(matches!(game.play_text("d5c6"), Err(ChessError::IllegalMove(_))));
}

#[test]
fn en_passant_only_from_the_adjacent_file() {
    // The b-pawn is two files away from the pushed c-pawn.
    let pos = Position::from_fen("4k3/8/8/1Pp5/8/8/8/4K3 w - c6 0 1").unwrap();
    assert!(legal_moves_from(&pos, sq("b5")).contains(&Move::new(sq("b5"), sq("c6"))));
    let pos = Position::from_fen("4k3/8/8/P1p5/8/8/8/4K3 w - c6 0 1").unwrap();
    assert_eq!(legal_moves_from(&pos, sq("a5")), vec![Move::new(sq("a5"), sq("a6"))]);
}

#[test]
fn en_passant_on_sixteen_by_sixteen() {
    let mut game = Game::new(size(16));
    game.play_text("h2h4").unwrap();
    game.play_text("a15a14").unwrap();
    // March the h-pawn up while black shuffles its a-pawn.
    for rank in 4..13u8 {
        game.play_text(&format!("h{}h{}", rank, rank + 1)).unwrap();
        if rank < 12 {
            game.play_text(&format!("a{}a{}", 18 - rank, 17 - rank)).unwrap();
        }
    }
    // White pawn stands on h13, one rank below the black double-push target.
    game.play_text("g15g13").unwrap();
    assert_eq!(game.position().en_passant, Some(sq("g14")));
    game.play_text("h13g14").unwrap();
    assert_eq!(game.position().piece_at(sq("g13")), None);
    assert_eq!(
        game.history().last().map(|record| record.captured),
        Some(Some(PieceType::Pawn))
    );
}

// =====================================================================
// Status
// =====================================================================

#[test]
fn status_definitions() {
    let stalemate = Position::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(status(&stalemate), GameStatus::Stalemate);
    assert!(legal_moves(&stalemate).is_empty());
    assert!(!stalemate.is_in_check());

    let mate = Position::from_fen("k7/1Q6/1K6/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(status(&mate), GameStatus::Checkmate);

    let check = Position::from_fen("k7/8/1K6/8/8/8/8/7Q b - - 0 1").unwrap();
    assert_eq!(status(&check), GameStatus::Check);
    assert_eq!(check.side_to_move, Color::Black);
}

#[test]
fn mate_on_a_larger_board() {
    // Back-rank mate on 10x10.
    let empty = "10/".repeat(7);
    let pos = Position::from_fen_sized(&format!("8k1/7ppp/{empty}R8K w - - 0 1"), size(10)).unwrap();
    let next = apply_move(&pos, Move::new(sq("a1"), sq("a10"))).unwrap();
    assert_eq!(status(&next), GameStatus::Checkmate);
}
