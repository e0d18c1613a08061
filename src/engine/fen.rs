//! Position text codec.
//!
//! The format is FEN generalized to N×N boards: N ranks separated by `/`,
//! highest rank first, with empty squares run-length encoded as decimal
//! numbers (`10` on a 10×10 board is a single run of ten).

use crate::engine::board::Position;
use crate::engine::types::{
    BoardSize, CastlingRights, ChessError, Color, FenError, Piece, PieceType, Square,
};

/// Parse position text for a board of `board_size` × `board_size`.
///
/// Nothing is returned unless every field is valid; kingless positions are
/// accepted.
pub fn parse(text: &str, board_size: usize) -> Result<Position, FenError> {
    let fields: Vec<&str> = text.split(' ').collect();
    if fields.len() != 6 {
        return Err(FenError::FieldCount(fields.len()));
    }

    let size = u8::try_from(board_size)
        .ok()
        .and_then(|n| BoardSize::new(n).ok())
        .ok_or(FenError::BoardSize(board_size))?;
    let mut pos = Position::empty(size);

    // ----- Field 1: Piece placement -----
    parse_placement(fields[0], &mut pos)?;

    // ----- Field 2: Side to move -----
    pos.side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::ActiveColor(other.to_string())),
    };

    // ----- Field 3: Castling availability -----
    pos.castling_rights = CastlingRights::from_fen(fields[2])
        .ok_or_else(|| FenError::Castling(fields[2].to_string()))?;

    // ----- Field 4: En passant target -----
    pos.en_passant = parse_en_passant(fields[3], size)?;

    // ----- Fields 5-6: Clocks -----
    pos.halfmove_clock =
        parse_counter(fields[4]).ok_or_else(|| FenError::HalfmoveClock(fields[4].to_string()))?;
    pos.fullmove_number = parse_counter(fields[5])
        .filter(|&n| n >= 1)
        .ok_or_else(|| FenError::FullmoveNumber(fields[5].to_string()))?;

    Ok(pos)
}

fn parse_placement(placement: &str, pos: &mut Position) -> Result<(), FenError> {
    let size = pos.size();
    let n = size.get() as usize;
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != n {
        return Err(FenError::RankCount {
            expected: n,
            found: ranks.len(),
        });
    }

    for (row, rank_str) in ranks.iter().enumerate() {
        let rank = (n - 1 - row) as u8;
        let rank_no = rank as usize + 1;
        let mut file = 0usize;
        let mut chars = rank_str.char_indices().peekable();

        while let Some((start, ch)) = chars.next() {
            if ch.is_ascii_digit() {
                let mut end = start + 1;
                while let Some(&(i, c)) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                let run = &rank_str[start..end];
                let count = run
                    .parse::<usize>()
                    .ok()
                    .filter(|&c| !run.starts_with('0') && (1..=n).contains(&c))
                    .ok_or_else(|| FenError::EmptyRun {
                        rank: rank_no,
                        run: run.to_string(),
                    })?;
                file += count;
            } else {
                let (color, kind) =
                    PieceType::from_char(ch).ok_or(FenError::PieceChar { rank: rank_no, ch })?;
                if file < n {
                    let sq = Square::from_file_rank(file as u8, rank);
                    pos.board.put(sq, Piece::new(color, kind));
                }
                file += 1;
            }
        }

        if file != n {
            return Err(FenError::RankWidth {
                rank: rank_no,
                expected: n,
                found: file,
            });
        }
    }
    Ok(())
}

/// The target must sit directly behind a double push: rank 3 or rank N-2.
fn parse_en_passant(field: &str, size: BoardSize) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let sq = Square::from_algebraic(field, size)
        .ok_or_else(|| FenError::EnPassantSquare(field.to_string()))?;
    let far = size.last() - 2;
    if sq.rank() != 2 && sq.rank() != far {
        return Err(FenError::EnPassantRank {
            square: field.to_string(),
            far_rank: far + 1,
        });
    }
    Ok(Some(sq))
}

/// Unsigned decimal; signs, fractions and blanks are rejected.
fn parse_counter(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Serialize a position to text.
pub fn serialize(pos: &Position) -> String {
    let mut placement = String::new();
    for (row, cells) in pos.rows().iter().enumerate() {
        if row > 0 {
            placement.push('/');
        }
        let mut empty = 0;
        for cell in cells {
            match cell {
                Some(piece) => {
                    if empty > 0 {
                        placement.push_str(&empty.to_string());
                        empty = 0;
                    }
                    placement.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
    }

    let ep = pos
        .en_passant
        .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic());

    format!(
        "{} {} {} {} {} {}",
        placement,
        pos.side_to_move.to_fen_char(),
        pos.castling_rights.to_fen(),
        ep,
        pos.halfmove_clock,
        pos.fullmove_number,
    )
}

// ---------------------------------------------------------------------------
// Position conveniences
// ---------------------------------------------------------------------------

impl Position {
    /// Parse an 8×8 position.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(parse(fen, BoardSize::STANDARD.get() as usize)?)
    }

    /// Parse a position for a board of the given size.
    pub fn from_fen_sized(fen: &str, size: BoardSize) -> Result<Self, ChessError> {
        Ok(parse(fen, size.get() as usize)?)
    }

    pub fn to_fen(&self) -> String {
        serialize(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
