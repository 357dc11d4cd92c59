//! Position codec: rows separated by `/`, top row first, runs of empty
//! cells written as decimal counts, optionally followed by a side token.
//!
//! The initial position encodes as `l5t/1d3c1/r1j1w1e/7/7/7/E1W1J1R/1C3D1/T5L w`.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, COLS, ROWS};
use crate::error::PositionError;
use crate::piece::{Color, Piece};

/// Encode the board. The side token is appended when `include_side` is set.
pub fn encode(board: &Board, include_side: bool) -> String {
    let mut out = String::with_capacity(48);
    for (i, row) in board.rows().enumerate() {
        if i > 0 {
            out.push('/');
        }
        let mut empty = 0;
        for cell in row {
            match cell {
                None => empty += 1,
                Some(piece) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
    }
    if include_side {
        out.push(' ');
        out.push(board.side_to_move().side_token());
    }
    out
}

/// Decode a position string. A missing side token means Blue to move;
/// anything after the side token is ignored.
pub fn decode(text: &str) -> Result<Board, PositionError> {
    let mut parts = text.split_whitespace();
    let placement = parts.next().ok_or(PositionError::Empty)?;

    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != ROWS {
        return Err(PositionError::RowCount {
            expected: ROWS,
            found: rows.len(),
        });
    }

    let mut cells = [[None; COLS]; ROWS];
    for (r, row) in rows.iter().enumerate() {
        cells[r] = decode_row(r, row)?;
    }

    let side = match parts.next() {
        Some(token) => Color::from_side_token(token)
            .ok_or_else(|| PositionError::UnknownSide(token.to_string()))?,
        None => Color::Blue,
    };

    Ok(Board::from_cells(cells, side))
}

fn decode_row(index: usize, row: &str) -> Result<[Option<Piece>; COLS], PositionError> {
    let mut cells = [None; COLS];
    let mut filled = 0usize;
    let mut run = 0usize;

    let column_error = |found: usize| PositionError::ColumnCount {
        row: index,
        expected: COLS,
        found,
    };

    for c in row.chars() {
        if let Some(digit) = c.to_digit(10) {
            // Digits accumulate: "12" is a single run of twelve.
            run = run.saturating_mul(10).saturating_add(digit as usize);
            continue;
        }
        filled = filled.saturating_add(run);
        run = 0;
        let piece = Piece::from_char(c).ok_or(PositionError::UnknownPiece(c))?;
        if filled >= COLS {
            return Err(column_error(filled + 1));
        }
        cells[filled] = Some(piece);
        filled += 1;
    }
    filled = filled.saturating_add(run);

    if filled != COLS {
        return Err(column_error(filled));
    }
    Ok(cells)
}

impl Board {
    pub fn to_fen(&self, include_side: bool) -> String {
        encode(self, include_side)
    }

    pub fn from_fen(text: &str) -> Result<Self, PositionError> {
        decode(text)
    }
}

impl FromStr for Board {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;
    use crate::piece::PieceKind;

    const INITIAL: &str = "l5t/1d3c1/r1j1w1e/7/7/7/E1W1J1R/1C3D1/T5L w";

    #[test]
    fn test_encode_initial() {
        assert_eq!(encode(&Board::initial(), true), INITIAL);
        assert_eq!(
            encode(&Board::initial(), false),
            "l5t/1d3c1/r1j1w1e/7/7/7/E1W1J1R/1C3D1/T5L"
        );
    }

    #[test]
    fn test_decode_initial() {
        assert_eq!(decode(INITIAL).unwrap(), Board::initial());
    }

    #[test]
    fn test_decode_side_defaults_to_blue() {
        let board = decode("7/7/7/7/7/7/7/7/7").unwrap();
        assert_eq!(board.side_to_move(), Color::Blue);
        assert_eq!(board.piece_count(), 0);

        let board = decode("7/7/7/7/3L3/7/7/7/7 B").unwrap();
        assert_eq!(board.side_to_move(), Color::Red);
        assert_eq!(
            board.get(Square::new(4, 3)),
            Some(Piece::new(PieceKind::Lion, Color::Blue))
        );
    }

    #[test]
    fn test_decode_rejects_row_count() {
        assert_eq!(
            decode("7/7/7"),
            Err(PositionError::RowCount { expected: 9, found: 3 })
        );
        assert_eq!(decode("   "), Err(PositionError::Empty));
    }

    #[test]
    fn test_decode_rejects_column_count() {
        assert_eq!(
            decode("7/7/6/7/7/7/7/7/7"),
            Err(PositionError::ColumnCount { row: 2, expected: 7, found: 6 })
        );
        assert_eq!(
            decode("7/7/7/7/7/7/7/7/rrrrrrrr"),
            Err(PositionError::ColumnCount { row: 8, expected: 7, found: 8 })
        );
    }

    #[test]
    fn test_multi_digit_runs_accumulate() {
        // "12" is twelve empties, not one then two.
        assert_eq!(
            decode("12/7/7/7/7/7/7/7/7"),
            Err(PositionError::ColumnCount { row: 0, expected: 7, found: 12 })
        );
        assert!(decode("1l5/7/7/7/7/7/7/7/7").is_ok());
    }

    #[test]
    fn test_decode_rejects_unknown_piece_and_side() {
        assert_eq!(
            decode("x6/7/7/7/7/7/7/7/7"),
            Err(PositionError::UnknownPiece('x'))
        );
        assert_eq!(
            decode("7/7/7/7/7/7/7/7/7 r"),
            Err(PositionError::UnknownSide("r".to_string()))
        );
    }
}
