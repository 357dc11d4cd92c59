//! The 9x7 board grid and side to move.
//!
//! No rules are enforced here; the engine owns move legality.

use serde::{Deserialize, Serialize};

use crate::piece::{Color, Piece};

pub const ROWS: usize = 9;
pub const COLS: usize = 7;

/// Starting layout, top row first. Red occupies the top, Blue the bottom.
const INITIAL_LAYOUT: [&[u8; COLS]; ROWS] = [
    b"l     t",
    b" d   c ",
    b"r j w e",
    b"       ",
    b"       ",
    b"       ",
    b"E W J R",
    b" C   D ",
    b"T     L",
];

/// A board cell. Row 0 is the top row as displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn is_on_board(self) -> bool {
        self.row < ROWS && self.col < COLS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; COLS]; ROWS],
    side_to_move: Color,
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl Board {
    /// A board with no pieces and Blue to move.
    pub fn empty() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
            side_to_move: Color::Blue,
        }
    }

    pub fn initial() -> Self {
        let mut board = Self::empty();
        for (row, line) in INITIAL_LAYOUT.iter().enumerate() {
            for (col, &c) in line.iter().enumerate() {
                board.cells[row][col] = Piece::from_char(c as char);
            }
        }
        board
    }

    pub(crate) fn from_cells(cells: [[Option<Piece>; COLS]; ROWS], side_to_move: Color) -> Self {
        Self { cells, side_to_move }
    }

    /// Restore the starting layout with Blue to move.
    pub fn reset(&mut self) {
        *self = Self::initial();
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells.get(sq.row)?.get(sq.col).copied().flatten()
    }

    /// Place or clear a cell. Off-board squares are ignored.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        if let Some(cell) = self.cells.get_mut(sq.row).and_then(|r| r.get_mut(sq.col)) {
            *cell = piece;
        }
    }

    /// Move whatever stands on `from` to `to`, overwriting the occupant.
    /// Returns the captured piece. The side to move is left unchanged.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Option<Piece> {
        let moving = self.get(from);
        let captured = self.get(to);
        self.set(to, moving);
        self.set(from, None);
        captured
    }

    /// Rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Piece>; COLS]> {
        self.cells.iter()
    }

    pub fn piece_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}
