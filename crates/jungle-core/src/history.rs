//! Local undo stack, kept independently of the engine's own undo.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Square};
use crate::piece::{Color, Piece};

/// One applied move, with enough information to revert it locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    /// The piece standing on `to` after the move
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub mover: Color,
}

impl MoveRecord {
    /// Put the moved piece back on `from`, restore the captured piece (or
    /// an empty cell) on `to`, and hand the move back to the mover.
    pub fn revert(&self, board: &mut Board) {
        board.set(self.from, Some(self.piece));
        board.set(self.to, self.captured);
        board.set_side_to_move(self.mover);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoveHistory {
    records: Vec<MoveRecord>,
}

impl MoveHistory {
    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<MoveRecord> {
        self.records.pop()
    }

    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
