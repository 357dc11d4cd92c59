//! Board plus the local state around it: move history, the piece picked up
//! by the player, and the last move played.

use crate::board::{Board, Square};
use crate::history::{MoveHistory, MoveRecord};
use crate::piece::{Color, Piece};

#[derive(Debug, Clone, Default)]
pub struct Game {
    board: Board,
    history: MoveHistory,
    selected: Option<Square>,
    last_move: Option<(Square, Square)>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.board.set_side_to_move(color);
    }

    /// Back to the starting layout with an empty history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace the whole position, e.g. from an editor or pasted string.
    /// History is dropped since it no longer describes this board.
    pub fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.history.clear();
        self.selected = None;
        self.last_move = None;
    }

    /// True when `sq` holds a piece of the side to move.
    pub fn owns(&self, sq: Square) -> bool {
        self.piece_of_mover(self.board.get(sq))
    }

    fn piece_of_mover(&self, piece: Option<Piece>) -> bool {
        piece.is_some_and(|p| p.color == self.board.side_to_move())
    }

    /// Pick up the piece on `sq`. Only a piece of the side to move can be
    /// picked up, and only when nothing is selected yet.
    pub fn select(&mut self, sq: Square) -> bool {
        if self.selected.is_some() || !self.owns(sq) {
            return false;
        }
        self.selected = Some(sq);
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Move `from` to `to`, record it, and pass the turn. The caller is
    /// responsible for having checked ownership and that `to` is not held
    /// by the mover's own piece. An empty `from` leaves everything as is.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Option<Piece> {
        let Some(piece) = self.board.get(from) else {
            return None;
        };
        let mover = self.board.side_to_move();
        let captured = self.board.apply_move(from, to);
        self.history.push(MoveRecord {
            from,
            to,
            piece,
            captured,
            mover,
        });
        self.board.set_side_to_move(mover.opponent());
        self.selected = None;
        self.last_move = Some((from, to));
        captured
    }

    /// Revert the most recent move. Does nothing while a piece is picked up
    /// or when there is nothing to undo.
    pub fn undo_last(&mut self) -> Option<MoveRecord> {
        if self.selected.is_some() {
            return None;
        }
        let record = self.history.pop()?;
        record.revert(&mut self.board);
        self.last_move = None;
        Some(record)
    }
}
