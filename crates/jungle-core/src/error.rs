//! Position codec error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("position is empty")]
    Empty,

    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row} has {found} columns, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown piece character '{0}'")]
    UnknownPiece(char),

    #[error("side to move must be 'w' or 'b', got '{0}'")]
    UnknownSide(String),
}
