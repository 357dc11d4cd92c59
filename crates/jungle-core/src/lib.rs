//! Board model for Jungle (Dou Shou Qi): pieces, the 9x7 grid, the
//! position codec shared with the analysis engine, and local move history.

pub mod board;
pub mod coords;
pub mod error;
pub mod fen;
pub mod game;
pub mod history;
pub mod piece;

pub use board::{Board, Square, COLS, ROWS};
pub use error::PositionError;
pub use game::Game;
pub use history::{MoveHistory, MoveRecord};
pub use piece::{Color, Piece, PieceKind};
