//! Session error types

use jungle_core::PositionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load engine: {0}")]
    Spawn(String),

    #[error("Instruction sending failed: {0}")]
    Send(#[from] std::io::Error),

    #[error("Invalid position: {0}")]
    Position(#[from] PositionError),
}
