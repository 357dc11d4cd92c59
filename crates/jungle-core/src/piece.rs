//! Pieces and their single-character encoding.
//!
//! Blue pieces are uppercase, Red pieces lowercase. Blue moves first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Blue,
    Red,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Blue => Color::Red,
            Color::Red => Color::Blue,
        }
    }

    /// Side-to-move token used in position strings.
    pub fn side_token(self) -> char {
        match self {
            Color::Blue => 'w',
            Color::Red => 'b',
        }
    }

    pub fn from_side_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "w" => Some(Color::Blue),
            "b" => Some(Color::Red),
            _ => None,
        }
    }

    /// Color name in engine `play` commands. The engine calls the first
    /// player black, so Blue plays as `B`.
    pub fn protocol_color(self) -> char {
        match self {
            Color::Blue => 'B',
            Color::Red => 'W',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Rat,
    Cat,
    Dog,
    Wolf,
    Leopard,
    Tiger,
    Lion,
    Elephant,
}

impl PieceKind {
    pub const ALL: [PieceKind; 8] = [
        PieceKind::Rat,
        PieceKind::Cat,
        PieceKind::Dog,
        PieceKind::Wolf,
        PieceKind::Leopard,
        PieceKind::Tiger,
        PieceKind::Lion,
        PieceKind::Elephant,
    ];

    /// Lowercase letter for this kind (`j` is the leopard).
    pub fn letter(self) -> char {
        match self {
            PieceKind::Rat => 'r',
            PieceKind::Cat => 'c',
            PieceKind::Dog => 'd',
            PieceKind::Wolf => 'w',
            PieceKind::Leopard => 'j',
            PieceKind::Tiger => 't',
            PieceKind::Lion => 'l',
            PieceKind::Elephant => 'e',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.letter() == c.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    pub fn to_char(self) -> char {
        match self.color {
            Color::Blue => self.kind.letter().to_ascii_uppercase(),
            Color::Red => self.kind.letter(),
        }
    }

    /// Decode a piece character. Returns `None` for anything that is not
    /// one of the sixteen piece letters.
    pub fn from_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::Blue
        } else {
            Color::Red
        };
        Some(Self { kind, color })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_char_roundtrip() {
        for kind in PieceKind::ALL {
            for color in [Color::Blue, Color::Red] {
                let piece = Piece::new(kind, color);
                assert_eq!(Piece::from_char(piece.to_char()), Some(piece));
            }
        }
    }

    #[test]
    fn test_case_selects_color() {
        assert_eq!(Piece::from_char('J'), Some(Piece::new(PieceKind::Leopard, Color::Blue)));
        assert_eq!(Piece::from_char('e'), Some(Piece::new(PieceKind::Elephant, Color::Red)));
        assert_eq!(Piece::from_char('x'), None);
        assert_eq!(Piece::from_char(' '), None);
    }

    #[test]
    fn test_side_tokens() {
        assert_eq!(Color::from_side_token("W"), Some(Color::Blue));
        assert_eq!(Color::from_side_token("b"), Some(Color::Red));
        assert_eq!(Color::from_side_token("x"), None);
        assert_eq!(Color::Blue.protocol_color(), 'B');
        assert_eq!(Color::Red.opponent(), Color::Blue);
    }
}
