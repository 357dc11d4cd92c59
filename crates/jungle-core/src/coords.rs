//! Engine move tokens such as `A9` or `G1`.
//!
//! Columns are letters from `A`; the protocol never uses `I`, so letters
//! after it map one column to the left. Rows count up from the bottom.

use crate::board::{Square, ROWS};

/// Decode a move token into a square. Returns `None` for tokens of the
/// wrong length (e.g. `pass`), the letter `I`, or row numbers outside
/// `1..=ROWS`. Columns are not bounded by the board width.
pub fn parse_move_token(token: &str) -> Option<Square> {
    if !token.is_ascii() || !(2..=3).contains(&token.len()) {
        return None;
    }
    let letter = token.as_bytes()[0].to_ascii_uppercase();
    if !letter.is_ascii_uppercase() || letter == b'I' {
        return None;
    }
    let mut col = (letter - b'A') as usize;
    if letter > b'I' {
        col -= 1;
    }

    let number: usize = token[1..].parse().ok()?;
    if !(1..=ROWS).contains(&number) {
        return None;
    }
    Some(Square::new(ROWS - number, col))
}

/// Encode a square as a move token, skipping `I`.
pub fn move_token(sq: Square) -> String {
    let mut letter = b'A' + sq.col as u8;
    if letter >= b'I' {
        letter += 1;
    }
    format!("{}{}", letter as char, ROWS - sq.row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left_token() {
        assert_eq!(parse_move_token("A9"), Some(Square::new(0, 0)));
        assert_eq!(parse_move_token("g1"), Some(Square::new(8, 6)));
    }

    #[test]
    fn test_letters_after_i_shift_left() {
        // 'J' is ten letters from 'A' but the ninth column.
        assert_eq!(parse_move_token("J5"), Some(Square::new(4, 8)));
        assert_eq!(parse_move_token("H5"), Some(Square::new(4, 7)));
        assert_eq!(parse_move_token("I5"), None);
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(parse_move_token("pass"), None);
        assert_eq!(parse_move_token("A"), None);
        assert_eq!(parse_move_token("A0"), None);
        assert_eq!(parse_move_token("A10"), None);
        assert_eq!(parse_move_token("5A"), None);
    }

    #[test]
    fn test_move_token_inverts_parse() {
        assert_eq!(move_token(Square::new(0, 0)), "A9");
        assert_eq!(move_token(Square::new(6, 2)), "C3");
        assert_eq!(move_token(Square::new(4, 8)), "J5");
        assert_eq!(parse_move_token(&move_token(Square::new(3, 5))), Some(Square::new(3, 5)));
    }
}
