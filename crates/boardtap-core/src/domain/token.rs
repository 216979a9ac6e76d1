//! UCI-style move-token grammar.
//!
//! A move token is a 4–5 character ASCII sequence naming an origin square, a
//! destination square, and optionally a promotion piece letter: `e2e4`,
//! `a7a8q`. Remote messages are free-form text, so the extractor scans the
//! whole string and takes the first match, case-normalised to lowercase.
//! Messages with no token are not an error — they are simply ignored by the
//! caller.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::domain::square::{Square, SquareError};

/// The compiled token pattern, built once on first use.
///
/// `[a-h][1-8]` twice (origin + destination) with an optional trailing
/// promotion letter. `(?i)` makes the scan case-insensitive so `E2E4`
/// matches too.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)[a-h][1-8][a-h][1-8][qrnb]?").expect("token pattern must compile")
    })
}

/// Errors that can occur when parsing a move token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token had fewer than four characters.
    #[error("move token must be at least four characters, got {0:?}")]
    TooShort(String),

    /// One of the two squares failed to parse.
    #[error("invalid square in move token: {0}")]
    Square(#[from] SquareError),

    /// The fifth character was not a recognised promotion piece.
    #[error("promotion piece must be one of q, r, n, b, got {0:?}")]
    Promotion(char),
}

/// Promotion piece carried by a 5-character token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    Queen,
    Rook,
    Knight,
    Bishop,
}

impl Promotion {
    fn from_char(c: char) -> Result<Self, TokenError> {
        match c.to_ascii_lowercase() {
            'q' => Ok(Promotion::Queen),
            'r' => Ok(Promotion::Rook),
            'n' => Ok(Promotion::Knight),
            'b' => Ok(Promotion::Bishop),
            other => Err(TokenError::Promotion(other)),
        }
    }

    fn as_char(self) -> char {
        match self {
            Promotion::Queen => 'q',
            Promotion::Rook => 'r',
            Promotion::Knight => 'n',
            Promotion::Bishop => 'b',
        }
    }
}

/// A parsed move token: origin square, destination square, optional promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveToken {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl MoveToken {
    /// Parses a bare 4–5 character token such as `"e2e4"` or `"a7a8q"`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TooShort`] for tokens under four characters and
    /// the per-component errors otherwise. Trailing characters beyond the
    /// fifth are rejected as a malformed promotion suffix.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 4 {
            return Err(TokenError::TooShort(token.to_string()));
        }

        let from = Square::from_chars(chars[0], chars[1])?;
        let to = Square::from_chars(chars[2], chars[3])?;
        let promotion = match chars.len() {
            4 => None,
            5 => Some(Promotion::from_char(chars[4])?),
            // A longer string is not a single token; the caller should have
            // used `extract_move_token` on free-form text instead.
            _ => return Err(TokenError::Promotion(chars[5])),
        };

        Ok(Self { from, to, promotion })
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for MoveToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveToken::parse(s)
    }
}

/// Finds the first move token embedded anywhere in free-form text.
///
/// The match is case-normalised to lowercase before parsing. Returns `None`
/// when the text contains no token; a message like `"I think Nf3 looks fine"`
/// has no file-rank-file-rank run and is silently skipped by callers.
pub fn extract_move_token(text: &str) -> Option<MoveToken> {
    let matched = token_pattern().find(text)?;
    let normalized = matched.as_str().to_ascii_lowercase();
    // The pattern only admits in-range characters, so parsing cannot fail.
    MoveToken::parse(&normalized).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn square(s: &str) -> Square {
        s.parse().unwrap()
    }

    // ── MoveToken::parse ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_plain_move() {
        // Arrange / Act
        let token = MoveToken::parse("e2e4").unwrap();

        // Assert
        assert_eq!(token.from, square("e2"));
        assert_eq!(token.to, square("e4"));
        assert_eq!(token.promotion, None);
    }

    #[test]
    fn test_parse_promotion_move() {
        let token = MoveToken::parse("a7a8q").unwrap();
        assert_eq!(token.from, square("a7"));
        assert_eq!(token.to, square("a8"));
        assert_eq!(token.promotion, Some(Promotion::Queen));
    }

    #[test]
    fn test_parse_rejects_short_token() {
        assert_eq!(
            MoveToken::parse("e2e"),
            Err(TokenError::TooShort("e2e".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_square() {
        assert!(matches!(MoveToken::parse("z2e4"), Err(TokenError::Square(_))));
        assert!(matches!(MoveToken::parse("e9e4"), Err(TokenError::Square(_))));
    }

    #[test]
    fn test_parse_rejects_bad_promotion_letter() {
        assert_eq!(MoveToken::parse("e7e8k"), Err(TokenError::Promotion('k')));
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["e2e4", "a7a8q", "h2h1n"] {
            let token = MoveToken::parse(text).unwrap();
            assert_eq!(token.to_string(), text);
        }
    }

    // ── extract_move_token ────────────────────────────────────────────────────

    #[test]
    fn test_extract_finds_token_in_surrounding_text() {
        // Arrange / Act
        let token = extract_move_token("Bot move: e2e4").expect("token must be found");

        // Assert
        assert_eq!(token.to_string(), "e2e4");
    }

    #[test]
    fn test_extract_returns_none_without_coordinate_pair() {
        // "Nf3" is algebraic shorthand, not a file-rank-file-rank run.
        assert_eq!(extract_move_token("I think Nf3 looks fine"), None);
    }

    #[test]
    fn test_extract_keeps_promotion_suffix() {
        let token = extract_move_token("promoting now: e7e8q!").unwrap();
        assert_eq!(token.to_string(), "e7e8q");
    }

    #[test]
    fn test_extract_normalises_case() {
        let token = extract_move_token("E2E4").unwrap();
        assert_eq!(token.to_string(), "e2e4");
    }

    #[test]
    fn test_extract_takes_first_of_several_tokens() {
        let token = extract_move_token("candidates: d2d4 or g1f3mm e2e4").unwrap();
        assert_eq!(token.to_string(), "d2d4");
    }

    #[test]
    fn test_extract_returns_none_for_empty_text() {
        assert_eq!(extract_move_token(""), None);
    }
}
