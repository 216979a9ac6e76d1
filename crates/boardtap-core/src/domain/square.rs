//! Chess square domain entity.
//!
//! A square is addressed by a file letter (`a`–`h`, left to right from
//! White's side) and a rank digit (`1`–`8`, bottom to top). Construction
//! validates both components, so a `Square` value is always in range.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur when parsing a square token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SquareError {
    /// The token was not exactly two characters long.
    #[error("square token must be two characters, got {0:?}")]
    Length(String),

    /// The file character was outside `a`–`h`.
    #[error("file must be a letter a-h, got {0:?}")]
    File(char),

    /// The rank character was outside `1`–`8`.
    #[error("rank must be a digit 1-8, got {0:?}")]
    Rank(char),
}

/// One of the 64 board cells, stored as zero-based file and rank indices.
///
/// `file_index` 0 is file `a`; `rank_index` 0 is rank `1` (the bottom row
/// from White's point of view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    file_index: u8,
    rank_index: u8,
}

impl Square {
    /// Creates a square from zero-based indices.
    ///
    /// Returns `None` when either index is outside `0..8`.
    pub fn from_indices(file_index: u8, rank_index: u8) -> Option<Self> {
        if file_index < 8 && rank_index < 8 {
            Some(Self { file_index, rank_index })
        } else {
            None
        }
    }

    /// Creates a square from a file letter and rank digit.
    ///
    /// Input is case-insensitive: `E`/`e` both address the fifth file.
    ///
    /// # Errors
    ///
    /// Returns [`SquareError::File`] or [`SquareError::Rank`] when a
    /// character is out of range.
    pub fn from_chars(file: char, rank: char) -> Result<Self, SquareError> {
        let file = file.to_ascii_lowercase();
        if !('a'..='h').contains(&file) {
            return Err(SquareError::File(file));
        }
        if !('1'..='8').contains(&rank) {
            return Err(SquareError::Rank(rank));
        }
        Ok(Self {
            file_index: file as u8 - b'a',
            rank_index: rank as u8 - b'1',
        })
    }

    /// Zero-based file index (0 = file `a`).
    pub fn file_index(&self) -> u8 {
        self.file_index
    }

    /// Zero-based rank index (0 = rank `1`, the bottom row).
    pub fn rank_index(&self) -> u8 {
        self.rank_index
    }

    /// The file letter, `a`–`h`.
    pub fn file_char(&self) -> char {
        (b'a' + self.file_index) as char
    }

    /// The rank digit, `1`–`8`.
    pub fn rank_char(&self) -> char {
        (b'1' + self.rank_index) as char
    }

    /// Iterates over all 64 squares in file-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|file_index| {
            (0..8u8).map(move |rank_index| Square { file_index, rank_index })
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = SquareError;

    /// Parses a two-character token such as `"e2"`.
    ///
    /// # Errors
    ///
    /// Returns [`SquareError::Length`] for tokens that are not exactly two
    /// characters, and the per-character errors otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => Square::from_chars(file, rank),
            _ => Err(SquareError::Length(s.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
