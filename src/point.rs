// This file is part of the sgf-reader library.
// Copyright (C) 2025 The sgf-reader developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Points on the board and their textual encodings.
//!
//! SGF encodes a point as two letters, column first, counting rows from the
//! top. `a`..`z` cover indexes 0 to 25 and `A`..`Z` indexes 26 to 51, which
//! limits boards to [`MAX_SIZE`]. [`GamePoint`] counts rows from the bottom,
//! so decoding mirrors the second letter.
//!
//! Some writers use the human-readable notation instead (`C3`, column
//! letters skipping `I`, rows numbered from 1 at the bottom). It does not
//! depend on the board size and is accepted as a fallback.

use std::{cmp::max, cmp::min, collections::BTreeSet, error::Error, fmt};

use arrayvec::ArrayString;

/// Largest board size that can be encoded in SGF.
pub const MAX_SIZE: u8 = 52;

/// Largest board size that can be encoded in human-readable notation.
pub const MAX_HUMAN_SIZE: u8 = 25;

/// Board size assumed by SGF when a game does not specify one.
pub const DEFAULT_SIZE: u8 = 19;

/// An intersection on the board.
///
/// `x` counts columns from the left and `y` rows from the bottom, both
/// starting at 0.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct GamePoint {
    x: u8,
    y: u8,
}

impl GamePoint {
    #[inline]
    pub const fn new(x: u8, y: u8) -> GamePoint {
        GamePoint { x, y }
    }

    #[inline]
    pub const fn x(self) -> u8 {
        self.x
    }

    #[inline]
    pub const fn y(self) -> u8 {
        self.y
    }

    #[inline]
    pub const fn is_on_board(self, size: u8) -> bool {
        self.x < size && self.y < size
    }

    /// Encodes the point as SGF coordinates for a board of the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use sgf_reader::GamePoint;
    ///
    /// assert_eq!(GamePoint::new(4, 4).to_sgf(9).as_str(), "ee");
    /// assert_eq!(GamePoint::new(0, 0).to_sgf(19).as_str(), "as");
    /// ```
    pub fn to_sgf(self, size: u8) -> ArrayString<2> {
        debug_assert!(self.is_on_board(size));
        let mut s = ArrayString::new();
        s.push(letter(self.x));
        s.push(letter(size.saturating_sub(self.y + 1)));
        s
    }
}

impl fmt::Display for GamePoint {
    /// Human-readable notation, like `C3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.x < MAX_HUMAN_SIZE {
            let column = if self.x >= 8 { self.x + 1 } else { self.x };
            write!(f, "{}{}", char::from(b'A' + column), u32::from(self.y) + 1)
        } else {
            write!(f, "{}-{}", u32::from(self.x) + 1, u32::from(self.y) + 1)
        }
    }
}

/// Result of decoding an SGF point value.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Decoded {
    /// A point on the board.
    Point(GamePoint),
    /// An empty value, or `tt` on boards up to 19x19.
    Pass,
    /// A pass written as the point just outside the top right corner, like
    /// `jj` on 9x9. Not standard, but used by some programs.
    NonStandardPass,
}

impl Decoded {
    pub fn point(self) -> Option<GamePoint> {
        match self {
            Decoded::Point(p) => Some(p),
            Decoded::Pass | Decoded::NonStandardPass => None,
        }
    }
}

/// Error when parsing an invalid point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParsePointError {
    /// Neither SGF nor human-readable notation.
    Invalid(String),
    /// Well-formed, but not on the board.
    OutsideBoard { coords: String, size: u8 },
}

impl fmt::Display for ParsePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePointError::Invalid(s) => write!(f, "Invalid coordinates \"{s}\""),
            ParsePointError::OutsideBoard { coords, size } => {
                write!(f, "Coordinates \"{coords}\" outside board size {size}")
            }
        }
    }
}

impl Error for ParsePointError {}

fn letter(index: u8) -> char {
    if index < 26 {
        char::from(b'a' + index)
    } else {
        char::from(b'A' + (index - 26))
    }
}

fn letter_index(ch: u8) -> Option<u8> {
    match ch {
        b'a'..=b'z' => Some(ch - b'a'),
        b'A'..=b'Z' => Some(ch - b'A' + 26),
        _ => None,
    }
}

/// Decodes an SGF point value on a board of the given size.
///
/// Values that are not two letters are tried as human-readable notation.
///
/// # Examples
///
/// ```
/// use sgf_reader::{point::{self, Decoded}, GamePoint};
///
/// assert_eq!(point::parse_sgf("ee", 9), Ok(Decoded::Point(GamePoint::new(4, 4))));
/// assert_eq!(point::parse_sgf("tt", 19), Ok(Decoded::Pass));
/// assert_eq!(point::parse_sgf("jj", 9), Ok(Decoded::NonStandardPass));
/// assert_eq!(point::parse_sgf("C3", 9), Ok(Decoded::Point(GamePoint::new(2, 2))));
/// assert!(point::parse_sgf("zz", 9).is_err());
/// ```
///
/// # Errors
///
/// Returns [`ParsePointError`] if the value is in neither notation or does
/// not lie on the board.
pub fn parse_sgf(s: &str, size: u8) -> Result<Decoded, ParsePointError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Decoded::Pass);
    }

    let bytes = s.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
        return match parse_human(s, MAX_HUMAN_SIZE) {
            Ok(Some(p)) if p.is_on_board(size) => Ok(Decoded::Point(p)),
            Ok(Some(_)) => Err(ParsePointError::OutsideBoard {
                coords: s.to_owned(),
                size,
            }),
            Ok(None) => Ok(Decoded::Pass),
            Err(_) => Err(ParsePointError::Invalid(s.to_owned())),
        };
    }

    // Upper case letters only carry meaning on boards larger than 26x26.
    // Old files use them interchangeably with lower case.
    let (c0, c1) = if size <= 26 {
        (bytes[0].to_ascii_lowercase(), bytes[1].to_ascii_lowercase())
    } else {
        (bytes[0], bytes[1])
    };

    if c0 == b't' && c1 == b't' && size <= 19 {
        return Ok(Decoded::Pass);
    }

    let (Some(x), Some(row)) = (letter_index(c0), letter_index(c1)) else {
        return Err(ParsePointError::Invalid(s.to_owned()));
    };
    let x = i32::from(x);
    let y = i32::from(size) - i32::from(row) - 1;
    let n = i32::from(size);

    if 0 <= x && x < n && 0 <= y && y < n {
        // Both are in 0..size here, so they fit.
        Ok(Decoded::Point(GamePoint::new(x as u8, y as u8)))
    } else if x == n && y == -1 {
        Ok(Decoded::NonStandardPass)
    } else {
        Err(ParsePointError::OutsideBoard {
            coords: s.to_owned(),
            size,
        })
    }
}

/// Parses human-readable notation like `C3`, or `pass`.
///
/// # Errors
///
/// Returns [`ParsePointError::Invalid`] if the value is malformed or does not
/// lie on a board of the given size.
pub fn parse_human(s: &str, size: u8) -> Result<Option<GamePoint>, ParsePointError> {
    let trimmed = s.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower == "pass" {
        return Ok(None);
    }

    let invalid = || ParsePointError::Invalid(trimmed.to_owned());

    let bytes = lower.as_bytes();
    let (&column, row) = bytes.split_first().ok_or_else(invalid)?;
    if !column.is_ascii_lowercase() || column == b'i' || row.is_empty() {
        return Err(invalid());
    }
    let x = if column > b'i' {
        column - b'a' - 1
    } else {
        column - b'a'
    };
    let row: u32 = btoi::btou(row).map_err(|_| invalid())?;
    if row == 0 || row > u32::from(size) || x >= size {
        return Err(invalid());
    }

    Ok(Some(GamePoint::new(x, (row - 1) as u8)))
}

/// Expands a compressed rectangle of points, given by two opposite corners.
///
/// # Examples
///
/// ```
/// use sgf_reader::{point, GamePoint};
///
/// let points = point::range(GamePoint::new(0, 0), GamePoint::new(1, 2));
/// assert_eq!(points.len(), 6);
/// assert!(points.contains(&GamePoint::new(1, 1)));
/// ```
pub fn range(a: GamePoint, b: GamePoint) -> BTreeSet<GamePoint> {
    let mut points = BTreeSet::new();
    for x in min(a.x, b.x)..=max(a.x, b.x) {
        for y in min(a.y, b.y)..=max(a.y, b.y) {
            points.insert(GamePoint::new(x, y));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_sizes() {
        for size in 1..=MAX_SIZE {
            for x in 0..size {
                for y in 0..size {
                    let p = GamePoint::new(x, y);
                    let encoded = p.to_sgf(size);
                    assert_eq!(
                        parse_sgf(&encoded, size),
                        Ok(Decoded::Point(p)),
                        "size {size}, {encoded}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_mirrored_rows() {
        assert_eq!(parse_sgf("aa", 19), Ok(Decoded::Point(GamePoint::new(0, 18))));
        assert_eq!(parse_sgf("as", 19), Ok(Decoded::Point(GamePoint::new(0, 0))));
    }

    #[test]
    fn test_pass() {
        assert_eq!(parse_sgf("", 19), Ok(Decoded::Pass));
        assert_eq!(parse_sgf("  ", 9), Ok(Decoded::Pass));
        assert_eq!(parse_sgf("tt", 9), Ok(Decoded::Pass));
        assert_eq!(parse_sgf("TT", 19), Ok(Decoded::Pass));
        assert_eq!(parse_sgf("pass", 19), Ok(Decoded::Pass));
    }

    #[test]
    fn test_tt_on_large_boards() {
        assert_eq!(parse_sgf("tt", 20), Ok(Decoded::Point(GamePoint::new(19, 0))));
        assert_eq!(parse_sgf("tt", 21), Ok(Decoded::Point(GamePoint::new(19, 1))));
        assert_eq!(parse_sgf("tt", 19).map(Decoded::point), Ok(None));
    }

    #[test]
    fn test_non_standard_pass() {
        assert_eq!(parse_sgf("jj", 9), Ok(Decoded::NonStandardPass));
        assert_eq!(parse_sgf("ii", 9), Ok(Decoded::Point(GamePoint::new(8, 0))));
        assert_eq!(parse_sgf("ji", 9), Err(ParsePointError::OutsideBoard {
            coords: "ji".to_owned(),
            size: 9,
        }));
    }

    #[test]
    fn test_large_boards() {
        assert_eq!(parse_sgf("Aa", 52), Ok(Decoded::Point(GamePoint::new(26, 51))));
        assert_eq!(parse_sgf("aZ", 52), Ok(Decoded::Point(GamePoint::new(0, 0))));
        assert_eq!(GamePoint::new(51, 0).to_sgf(52).as_str(), "ZZ");
    }

    #[test]
    fn test_invalid() {
        assert_eq!(parse_sgf("a", 19), Err(ParsePointError::Invalid("a".to_owned())));
        assert_eq!(parse_sgf("abc", 19), Err(ParsePointError::Invalid("abc".to_owned())));
        assert!(matches!(parse_sgf("I5", 19), Err(ParsePointError::Invalid(_))));
    }

    #[test]
    fn test_human() {
        assert_eq!(parse_human("A1", 19), Ok(Some(GamePoint::new(0, 0))));
        assert_eq!(parse_human("j10", 19), Ok(Some(GamePoint::new(8, 9))));
        assert_eq!(parse_human("T19", 19), Ok(Some(GamePoint::new(18, 18))));
        assert_eq!(parse_human("PASS", 19), Ok(None));
        assert!(parse_human("T20", 19).is_err());
        assert!(parse_human("A0", 19).is_err());
        assert_eq!(parse_sgf("T19", 9), Err(ParsePointError::OutsideBoard {
            coords: "T19".to_owned(),
            size: 9,
        }));
    }

    #[test]
    fn test_display() {
        assert_eq!(GamePoint::new(0, 0).to_string(), "A1");
        assert_eq!(GamePoint::new(8, 9).to_string(), "J10");
    }

    #[test]
    fn test_range() {
        let points = range(GamePoint::new(2, 3), GamePoint::new(0, 1));
        assert_eq!(points.len(), 9);
        assert!(points.contains(&GamePoint::new(0, 3)));
        assert!(points.contains(&GamePoint::new(2, 1)));
        assert_eq!(range(GamePoint::new(4, 4), GamePoint::new(4, 4)).len(), 1);
    }
}
