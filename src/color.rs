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

use std::{error::Error, fmt, str::FromStr};

/// `Black` or `White`.
#[allow(missing_docs)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    /// Parses the value of an SGF `PL` property.
    ///
    /// Accepts `B`, `W` and the FF1 spellings `1` and `2`, ignoring case and
    /// surrounding whitespace.
    pub fn from_sgf(s: &str) -> Option<Color> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "1" => Some(Color::Black),
            "w" | "2" => Some(Color::White),
            _ => None,
        }
    }

    #[inline]
    pub fn from_black(black: bool) -> Color {
        if black {
            Color::Black
        } else {
            Color::White
        }
    }

    #[inline]
    pub fn fold<T>(self, black: T, white: T) -> T {
        match self {
            Color::Black => black,
            Color::White => white,
        }
    }

    pub fn char(self) -> char {
        self.fold('B', 'W')
    }

    /// `Black` and `White`, in this order.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fold("black", "white"))
    }
}

/// Error when parsing an invalid color name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseColorError;

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid color value")
    }
}

impl Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Color, ParseColorError> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "black" | "b" => Color::Black,
            "white" | "w" => Color::White,
            _ => return Err(ParseColorError),
        })
    }
}

/// Container with values for each [`Color`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug, Hash)]
pub struct ByColor<T> {
    pub black: T,
    pub white: T,
}

impl<T> ByColor<T> {
    #[inline]
    pub fn get(&self, color: Color) -> &T {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, color: Color) -> &mut T {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }

    #[inline]
    pub fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        predicate(&self.black) || predicate(&self.white)
    }
}

/// Color of a point in a setup: a stone of either color, or an emptied
/// point.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum GoColor {
    Black,
    White,
    Empty,
}

impl GoColor {
    pub fn stone(self) -> Option<Color> {
        match self {
            GoColor::Black => Some(Color::Black),
            GoColor::White => Some(Color::White),
            GoColor::Empty => None,
        }
    }

    /// `Black`, `White` and `Empty`, in this order.
    pub const ALL: [GoColor; 3] = [GoColor::Black, GoColor::White, GoColor::Empty];
}

impl From<Color> for GoColor {
    #[inline]
    fn from(color: Color) -> GoColor {
        color.fold(GoColor::Black, GoColor::White)
    }
}

impl fmt::Display for GoColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GoColor::Black => "black",
            GoColor::White => "white",
            GoColor::Empty => "empty",
        })
    }
}

/// Container with values for each [`GoColor`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct ByGoColor<T> {
    pub black: T,
    pub white: T,
    pub empty: T,
}

impl<T> ByGoColor<T> {
    #[inline]
    pub fn get(&self, color: GoColor) -> &T {
        match color {
            GoColor::Black => &self.black,
            GoColor::White => &self.white,
            GoColor::Empty => &self.empty,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, color: GoColor) -> &mut T {
        match color {
            GoColor::Black => &mut self.black,
            GoColor::White => &mut self.white,
            GoColor::Empty => &mut self.empty,
        }
    }

    #[inline]
    pub fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        predicate(&self.black) || predicate(&self.white) || predicate(&self.empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sgf() {
        assert_eq!(Color::from_sgf("B"), Some(Color::Black));
        assert_eq!(Color::from_sgf(" w "), Some(Color::White));
        assert_eq!(Color::from_sgf("1"), Some(Color::Black));
        assert_eq!(Color::from_sgf("2"), Some(Color::White));
        assert_eq!(Color::from_sgf("x"), None);
    }

    #[test]
    fn test_by_color() {
        let mut moves_left = ByColor::<Option<u32>>::default();
        *moves_left.get_mut(Color::Black) = Some(5);
        assert_eq!(moves_left.black, Some(5));
        assert_eq!(*moves_left.get(Color::White), None);
        assert!(moves_left.any(Option::is_some));
    }

    #[test]
    fn test_go_color() {
        assert_eq!(GoColor::from(Color::White), GoColor::White);
        assert_eq!(GoColor::Empty.stone(), None);
        assert_eq!("black".parse::<Color>(), Ok(Color::Black));
        assert_eq!(Color::White.to_string(), "white");
    }
}
