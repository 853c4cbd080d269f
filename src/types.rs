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

use std::{error::Error, fmt, str::FromStr, time::Duration};

use bitflags::bitflags;

use crate::{color::Color, point::GamePoint};

/// A move: a stone of the given color, or a pass if there is no point.
#[allow(missing_docs)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Move {
    pub color: Color,
    pub point: Option<GamePoint>,
}

impl Move {
    pub const fn new(color: Color, point: GamePoint) -> Move {
        Move {
            color,
            point: Some(point),
        }
    }

    pub const fn pass(color: Color) -> Move {
        Move { color, point: None }
    }

    pub const fn is_pass(self) -> bool {
        self.point.is_none()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.point {
            Some(p) => write!(f, "{} {}", self.color.char(), p),
            None => write!(f, "{} pass", self.color.char()),
        }
    }
}

/// Kind of markup attached to a point.
#[allow(missing_docs)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum MarkType {
    Circle,
    Square,
    Triangle,
    Mark,
    Select,
    TerritoryBlack,
    TerritoryWhite,
}

impl MarkType {
    pub const ALL: [MarkType; 7] = [
        MarkType::Circle,
        MarkType::Square,
        MarkType::Triangle,
        MarkType::Mark,
        MarkType::Select,
        MarkType::TerritoryBlack,
        MarkType::TerritoryWhite,
    ];

    /// The SGF property that carries this markup.
    pub const fn sgf_key(self) -> &'static str {
        match self {
            MarkType::Circle => "CR",
            MarkType::Square => "SQ",
            MarkType::Triangle => "TR",
            MarkType::Mark => "MA",
            MarkType::Select => "SL",
            MarkType::TerritoryBlack => "TB",
            MarkType::TerritoryWhite => "TW",
        }
    }

    /// Parses a mark type as named in the XML dialect.
    pub fn from_xml(s: &str) -> Option<MarkType> {
        Some(match s {
            "circle" => MarkType::Circle,
            "square" => MarkType::Square,
            "triangle" => MarkType::Triangle,
            "mark" => MarkType::Mark,
            "select" => MarkType::Select,
            _ => return None,
        })
    }

    pub const fn flag(self) -> Marks {
        match self {
            MarkType::Circle => Marks::CIRCLE,
            MarkType::Square => Marks::SQUARE,
            MarkType::Triangle => Marks::TRIANGLE,
            MarkType::Mark => Marks::MARK,
            MarkType::Select => Marks::SELECT,
            MarkType::TerritoryBlack => Marks::TERRITORY_BLACK,
            MarkType::TerritoryWhite => Marks::TERRITORY_WHITE,
        }
    }
}

bitflags! {
    /// Set of markup on a single point.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Hash)]
    pub struct Marks: u8 {
        const CIRCLE = 1;
        const SQUARE = 1 << 1;
        const TRIANGLE = 1 << 2;
        const MARK = 1 << 3;
        const SELECT = 1 << 4;
        const TERRITORY_BLACK = 1 << 5;
        const TERRITORY_WHITE = 1 << 6;
    }
}

impl Marks {
    pub fn has(self, mark: MarkType) -> bool {
        self.contains(mark.flag())
    }

    /// Iterates over the contained mark types.
    pub fn types(self) -> impl Iterator<Item = MarkType> {
        MarkType::ALL.into_iter().filter(move |m| self.has(*m))
    }
}

/// Points added to White's score.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Komi(f64);

impl Komi {
    /// # Errors
    ///
    /// Returns [`ParseKomiError`] for values that are not finite.
    pub fn new(value: f64) -> Result<Komi, ParseKomiError> {
        if value.is_finite() {
            Ok(Komi(value))
        } else {
            Err(ParseKomiError)
        }
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Tests if the komi is an integer multiple of `step`, like `0.5`.
    pub fn is_multiple_of(self, step: f64) -> bool {
        let quotient = self.0 / step;
        (quotient - quotient.round()).abs() < 1e-9
    }
}

impl fmt::Display for Komi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Error when parsing an invalid komi value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseKomiError;

impl fmt::Display for ParseKomiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid komi")
    }
}

impl Error for ParseKomiError {}

impl FromStr for Komi {
    type Err = ParseKomiError;

    /// Parses komi, also accepting a decimal comma.
    fn from_str(s: &str) -> Result<Komi, ParseKomiError> {
        let s = s.trim();
        let value: f64 = if s.contains(',') {
            s.replacen(',', ".", 1).parse()
        } else {
            s.parse()
        }
        .map_err(|_| ParseKomiError)?;
        Komi::new(value)
    }
}

/// Time control of a game.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum TimeSettings {
    /// A single allowance for the whole game.
    SuddenDeath { main: Duration },
    /// A main allowance, followed by periods of `period` in which `moves`
    /// moves must be played.
    Byoyomi {
        main: Duration,
        period: Duration,
        moves: u32,
    },
}

impl TimeSettings {
    pub const fn main(&self) -> Duration {
        match *self {
            TimeSettings::SuddenDeath { main } | TimeSettings::Byoyomi { main, .. } => main,
        }
    }

    pub const fn period(&self) -> Option<Duration> {
        match *self {
            TimeSettings::SuddenDeath { .. } => None,
            TimeSettings::Byoyomi { period, .. } => Some(period),
        }
    }

    pub const fn moves(&self) -> Option<u32> {
        match *self {
            TimeSettings::SuddenDeath { .. } => None,
            TimeSettings::Byoyomi { moves, .. } => Some(moves),
        }
    }

    pub const fn is_byoyomi(&self) -> bool {
        matches!(self, TimeSettings::Byoyomi { .. })
    }
}

fn fmt_duration(f: &mut fmt::Formatter<'_>, d: Duration) -> fmt::Result {
    let secs = d.as_secs();
    if d.subsec_millis() != 0 {
        write!(f, "{} s", d.as_secs_f64())
    } else if secs != 0 && secs % 60 == 0 {
        write!(f, "{} min", secs / 60)
    } else {
        write!(f, "{secs} s")
    }
}

impl fmt::Display for TimeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeSettings::SuddenDeath { main } => fmt_duration(f, main),
            TimeSettings::Byoyomi {
                main,
                period,
                moves,
            } => {
                fmt_duration(f, main)?;
                f.write_str(" + ")?;
                fmt_duration(f, period)?;
                write!(f, " / {moves} moves")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_komi() {
        assert_eq!("6.5".parse::<Komi>().map(Komi::value), Ok(6.5));
        assert_eq!(" 0,5 ".parse::<Komi>().map(Komi::value), Ok(0.5));
        assert_eq!("-7".parse::<Komi>().map(Komi::value), Ok(-7.0));
        assert!("abc".parse::<Komi>().is_err());
        assert!("".parse::<Komi>().is_err());
        assert!("inf".parse::<Komi>().is_err());
    }

    #[test]
    fn test_komi_multiple() {
        assert!(Komi(6.5).is_multiple_of(0.5));
        assert!(Komi(-3.0).is_multiple_of(0.5));
        assert!(!Komi(6.3).is_multiple_of(0.5));
    }

    #[test]
    fn test_marks() {
        let marks = MarkType::Circle.flag() | MarkType::TerritoryWhite.flag();
        assert!(marks.has(MarkType::Circle));
        assert!(!marks.has(MarkType::Square));
        assert_eq!(
            marks.types().collect::<Vec<_>>(),
            [MarkType::Circle, MarkType::TerritoryWhite]
        );
    }

    #[test]
    fn test_time_settings_display() {
        let sudden_death = TimeSettings::SuddenDeath {
            main: Duration::from_secs(300),
        };
        assert_eq!(sudden_death.to_string(), "5 min");
        let byoyomi = TimeSettings::Byoyomi {
            main: Duration::ZERO,
            period: Duration::from_secs(30),
            moves: 5,
        };
        assert_eq!(byoyomi.to_string(), "0 s + 30 s / 5 moves");
        assert_eq!(byoyomi.moves(), Some(5));
    }

    #[test]
    fn test_move_display() {
        assert_eq!(Move::new(Color::Black, GamePoint::new(2, 2)).to_string(), "B C3");
        assert_eq!(Move::pass(Color::White).to_string(), "W pass");
    }
}
