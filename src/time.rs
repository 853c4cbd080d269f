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

//! Time control values.
//!
//! FF4 defines `TM` as a number of seconds and `OT` as free text. Older
//! files use other notations for `TM` and describe overtime with the FF3
//! properties `OP` (period length) and `OM` (moves per period). The known
//! variants are parsed here and merged into one [`TimeSettings`] per node.

use std::{sync::LazyLock, time::Duration};

use regex::Regex;

use crate::types::TimeSettings;

static HOURS_MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d\d)$").expect("valid hours-minutes regex")
});

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:h|hr|hrs|hours?)$").expect("valid hours regex")
});

static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:m|min|mins|minutes?)$").expect("valid minutes regex")
});

static OVERTIME_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s*/\s*(\d+(?:\.\d+)?)(?:\s*canadian)?$")
        .expect("valid slash overtime regex")
});

static OVERTIME_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+)\s*moves?\s*/\s*(\d+(?:\.\d+)?)\s*(sec|secs|seconds?|min|mins|minutes?)$",
    )
    .expect("valid worded overtime regex")
});

/// Overtime periods: `moves` moves must be played in each `period`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Overtime {
    pub period: Duration,
    pub moves: u32,
}

/// Parses a non-negative real number of seconds.
pub fn parse_seconds(s: &str) -> Option<Duration> {
    let secs: f64 = s.trim().parse().ok()?;
    if secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

fn scaled(number: &str, factor: f64) -> Option<Duration> {
    let number: f64 = number.parse().ok()?;
    Duration::try_from_secs_f64(number * factor).ok()
}

/// Parses a main time allowance.
///
/// Accepts seconds as a real number, `h:mm`, and values with an hour or
/// minute unit.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sgf_reader::time::parse_time;
///
/// assert_eq!(parse_time("300"), Some(Duration::from_secs(300)));
/// assert_eq!(parse_time("1:30"), Some(Duration::from_secs(5400)));
/// assert_eq!(parse_time("2 hours"), Some(Duration::from_secs(7200)));
/// assert_eq!(parse_time("45 min"), Some(Duration::from_secs(2700)));
/// assert_eq!(parse_time("soon"), None);
/// ```
pub fn parse_time(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(d) = parse_seconds(s) {
        return Some(d);
    }
    if let Some(caps) = HOURS_MINUTES_RE.captures(s) {
        let hours: u64 = caps[1].parse().ok()?;
        let minutes: u64 = caps[2].parse().ok()?;
        let secs = hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?;
        return Some(Duration::from_secs(secs));
    }
    if let Some(caps) = HOURS_RE.captures(s) {
        return scaled(&caps[1], 3600.0);
    }
    if let Some(caps) = MINUTES_RE.captures(s) {
        return scaled(&caps[1], 60.0);
    }
    None
}

/// Parses overtime settings, like `5/60`, `5/60 Canadian` or
/// `25 moves / 10 min`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sgf_reader::time::{parse_overtime, Overtime};
///
/// assert_eq!(
///     parse_overtime("5/60"),
///     Some(Overtime { period: Duration::from_secs(60), moves: 5 })
/// );
/// assert_eq!(
///     parse_overtime("25 moves / 10 min"),
///     Some(Overtime { period: Duration::from_secs(600), moves: 25 })
/// );
/// assert_eq!(parse_overtime("3x30 byo-yomi"), None);
/// ```
pub fn parse_overtime(s: &str) -> Option<Overtime> {
    let s = s.trim();
    let (moves, period) = if let Some(caps) = OVERTIME_SLASH_RE.captures(s) {
        (caps[1].parse().ok()?, scaled(&caps[2], 1.0)?)
    } else if let Some(caps) = OVERTIME_WORDS_RE.captures(s) {
        let factor = if caps[3].to_ascii_lowercase().starts_with('m') {
            60.0
        } else {
            1.0
        };
        (caps[1].parse().ok()?, scaled(&caps[2], factor)?)
    } else {
        return None;
    };
    Some(Overtime { period, moves })
}

/// Time related properties of a node, collected until the node is complete.
#[derive(Default, Debug)]
pub(crate) struct TimeBuffer {
    /// `TM`
    pub main: Option<Duration>,
    /// `OP`
    pub period: Option<Duration>,
    /// `OM`
    pub moves: Option<i64>,
    /// `OT`
    pub overtime: Option<Overtime>,
    /// `OP` or `OM` was malformed.
    pub legacy_invalid: bool,
}

impl TimeBuffer {
    fn legacy_overtime(&self) -> Option<Overtime> {
        if self.legacy_invalid {
            return None;
        }
        let period = self.period.filter(|p| !p.is_zero())?;
        let moves = self.moves.filter(|m| *m > 0)?;
        Some(Overtime {
            period,
            moves: u32::try_from(moves).ok()?,
        })
    }

    /// Merges the collected values.
    ///
    /// Overtime from `OT` takes precedence over `OP` and `OM`. Without
    /// complete overtime, a positive main time yields sudden death.
    pub fn settings(&self) -> Option<TimeSettings> {
        let main = self.main.filter(|m| !m.is_zero());
        let overtime = self
            .overtime
            .filter(|o| !o.period.is_zero() && o.moves > 0)
            .or_else(|| self.legacy_overtime());
        match (main, overtime) {
            (Some(main), None) => Some(TimeSettings::SuddenDeath { main }),
            (main, Some(Overtime { period, moves })) => Some(TimeSettings::Byoyomi {
                main: main.unwrap_or(Duration::ZERO),
                period,
                moves,
            }),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("0"), Some(Duration::ZERO));
        assert_eq!(parse_time(" 90.5 "), Some(Duration::from_millis(90_500)));
        assert_eq!(parse_time("0:45"), Some(secs(2700)));
        assert_eq!(parse_time("1h"), Some(secs(3600)));
        assert_eq!(parse_time("1.5 hr"), Some(secs(5400)));
        assert_eq!(parse_time("10 Minutes"), Some(secs(600)));
        assert_eq!(parse_time("-5"), None);
        assert_eq!(parse_time("1:5"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_parse_time_overflow() {
        assert_eq!(parse_time("5124095576030431:99"), None);
        assert_eq!(
            parse_time("5124095576030431:00"),
            Some(secs(5_124_095_576_030_431 * 3600))
        );
        assert_eq!(parse_time("5124095576030432:00"), None);
        assert_eq!(parse_time("99999999999999999999:00"), None);
    }

    #[test]
    fn test_parse_overtime() {
        assert_eq!(
            parse_overtime("25/600 Canadian"),
            Some(Overtime {
                period: secs(600),
                moves: 25
            })
        );
        assert_eq!(
            parse_overtime("1 move / 30 sec"),
            Some(Overtime {
                period: secs(30),
                moves: 1
            })
        );
        assert_eq!(parse_overtime("5/"), None);
    }

    #[test]
    fn test_sudden_death() {
        let buffer = TimeBuffer {
            main: Some(secs(300)),
            ..TimeBuffer::default()
        };
        assert_eq!(
            buffer.settings(),
            Some(TimeSettings::SuddenDeath { main: secs(300) })
        );
    }

    #[test]
    fn test_byoyomi_without_main_time() {
        let buffer = TimeBuffer {
            main: Some(Duration::ZERO),
            overtime: parse_overtime("5/60"),
            ..TimeBuffer::default()
        };
        assert_eq!(
            buffer.settings(),
            Some(TimeSettings::Byoyomi {
                main: Duration::ZERO,
                period: secs(60),
                moves: 5
            })
        );
    }

    #[test]
    fn test_legacy_overtime() {
        let buffer = TimeBuffer {
            main: Some(secs(600)),
            period: Some(secs(30)),
            moves: Some(10),
            ..TimeBuffer::default()
        };
        assert_eq!(
            buffer.settings(),
            Some(TimeSettings::Byoyomi {
                main: secs(600),
                period: secs(30),
                moves: 10
            })
        );
    }

    #[test]
    fn test_incomplete_overtime() {
        let buffer = TimeBuffer {
            main: Some(secs(600)),
            moves: Some(10),
            ..TimeBuffer::default()
        };
        assert_eq!(
            buffer.settings(),
            Some(TimeSettings::SuddenDeath { main: secs(600) })
        );

        let buffer = TimeBuffer {
            moves: Some(10),
            ..TimeBuffer::default()
        };
        assert_eq!(buffer.settings(), None);
    }

    #[test]
    fn test_invalid_legacy_overtime() {
        let buffer = TimeBuffer {
            main: Some(secs(600)),
            period: Some(secs(30)),
            moves: Some(10),
            legacy_invalid: true,
            ..TimeBuffer::default()
        };
        assert_eq!(
            buffer.settings(),
            Some(TimeSettings::SuddenDeath { main: secs(600) })
        );
    }

    #[test]
    fn test_nothing() {
        assert_eq!(TimeBuffer::default().settings(), None);
    }
}
