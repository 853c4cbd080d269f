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

//! Typed interpretation of SGF properties.

use std::{collections::BTreeSet, time::Duration};

use encoding_rs::{Encoding, REPLACEMENT};

use crate::{
    color::{Color, GoColor},
    errors::{ErrorKind, Warnings},
    game::{InfoField, Node, PlayerField, TreeBuilder},
    point::{self, Decoded, GamePoint, MAX_SIZE},
    props::PropertyTable,
    time::{parse_overtime, parse_time, TimeBuffer},
    types::{Komi, MarkType, Move, TimeSettings},
};

/// Effect of a property on a node.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub(crate) enum Handler {
    Move(Color),
    Setup(GoColor),
    Info(InfoField),
    PlayerInfo(PlayerField, Color),
    TimeLeft(Color),
    MovesLeft(Color),
    Comment,
    Charset,
    Mark(MarkType),
    Format,
    Game,
    Handicap,
    Komi,
    Labels,
    OvertimeMoves,
    OvertimePeriod,
    Overtime,
    ToPlay,
    Time,
    Value,
    /// Dropped without a trace.
    Discard,
}

impl Handler {
    /// Tests if the values are points, which can only be decoded once the
    /// board size is known.
    pub fn takes_points(self) -> bool {
        matches!(
            self,
            Handler::Move(_) | Handler::Setup(_) | Handler::Mark(_) | Handler::Labels
        )
    }
}

/// Looks up how a property is handled. Properties without a handler are
/// kept verbatim in [`Node::raw`].
///
/// `SZ` has no handler. It is resolved before the other properties of a
/// node, see [`board_size()`].
pub(crate) fn handler(key: &str) -> Option<Handler> {
    use Color::{Black, White};

    Some(match key {
        "AB" => Handler::Setup(GoColor::Black),
        "AE" => Handler::Setup(GoColor::Empty),
        "AN" => Handler::Info(InfoField::Annotation),
        "AP" | "GN" => Handler::Discard,
        "AW" => Handler::Setup(GoColor::White),
        "B" => Handler::Move(Black),
        "BL" => Handler::TimeLeft(Black),
        "BR" => Handler::PlayerInfo(PlayerField::Rank, Black),
        "BT" => Handler::PlayerInfo(PlayerField::Team, Black),
        "C" => Handler::Comment,
        "CA" => Handler::Charset,
        "CP" => Handler::Info(InfoField::Copyright),
        "CR" => Handler::Mark(MarkType::Circle),
        "DT" => Handler::Info(InfoField::Date),
        "FF" => Handler::Format,
        "GM" => Handler::Game,
        "HA" => Handler::Handicap,
        "KM" => Handler::Komi,
        "LB" => Handler::Labels,
        "M" | "MA" => Handler::Mark(MarkType::Mark),
        "OB" => Handler::MovesLeft(Black),
        "OM" => Handler::OvertimeMoves,
        "OP" => Handler::OvertimePeriod,
        "OT" => Handler::Overtime,
        "OW" => Handler::MovesLeft(White),
        "PB" => Handler::PlayerInfo(PlayerField::Name, Black),
        "PL" => Handler::ToPlay,
        "PW" => Handler::PlayerInfo(PlayerField::Name, White),
        "RE" => Handler::Info(InfoField::Result),
        "RO" => Handler::Info(InfoField::Round),
        "RU" => Handler::Info(InfoField::Rules),
        "SL" => Handler::Mark(MarkType::Select),
        "SO" => Handler::Info(InfoField::Source),
        "SQ" => Handler::Mark(MarkType::Square),
        "TB" => Handler::Mark(MarkType::TerritoryBlack),
        "TM" => Handler::Time,
        "TR" => Handler::Mark(MarkType::Triangle),
        "TW" => Handler::Mark(MarkType::TerritoryWhite),
        "US" => Handler::Info(InfoField::User),
        "V" => Handler::Value,
        "W" => Handler::Move(White),
        "WL" => Handler::TimeLeft(White),
        "WR" => Handler::PlayerInfo(PlayerField::Rank, White),
        "WT" => Handler::PlayerInfo(PlayerField::Team, White),
        _ => return None,
    })
}

/// Maps obsolete long property names of old files to the standard short
/// names.
pub(crate) fn canonical_name(name: &str) -> &str {
    match name {
        "ADDBLACK" => "AB",
        "ADDEMPTY" => "AE",
        "ADDWHITE" => "AW",
        "BLACK" => "B",
        "BLACKRANK" => "BR",
        "COMMENT" => "C",
        "COPYRIGHT" => "CP",
        "DATE" => "DT",
        "EVENT" => "EV",
        "GAME" => "GM",
        "HANDICAP" => "HA",
        "KOMI" => "KM",
        "PLACE" => "PC",
        "PLAYERBLACK" => "PB",
        "PLAYERWHITE" => "PW",
        "PLAYER" => "PL",
        "RESULT" => "RE",
        "ROUND" => "RO",
        "RULES" => "RU",
        "SIZE" => "SZ",
        "WHITE" => "W",
        "WHITERANK" => "WR",
        other => other,
    }
}

/// Adds a property read from the input to the table of its node.
///
/// Repeating a property with the same single value is accepted silently.
/// Otherwise the first occurrence wins and a warning is recorded.
pub(crate) fn collect_property(
    props: &mut PropertyTable,
    name: &str,
    values: Vec<String>,
    warnings: &mut Warnings,
) {
    let name = name.to_ascii_uppercase();
    if values.is_empty() {
        warnings.add(format!("Property \"{name}\" has no value"));
        return;
    }
    let key = canonical_name(&name);
    match props.values(key) {
        Some(existing) => {
            if existing.len() > 1 || values.len() > 1 || existing[0] != values[0] {
                warnings.add(format!("Duplicate property {key} in node"));
            }
        }
        None => props.put(key, values),
    }
}

/// Resolves an `SZ` property.
pub(crate) fn board_size(values: &[String], is_root: bool, warnings: &mut Warnings) -> Option<u8> {
    if !is_root {
        warnings.add("Size property not in root node ignored");
        return None;
    }
    let value = values.first().map_or("", |v| v.trim());
    // FF4 writes rectangular boards as columns:rows.
    let value = match value.split_once(':') {
        Some((columns, rows)) if columns.trim() == rows.trim() => columns.trim(),
        Some(_) => {
            warnings.add("Non-square board size not supported");
            return None;
        }
        None => value,
    };
    match btoi::btoi::<i64>(value.as_bytes()) {
        Ok(size) if (1..=i64::from(MAX_SIZE)).contains(&size) => u8::try_from(size).ok(),
        _ => {
            warnings.add("Invalid board size value");
            None
        }
    }
}

/// Outcome of [`Interpreter::apply()`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Applied {
    Done,
    /// The input must be read again with this charset.
    Restart(&'static Encoding),
}

/// Applies the properties of one node.
///
/// Time properties are buffered until [`Interpreter::finish()`], since
/// they only make sense together.
#[derive(Debug)]
pub(crate) struct Interpreter {
    board_size: u8,
    is_root: bool,
    /// Charset of the input, if a `CA` property may restart reading.
    restart_from: Option<&'static Encoding>,
    time: TimeBuffer,
}

impl Interpreter {
    pub fn new(board_size: u8, is_root: bool) -> Interpreter {
        Interpreter {
            board_size,
            is_root,
            restart_from: None,
            time: TimeBuffer::default(),
        }
    }

    /// Allows a `CA` property in the root node to request a restart, if it
    /// names another charset than `current`.
    pub fn with_restart(mut self, current: &'static Encoding) -> Interpreter {
        self.restart_from = Some(current);
        self
    }

    pub fn set_board_size(&mut self, board_size: u8) {
        self.board_size = board_size;
    }

    /// Uses `main` as main time if the node has no valid `TM` property.
    pub fn default_main_time(&mut self, main: Option<Duration>) {
        if self.time.main.is_none() {
            self.time.main = main;
        }
    }

    fn point(&self, s: &str, warnings: &mut Warnings) -> Result<Option<GamePoint>, ErrorKind> {
        Ok(match point::parse_sgf(s, self.board_size)? {
            Decoded::Point(p) => Some(p),
            Decoded::Pass => None,
            Decoded::NonStandardPass => {
                warnings.add("Non-standard pass move encoding");
                None
            }
        })
    }

    /// Decodes a list of points and compressed rectangles, skipping passes.
    fn point_list(
        &self,
        values: &[String],
        warnings: &mut Warnings,
    ) -> Result<BTreeSet<GamePoint>, ErrorKind> {
        let mut points = BTreeSet::new();
        for value in values {
            match value.split_once(':') {
                None => match self.point(value, warnings)? {
                    Some(p) => {
                        points.insert(p);
                    }
                    None => warnings.add("Point list argument contains PASS"),
                },
                Some((a, b)) => match (self.point(a, warnings)?, self.point(b, warnings)?) {
                    (Some(a), Some(b)) => points.extend(point::range(a, b)),
                    _ => warnings.add("Compressed point list contains PASS"),
                },
            }
        }
        Ok(points)
    }

    /// Applies a property to the node.
    ///
    /// # Errors
    ///
    /// Fails on invalid coordinates, an invalid `PL` value, or a `GM`
    /// property for another game.
    pub fn apply(
        &mut self,
        node: &mut Node,
        key: &str,
        values: Vec<String>,
        warnings: &mut Warnings,
    ) -> Result<Applied, ErrorKind> {
        let Some(handler) = handler(key) else {
            node.raw.put(key, values);
            return Ok(Applied::Done);
        };
        let value = values.first().map_or("", String::as_str);

        match handler {
            Handler::Move(color) => {
                node.mv = Some(Move {
                    color,
                    point: self.point(value, warnings)?,
                });
            }
            Handler::Setup(color) => {
                for p in self.point_list(&values, warnings)? {
                    node.add_stone(color, p);
                }
            }
            Handler::Info(field) => node.game_info_mut().set(field, value),
            Handler::PlayerInfo(field, color) => {
                node.game_info_mut().set_player(field, color, value)
            }
            Handler::TimeLeft(color) => {
                if let Ok(secs) = value.trim().parse::<f64>() {
                    *node.time_left.get_mut(color) = Some(secs);
                }
            }
            Handler::MovesLeft(color) => {
                if let Ok(moves) = btoi::btou::<u32>(value.trim().as_bytes()) {
                    *node.moves_left.get_mut(color) = Some(moves);
                }
            }
            Handler::Comment => node.comment = Some(value.to_owned()),
            Handler::Charset => {
                if let Some(current) = self.restart_from.filter(|_| self.is_root) {
                    let label = value.trim();
                    match Encoding::for_label(label.as_bytes()) {
                        Some(encoding) if encoding == REPLACEMENT => {
                            warnings.add(format!("Unknown character set \"{label}\""));
                        }
                        Some(encoding) if encoding != current => {
                            return Ok(Applied::Restart(encoding));
                        }
                        Some(_) => (),
                        None => {
                            warnings.add(format!("Unknown character set \"{label}\""));
                        }
                    }
                }
            }
            Handler::Mark(mark) => {
                for p in self.point_list(&values, warnings)? {
                    node.add_mark(p, mark);
                }
            }
            Handler::Format => match btoi::btoi::<i64>(value.trim().as_bytes()) {
                Ok(1..=4) => (),
                _ => warnings.add("Unknown SGF file format version"),
            },
            Handler::Game => {
                // Some files contain GM[], which is read as GM[1].
                let value = value.trim();
                if !value.is_empty() && value != "1" {
                    return Err(ErrorKind::NotGoGame);
                }
            }
            Handler::Handicap => {
                // HA[] means that the handicap is unknown.
                let value = value.trim();
                if !value.is_empty() {
                    match btoi::btoi::<i64>(value.as_bytes()) {
                        Ok(handicap) if handicap == 0 || handicap >= 2 => {
                            node.game_info_mut().handicap = u32::try_from(handicap).ok();
                        }
                        _ => warnings.add("Invalid handicap value"),
                    }
                }
            }
            Handler::Komi => {
                if !value.trim().is_empty() {
                    match value.parse::<Komi>() {
                        Ok(komi) => {
                            node.game_info_mut().komi = Some(komi);
                            if !komi.is_multiple_of(0.5) {
                                warnings.add("Komi is not a multiple of 0.5");
                            }
                        }
                        Err(_) => warnings.add("Invalid value for komi"),
                    }
                }
            }
            Handler::Labels => {
                for value in &values {
                    if let Some((p, text)) = value.split_once(':') {
                        if p.is_empty() {
                            continue;
                        }
                        if let Some(p) = self.point(p, warnings)? {
                            node.labels.insert(p, text.to_owned());
                        }
                    }
                }
            }
            Handler::OvertimeMoves => match btoi::btoi::<i64>(value.trim().as_bytes()) {
                Ok(moves) => self.time.moves = Some(moves),
                Err(_) => {
                    warnings.add("Invalid value for byoyomi moves");
                    self.time.legacy_invalid = true;
                }
            },
            Handler::OvertimePeriod => match value.trim().parse::<f64>() {
                Ok(secs) => {
                    self.time.period = Duration::try_from_secs_f64(secs.max(0.0)).ok();
                }
                Err(_) => {
                    warnings.add("Invalid value for byoyomi time");
                    self.time.legacy_invalid = true;
                }
            },
            Handler::Overtime => {
                let value = value.trim();
                if !value.is_empty() && value != "-" {
                    match parse_overtime(value) {
                        Some(overtime) => self.time.overtime = Some(overtime),
                        None => {
                            warnings.add("Overtime settings in unknown format");
                            node.raw.add("OT", value);
                        }
                    }
                }
            }
            Handler::ToPlay => {
                node.player = Some(Color::from_sgf(value).ok_or(ErrorKind::InvalidColor)?);
            }
            Handler::Time => {
                let value = value.trim();
                if !value.is_empty() && value != "-" {
                    match parse_time(value) {
                        Some(main) => self.time.main = Some(main),
                        None => {
                            warnings.add("Unknown format in time property");
                            node.raw.add("TM", value);
                        }
                    }
                }
            }
            Handler::Value => {
                if let Ok(v) = value.trim().parse::<f32>() {
                    node.value = Some(v);
                }
            }
            Handler::Discard => (),
        }
        Ok(Applied::Done)
    }

    /// Applies all properties of a table, in key order.
    pub fn apply_all(
        &mut self,
        node: &mut Node,
        props: PropertyTable,
        warnings: &mut Warnings,
    ) -> Result<Applied, ErrorKind> {
        for (key, values) in props {
            if let Applied::Restart(encoding) = self.apply(node, &key, values, warnings)? {
                return Ok(Applied::Restart(encoding));
            }
        }
        Ok(Applied::Done)
    }

    /// Time settings from the time properties seen so far.
    pub fn finish(self) -> Option<TimeSettings> {
        self.time.settings()
    }
}

/// Infers the color to play in a root node with setup stones.
///
/// White plays first in handicap games. Otherwise the color is taken from
/// the moves of the children, if they agree.
pub(crate) fn apply_root_fixes(builder: &mut TreeBuilder) {
    let root = builder.root();
    let node = builder.node(root);
    if !node.has_setup() || node.player.is_some() {
        return;
    }

    let handicap = node
        .game_info
        .as_ref()
        .and_then(|info| info.handicap)
        .is_some_and(|h| h > 0);

    let player = if handicap {
        Some(Color::White)
    } else {
        let mut colors = node
            .children()
            .iter()
            .filter_map(|child| builder.node(*child).mv.map(|m| m.color));
        match colors.next() {
            Some(first) if colors.all(|c| c == first) => Some(first),
            _ => None,
        }
    };

    builder.node_mut(root).player = player;
}
