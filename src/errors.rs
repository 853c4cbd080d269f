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

use std::{collections::BTreeSet, error::Error, fmt, io};

use tracing::trace;

use crate::point::ParsePointError;

/// Error when reading a game record fails.
///
/// Carries the position of the failure, if known.
#[derive(Debug)]
pub struct SgfError {
    /// Name of the file, if reading from a named file.
    pub file: Option<String>,
    /// 1-based line number.
    pub line: Option<u64>,
    /// 1-based column, reported by the XML reader.
    pub column: Option<u64>,
    #[allow(missing_docs)]
    pub kind: ErrorKind,
}

impl SgfError {
    pub(crate) fn new(kind: ErrorKind) -> SgfError {
        SgfError {
            file: None,
            line: None,
            column: None,
            kind,
        }
    }

    pub(crate) fn at_line(kind: ErrorKind, file: Option<&str>, line: u64) -> SgfError {
        SgfError {
            file: file.map(str::to_owned),
            line: Some(line),
            column: None,
            kind,
        }
    }
}

impl fmt::Display for SgfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "Line {line}:{column}: ")?,
            (Some(line), None) => match self.file {
                Some(ref file) => write!(f, "{file}:{line}: ")?,
                None => write!(f, "{line}: ")?,
            },
            (None, _) => (),
        }
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Error for SgfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

impl From<io::Error> for SgfError {
    fn from(error: io::Error) -> SgfError {
        SgfError::new(ErrorKind::Io(error))
    }
}

/// Reason for a fatal error.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O error.
    Io(io::Error),
    /// No `(;` found in the input.
    NoRootTree,
    /// A second game tree follows the first.
    MultipleTrees,
    /// The record is for another game than Go.
    NotGoGame,
    /// Unexpected token where a node should start.
    NextNodeExpected,
    /// End of input inside a property value.
    ValueIncomplete,
    /// Invalid coordinates.
    Point(ParsePointError),
    /// Invalid value for the player to move.
    InvalidColor,
    /// Malformed XML.
    Xml(quick_xml::Error),
    /// Element is not allowed inside its parent.
    IllegalChild {
        #[allow(missing_docs)]
        element: String,
        #[allow(missing_docs)]
        parent: Option<String>,
    },
    /// More than one `GoGame` element.
    MultipleGames,
    /// More than one `Nodes` element in a game.
    MultipleNodes,
    /// A `Variation` element before any node.
    VariationWithoutNode,
    /// Board size out of the supported range.
    UnsupportedBoardSize,
    /// Element content is not an integer.
    ExpectedInteger {
        #[allow(missing_docs)]
        element: String,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io(error) if error.kind() == io::ErrorKind::NotFound => {
                f.write_str("File not found.")
            }
            ErrorKind::Io(error) => write!(f, "IO error: {error}"),
            ErrorKind::NoRootTree => f.write_str("No root tree found"),
            ErrorKind::MultipleTrees => f.write_str("Multiple SGF trees not supported"),
            ErrorKind::NotGoGame => f.write_str("Not a Go game"),
            ErrorKind::NextNodeExpected => f.write_str("Next node expected"),
            ErrorKind::ValueIncomplete => f.write_str("Property value incomplete"),
            ErrorKind::Point(error) => fmt::Display::fmt(error, f),
            ErrorKind::InvalidColor => f.write_str("Invalid color value"),
            ErrorKind::Xml(error) => write!(f, "{error}"),
            ErrorKind::IllegalChild {
                element,
                parent: Some(parent),
            } => write!(f, "Element \"{element}\" cannot be child of \"{parent}\""),
            ErrorKind::IllegalChild {
                element,
                parent: None,
            } => write!(f, "Element \"{element}\" cannot be the document element"),
            ErrorKind::MultipleGames => f.write_str("Multiple games per file not supported"),
            ErrorKind::MultipleNodes => {
                f.write_str("More than one Nodes element in element GoGame")
            }
            ErrorKind::VariationWithoutNode => f.write_str("Variation without main node"),
            ErrorKind::UnsupportedBoardSize => f.write_str("Unsupported board size"),
            ErrorKind::ExpectedInteger { element } => {
                write!(f, "Expected integer in element {element}")
            }
        }
    }
}

impl Error for ErrorKind {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Point(error) => Some(error),
            ErrorKind::Xml(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(error: io::Error) -> ErrorKind {
        ErrorKind::Io(error)
    }
}

impl From<ParsePointError> for ErrorKind {
    fn from(error: ParsePointError) -> ErrorKind {
        ErrorKind::Point(error)
    }
}

impl From<quick_xml::Error> for ErrorKind {
    fn from(error: quick_xml::Error) -> ErrorKind {
        ErrorKind::Xml(error)
    }
}

/// Set of distinct warnings collected while reading a game record.
///
/// Iterates in sorted order.
#[derive(Clone, Default, Debug, Eq, PartialEq)]
pub struct Warnings {
    messages: BTreeSet<String>,
}

impl Warnings {
    pub(crate) fn add(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.messages.contains(&message) {
            trace!(%message, "warning");
            self.messages.insert(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.contains(message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// All warnings, each followed by a newline, or `None` if there are no
    /// warnings.
    pub fn to_text(&self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        let mut text = String::with_capacity(self.messages.len() * 80);
        for message in &self.messages {
            text.push_str(message);
            text.push('\n');
        }
        Some(text)
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
