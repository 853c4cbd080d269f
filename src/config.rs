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

use encoding_rs::{Encoding, WINDOWS_1252};

/// Options for reading a game record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Config {
    /// Charset of SGF input until a `CA` property in the root node names
    /// another one.
    ///
    /// Defaults to ISO-8859-1, as required by FF4. Decoding uses the
    /// WHATWG mapping, which treats it as windows-1252.
    pub default_charset: &'static Encoding,
    /// Whether a `CA` property may restart reading with the declared
    /// charset. Only effective for sources that can be read again.
    ///
    /// Defaults to `true`.
    pub honor_charset: bool,
    /// File name used in error messages.
    ///
    /// Defaults to `None`. Set automatically when opening a file.
    pub file_name: Option<String>,
    /// Total size of the input in bytes, used for progress reports.
    ///
    /// Defaults to `None`, which reports 100% for every step.
    pub size_hint: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_charset: WINDOWS_1252,
            honor_charset: true,
            file_name: None,
            size_hint: None,
        }
    }
}
