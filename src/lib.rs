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

//! A tolerant reader for Go game records.
//!
//! Reads [SGF](https://www.red-bean.com/sgf/) files of all format versions
//! and Jago's XML format into a [`GameTree`]. Malformed but recoverable
//! input does not abort reading: the problems are collected as
//! [`Warnings`] instead.
//!
//! # Examples
//!
//! Read a game and walk the main variation:
//!
//! ```
//! use sgf_reader::{Color, SgfReader};
//!
//! let sgf = b"(;GM[1]FF[4]SZ[19]PB[Honinbo Shusaku]KM[0]
//!             ;B[qd];W[dc];B[pq];W[oc])";
//!
//! let reader = SgfReader::from_bytes(sgf)?;
//! let tree = reader.tree();
//! let root = tree.root();
//! assert_eq!(
//!     tree.game_info(root).player.get(Color::Black).as_deref(),
//!     Some("Honinbo Shusaku")
//! );
//!
//! let moves: Vec<_> = tree
//!     .main_variation()
//!     .filter_map(|id| tree[id].mv)
//!     .map(|mv| mv.to_string())
//!     .collect();
//! assert_eq!(moves, ["B R16", "W D17", "B Q3", "W P17"]);
//! assert!(reader.warnings().is_empty());
//! # Ok::<_, sgf_reader::SgfError>(())
//! ```
//!
//! Recoverable problems become warnings:
//!
//! ```
//! use sgf_reader::SgfReader;
//!
//! let reader = SgfReader::from_bytes(b"junk (;C[]HA[x];B[aa]")?;
//! let warnings: Vec<_> = reader.warnings().iter().collect();
//! assert_eq!(
//!     warnings,
//!     [
//!         "Extra text before SGF tree",
//!         "Game tree not closed",
//!         "Invalid handicap value",
//!     ]
//! );
//! # Ok::<_, sgf_reader::SgfError>(())
//! ```
//!
//! # Feature flags
//!
//! * `serde`: Implements [`serde::Serialize`](https://docs.rs/serde/1/serde/trait.Serialize.html)
//!   and [`serde::Deserialize`](https://docs.rs/serde/1/serde/trait.Deserialize.html) for
//!   the game tree and its parts.
//! * `arbitrary`: Implements
//!   [`arbitrary::Arbitrary`](https://docs.rs/arbitrary/1/arbitrary/trait.Arbitrary.html)
//!   for points, colors and moves.

#![doc(html_root_url = "https://docs.rs/sgf-reader/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docs_rs, feature(doc_auto_cfg))]

mod buffer;
mod color;
mod config;
mod errors;
mod game;
mod interpret;
mod lexer;
mod progress;
mod props;
mod reader;
mod types;
mod xml;

pub mod point;
pub mod time;

pub use color::{ByColor, ByGoColor, Color, GoColor, ParseColorError};
pub use config::Config;
pub use errors::{ErrorKind, SgfError, Warnings};
pub use game::{GameInfo, GameTree, InfoField, MainVariation, Node, NodeId, PlayerField};
pub use point::{GamePoint, ParsePointError};
pub use progress::ProgressShow;
pub use props::{PropertyIndexError, PropertyTable};
pub use reader::{Result, SgfReader};
pub use types::{Komi, MarkType, Marks, Move, ParseKomiError, TimeSettings};
pub use xml::XmlReader;
