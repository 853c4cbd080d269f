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

//! Reader for Jago's XML format.
//!
//! Accepts documents valid according to Jago's `go.dtd`, and some common
//! deviations of files found in the wild: an implicit root node, moves
//! outside of `Node` elements, points as text content instead of `at`
//! elements, and `BlackToPlay`/`WhiteToPlay` inside `Node`.

use std::{borrow::Cow, fs, io::Read, path::Path, time::Duration};

use encoding_rs::{Encoding, UTF_8};
use quick_xml::{events::Event, Reader};
use tracing::debug;

use crate::{
    color::{Color, GoColor},
    config::Config,
    errors::{ErrorKind, SgfError, Warnings},
    game::{GameInfo, GameTree, InfoField, NodeId, PlayerField, TreeBuilder},
    interpret::{canonical_name, handler, Interpreter},
    point::{parse_human, GamePoint, DEFAULT_SIZE, MAX_SIZE},
    progress::{Progress, ProgressShow},
    reader::Result,
    time::parse_time,
    types::{Komi, MarkType, Move, TimeSettings},
};

/// A game tree read from Jago's XML format, together with the warnings
/// collected while reading it.
///
/// # Examples
///
/// ```
/// use sgf_reader::{Color, GamePoint, XmlReader};
///
/// let xml = br#"<?xml version="1.0"?>
/// <Go>
///   <GoGame>
///     <Information><BoardSize>9</BoardSize></Information>
///     <Nodes>
///       <Node/>
///       <Black at="E5"/>
///     </Nodes>
///   </GoGame>
/// </Go>"#;
///
/// let reader = XmlReader::from_bytes(xml)?;
/// let tree = reader.tree();
/// assert_eq!(tree.board_size(), 9);
/// let first = tree.child(tree.root(), 0).expect("first move");
/// assert_eq!(tree[first].mv.and_then(|mv| mv.point), Some(GamePoint::new(4, 4)));
/// # Ok::<_, sgf_reader::SgfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct XmlReader {
    tree: GameTree,
    warnings: Warnings,
}

impl XmlReader {
    /// # Errors
    ///
    /// See [`XmlReader::open_with()`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<XmlReader> {
        XmlReader::open_with(path, Config::default(), None)
    }

    /// Reads a file with custom settings and optional progress reports.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid game record.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        mut config: Config,
        progress: Option<&mut dyn ProgressShow>,
    ) -> Result<XmlReader> {
        let path = path.as_ref();
        if config.file_name.is_none() {
            config.file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        let bytes = fs::read(path).map_err(|err| SgfError {
            file: config.file_name.clone(),
            ..SgfError::from(err)
        })?;
        XmlReader::from_bytes_with(&bytes, config, progress)
    }

    /// # Errors
    ///
    /// Fails on I/O errors or if the input is not a valid game record.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<XmlReader> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        XmlReader::from_bytes(&bytes)
    }

    /// # Errors
    ///
    /// See [`XmlReader::from_bytes_with()`].
    pub fn from_bytes(bytes: &[u8]) -> Result<XmlReader> {
        XmlReader::from_bytes_with(bytes, Config::default(), None)
    }

    /// Reads a document from memory.
    ///
    /// Documents declaring an encoding other than UTF-8 are transcoded and
    /// read again. [`Config::default_charset`] and
    /// [`Config::honor_charset`] only apply to SGF.
    ///
    /// # Errors
    ///
    /// Fails if the input is not well-formed XML or not a valid game record.
    pub fn from_bytes_with(
        bytes: &[u8],
        config: Config,
        progress: Option<&mut dyn ProgressShow>,
    ) -> Result<XmlReader> {
        let file = config.file_name.as_deref();
        let mut progress = Progress::new(progress, Some(config.size_hint.unwrap_or(bytes.len() as u64)));
        progress.start();

        let mut input: Cow<'_, [u8]> = match Encoding::for_bom(bytes) {
            Some((encoding, _)) if encoding != UTF_8 => {
                Cow::Owned(encoding.decode_with_bom_removal(bytes).0.into_owned().into_bytes())
            }
            Some((_, bom_len)) => Cow::Borrowed(&bytes[bom_len..]),
            None => Cow::Borrowed(bytes),
        };
        let mut transcode = true;
        loop {
            let attempt = Parser::new(&input, file).parse(&mut progress, transcode)?;
            match attempt {
                Attempt::Done(reader) => return Ok(reader),
                Attempt::Transcode(encoding) => {
                    debug!(encoding = encoding.name(), "transcoding xml input");
                    let text = encoding.decode_without_bom_handling(&input).0.into_owned();
                    input = Cow::Owned(text.into_bytes());
                    transcode = false;
                }
            }
        }
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn into_tree(self) -> GameTree {
        self.tree
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }
}

enum Attempt {
    Done(XmlReader),
    Transcode(&'static Encoding),
}

/// Elements of the vocabulary.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
enum Tag {
    AddBlack,
    AddWhite,
    Annotation,
    Application,
    Arg,
    At,
    Black,
    BlackPlayer,
    BlackRank,
    BlackTeam,
    BlackToPlay,
    BoardSize,
    Comment,
    Copyright,
    Date,
    Delete,
    Go,
    GoGame,
    Handicap,
    Information,
    Komi,
    Line,
    Mark,
    Node,
    Nodes,
    P,
    Result,
    Round,
    Rules,
    Sgf,
    Source,
    Time,
    User,
    Variation,
    White,
    WhitePlayer,
    WhiteRank,
    WhiteTeam,
    WhiteToPlay,
}

impl Tag {
    fn from_name(name: &str) -> Option<Tag> {
        Some(match name {
            "AddBlack" => Tag::AddBlack,
            "AddWhite" => Tag::AddWhite,
            "Annotation" => Tag::Annotation,
            "Application" => Tag::Application,
            "Arg" => Tag::Arg,
            "at" => Tag::At,
            "Black" => Tag::Black,
            "BlackPlayer" => Tag::BlackPlayer,
            "BlackRank" => Tag::BlackRank,
            "BlackTeam" => Tag::BlackTeam,
            "BlackToPlay" => Tag::BlackToPlay,
            "BoardSize" => Tag::BoardSize,
            "Comment" => Tag::Comment,
            "Copyright" => Tag::Copyright,
            "Date" => Tag::Date,
            "Delete" => Tag::Delete,
            "Go" => Tag::Go,
            "GoGame" => Tag::GoGame,
            "Handicap" => Tag::Handicap,
            "Information" => Tag::Information,
            "Komi" => Tag::Komi,
            "Line" => Tag::Line,
            "Mark" => Tag::Mark,
            "Node" => Tag::Node,
            "Nodes" => Tag::Nodes,
            "P" => Tag::P,
            "Result" => Tag::Result,
            "Round" => Tag::Round,
            "Rules" => Tag::Rules,
            "SGF" => Tag::Sgf,
            "Source" => Tag::Source,
            "Time" => Tag::Time,
            "User" => Tag::User,
            "Variation" => Tag::Variation,
            "White" => Tag::White,
            "WhitePlayer" => Tag::WhitePlayer,
            "WhiteRank" => Tag::WhiteRank,
            "WhiteTeam" => Tag::WhiteTeam,
            "WhiteToPlay" => Tag::WhiteToPlay,
            _ => return None,
        })
    }

    /// Elements that may contain this element, or `None` for elements with
    /// special rules.
    fn parents(self) -> Option<&'static [Tag]> {
        use Tag::*;

        Some(match self {
            Arg => &[Sgf],
            At => &[Black, White, AddBlack, AddWhite, Delete, Mark],
            Comment => &[Nodes, Node, Variation],
            Annotation | Application | BlackPlayer | BlackRank | BlackTeam | BoardSize
            | Copyright | Date | Handicap | Komi | Result | Round | Rules | Source | Time
            | User | WhitePlayer | WhiteRank | WhiteTeam => &[Information],
            GoGame => &[Go],
            Information | Nodes => &[GoGame],
            AddBlack | AddWhite | Delete | Mark | Sgf | BlackToPlay | WhiteToPlay => &[Node],
            Black | White => &[Node, Nodes, Variation],
            Node | Variation => &[Nodes, Variation],
            P => &[Comment, Copyright],
            Go | Line => return None,
        })
    }

    /// Attributes that are understood.
    fn attributes(self) -> &'static [&'static str] {
        match self {
            Tag::GoGame => &["name"],
            Tag::Application
            | Tag::BlackPlayer
            | Tag::BlackRank
            | Tag::BoardSize
            | Tag::Date
            | Tag::Handicap
            | Tag::Komi
            | Tag::Result
            | Tag::Rules
            | Tag::Source
            | Tag::Time
            | Tag::WhitePlayer
            | Tag::WhiteRank => &["format"],
            Tag::Mark => &["at", "label", "territory", "type"],
            Tag::Black | Tag::White => &["annotate", "at", "timeleft", "name", "number"],
            Tag::Node => &["blacktime", "name", "whitetime"],
            Tag::AddBlack | Tag::AddWhite | Tag::Delete => &["at"],
            Tag::Sgf => &["type"],
            _ => &[],
        }
    }

    fn setup_color(self) -> Option<GoColor> {
        match self {
            Tag::AddBlack => Some(GoColor::Black),
            Tag::AddWhite => Some(GoColor::White),
            Tag::Delete => Some(GoColor::Empty),
            _ => None,
        }
    }

    fn move_color(self) -> Option<Color> {
        match self {
            Tag::Black => Some(Color::Black),
            Tag::White => Some(Color::White),
            _ => None,
        }
    }
}

/// Attributes of a start tag, unescaped.
#[derive(Debug, Default)]
struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// State of one pass over the document.
struct Parser<'a> {
    data: &'a [u8],
    file: Option<&'a str>,
    warnings: Warnings,
    builder: TreeBuilder,
    /// Names of the open elements.
    stack: Vec<String>,
    /// Text content since the last start or end tag.
    text: String,
    seen_document_element: bool,
    seen_node: bool,
    games: u32,
    trees: u32,
    /// Board size from a `BoardSize` element or fixed by SGF points.
    board_size: Option<u8>,
    /// Board size required by the points seen so far.
    needed_size: u8,
    current: Option<NodeId>,
    /// Nodes that were current when the open variations started.
    variations: Vec<NodeId>,
    /// Game information, applied to the root at the end.
    info: GameInfo,
    /// Main time from the `Time` element.
    info_main_time: Option<Duration>,
    game_name: Option<String>,
    /// Interpreter for `SGF` elements in the current `Node`.
    interpreter: Option<Interpreter>,
    mark_type: Option<MarkType>,
    label: Option<String>,
    sgf_type: Option<String>,
    sgf_args: Vec<String>,
    paragraphs: String,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8], file: Option<&'a str>) -> Parser<'a> {
        let builder = TreeBuilder::new();
        let root = builder.root();
        Parser {
            data,
            file,
            warnings: Warnings::default(),
            builder,
            stack: Vec::new(),
            text: String::new(),
            seen_document_element: false,
            seen_node: false,
            games: 0,
            trees: 0,
            board_size: None,
            needed_size: 0,
            current: Some(root),
            variations: Vec::new(),
            info: GameInfo::default(),
            info_main_time: None,
            game_name: None,
            interpreter: None,
            mark_type: None,
            label: None,
            sgf_type: None,
            sgf_args: Vec::new(),
            paragraphs: String::new(),
        }
    }

    /// Attaches the line and column of a byte offset.
    fn error(&self, kind: ErrorKind, pos: u64) -> SgfError {
        let pos = usize::try_from(pos).unwrap_or(usize::MAX).min(self.data.len());
        let before = &self.data[..pos];
        let line = memchr::memchr_iter(b'\n', before).count() as u64 + 1;
        let line_start = memchr::memrchr(b'\n', before).map_or(0, |i| i + 1);
        SgfError {
            file: self.file.map(str::to_owned),
            line: Some(line),
            column: Some((pos - line_start) as u64 + 1),
            kind,
        }
    }

    fn parse(mut self, progress: &mut Progress<'_>, transcode: bool) -> Result<Attempt> {
        let mut reader = Reader::from_reader(self.data);
        let mut buf = Vec::new();

        loop {
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(err) => return Err(self.error(err.into(), reader.buffer_position() as u64)),
            };
            let result = match event {
                Event::Decl(decl) => match decl.encoding() {
                    Some(Ok(label)) if transcode => match Encoding::for_label(&label) {
                        Some(encoding) if encoding != UTF_8 && encoding.is_ascii_compatible() => {
                            return Ok(Attempt::Transcode(encoding));
                        }
                        Some(_) => Ok(()),
                        None => {
                            self.warnings.add(format!(
                                "Unknown character set \"{}\"",
                                String::from_utf8_lossy(&label)
                            ));
                            Ok(())
                        }
                    },
                    Some(Err(err)) => Err(ErrorKind::Xml(err.into())),
                    _ => Ok(()),
                },
                Event::Start(start) => {
                    progress.update(reader.buffer_position() as u64);
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    read_attributes(&start).and_then(|attrs| self.start_element(name, &attrs))
                }
                Event::Empty(start) => {
                    progress.update(reader.buffer_position() as u64);
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    read_attributes(&start)
                        .and_then(|attrs| self.start_element(name, &attrs))
                        .and_then(|()| self.end_element())
                }
                Event::End(_) => self.end_element(),
                Event::Text(text) => match text.unescape() {
                    Ok(text) => {
                        self.text.push_str(&text);
                        Ok(())
                    }
                    Err(err) => Err(ErrorKind::Xml(err)),
                },
                Event::CData(data) => {
                    self.text.push_str(&String::from_utf8_lossy(&data));
                    Ok(())
                }
                Event::Eof => break,
                _ => Ok(()),
            };
            if let Err(kind) = result {
                return Err(self.error(kind, reader.buffer_position() as u64));
            }
            buf.clear();
        }

        if !self.seen_document_element {
            return Err(self.error(ErrorKind::NotGoGame, reader.buffer_position() as u64));
        }

        let board_size = self
            .board_size
            .unwrap_or_else(|| DEFAULT_SIZE.max(self.needed_size));
        let root = self.builder.root();
        let node = self.builder.node_mut(root);
        node.game_info_mut().merge(&self.info);
        if let Some(name) = self.game_name.take() {
            node.raw.add("GN", name);
        }
        let tree = self.builder.build(board_size);
        debug!(
            nodes = tree.len(),
            board_size,
            warnings = self.warnings.len(),
            "read xml tree"
        );
        Ok(Attempt::Done(XmlReader {
            tree,
            warnings: self.warnings,
        }))
    }

    fn parent(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    fn check_no_text(&mut self, element: &str) {
        if !self.text.trim().is_empty() {
            self.warnings
                .add(format!("Cannot handle text content in element \"{element}\""));
        }
    }

    fn check_parent(&self, tag: Tag, name: &str) -> Result<(), ErrorKind> {
        let parent = self.parent();
        let legal = match tag.parents() {
            Some(parents) => parent
                .and_then(Tag::from_name)
                .is_some_and(|parent| parents.contains(&parent)),
            None => true,
        };
        if legal {
            Ok(())
        } else {
            Err(ErrorKind::IllegalChild {
                element: name.to_owned(),
                parent: parent.map(str::to_owned),
            })
        }
    }

    fn check_attributes(&mut self, tag: Tag, name: &str, attrs: &Attributes) {
        let known = tag.attributes();
        for (key, _) in &attrs.0 {
            if !known.contains(&key.as_str()) {
                self.warnings
                    .add(format!("Unknown attribute \"{key}\" for element \"{name}\""));
            }
        }
    }

    fn current(&self) -> Result<NodeId, ErrorKind> {
        self.current.ok_or(ErrorKind::VariationWithoutNode)
    }

    /// Appends a node to the current node, or starts the next node of the
    /// innermost variation.
    fn create_node(&mut self) -> Result<NodeId, ErrorKind> {
        let father = match self.current {
            Some(id) => id,
            None => self
                .variations
                .last()
                .and_then(|id| self.builder.node(*id).father())
                .ok_or(ErrorKind::VariationWithoutNode)?,
        };
        let id = self.builder.append(father);
        self.current = Some(id);
        Ok(id)
    }

    /// Decodes human-readable coordinates. While the board size is unknown,
    /// the size needed for the points is tracked.
    fn point(&mut self, value: &str) -> Result<Option<GamePoint>, ErrorKind> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let p = parse_human(value, self.board_size.unwrap_or(MAX_SIZE))?;
        if self.board_size.is_none() {
            if let Some(p) = p {
                self.needed_size = self.needed_size.max(p.x() + 1).max(p.y() + 1);
            }
        }
        Ok(p)
    }

    fn integer(&self, element: &str) -> Result<i64, ErrorKind> {
        btoi::btoi(self.text.trim().as_bytes()).map_err(|_| ErrorKind::ExpectedInteger {
            element: element.to_owned(),
        })
    }

    fn set_move(&mut self, color: Color, value: &str) -> Result<(), ErrorKind> {
        let point = self.point(value)?;
        let id = self.current()?;
        self.builder.node_mut(id).mv = Some(Move { color, point });
        Ok(())
    }

    fn add_stone(&mut self, color: GoColor, value: &str) -> Result<(), ErrorKind> {
        if let Some(p) = self.point(value)? {
            let id = self.current()?;
            self.builder.node_mut(id).add_stone(color, p);
        }
        Ok(())
    }

    fn add_mark(&mut self, value: &str) -> Result<(), ErrorKind> {
        if let Some(p) = self.point(value)? {
            let id = self.current()?;
            let node = self.builder.node_mut(id);
            if let Some(mark) = self.mark_type {
                node.add_mark(p, mark);
            }
            if let Some(ref label) = self.label {
                node.labels.insert(p, label.clone());
            }
        }
        Ok(())
    }

    fn set_time_left(&mut self, color: Color, value: Option<&str>) -> Result<(), ErrorKind> {
        if let Some(secs) = value.and_then(|v| v.trim().parse::<f64>().ok()) {
            let id = self.current()?;
            *self.builder.node_mut(id).time_left.get_mut(color) = Some(secs);
        }
        Ok(())
    }

    fn start_element(&mut self, name: String, attrs: &Attributes) -> Result<(), ErrorKind> {
        if !self.seen_document_element {
            if name != "Go" {
                return Err(ErrorKind::NotGoGame);
            }
            self.seen_document_element = true;
        }
        if let Some(parent) = self.stack.last().cloned() {
            self.check_no_text(&parent);
        }

        match Tag::from_name(&name) {
            Some(tag) => self.start_tag(tag, &name, attrs)?,
            None => self
                .warnings
                .add(format!("Ignoring unknown element: {name}")),
        }

        self.stack.push(name);
        self.text.clear();
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag, name: &str, attrs: &Attributes) -> Result<(), ErrorKind> {
        if tag == Tag::Line {
            let parent = self.parent().unwrap_or_default().to_owned();
            self.warnings
                .add(format!("Element \"Line\" cannot be child of element \"{parent}\""));
            return Ok(());
        }
        if tag == Tag::Go && self.parent().is_some() {
            return Err(ErrorKind::IllegalChild {
                element: name.to_owned(),
                parent: self.parent().map(str::to_owned),
            });
        }
        self.check_parent(tag, name)?;
        self.check_attributes(tag, name, attrs);

        match tag {
            Tag::GoGame => {
                if let Some(game_name) = attrs.get("name") {
                    self.game_name = Some(game_name.to_owned());
                }
                self.games += 1;
                if self.games > 1 {
                    return Err(ErrorKind::MultipleGames);
                }
            }
            Tag::Nodes => {
                self.trees += 1;
                if self.trees > 1 {
                    return Err(ErrorKind::MultipleNodes);
                }
            }
            Tag::Node => self.start_node(attrs)?,
            Tag::Variation => {
                let root = self.builder.root();
                let node = self
                    .current
                    .filter(|id| *id != root)
                    .ok_or(ErrorKind::VariationWithoutNode)?;
                self.variations.push(node);
                self.current = None;
            }
            Tag::Black | Tag::White => {
                let color = Color::from_black(tag == Tag::Black);
                if self.parent() != Some("Node") {
                    self.create_node()?;
                }
                let id = self.current()?;
                if let Some(node_name) = attrs.get("name") {
                    self.builder.node_mut(id).raw.add("N", node_name);
                }
                if attrs.get("annotate").is_some() {
                    self.warnings.add(format!(
                        "Attribute \"annotate\" in element \"{name}\" not supported"
                    ));
                }
                if let Some(at) = attrs.get("at") {
                    self.set_move(color, at)?;
                }
                self.set_time_left(color, attrs.get("timeleft"))?;
            }
            Tag::AddBlack | Tag::AddWhite | Tag::Delete => {
                if let (Some(color), Some(at)) = (tag.setup_color(), attrs.get("at")) {
                    self.add_stone(color, at)?;
                }
            }
            Tag::Mark => {
                self.label = attrs.get("label").map(str::to_owned);
                self.mark_type = None;
                let kind = attrs.get("type");
                let territory = attrs.get("territory");
                if let Some(kind) = kind {
                    match MarkType::from_xml(kind) {
                        Some(mark) => self.mark_type = Some(mark),
                        None => self.warnings.add(format!("Unknown mark type {kind}")),
                    }
                }
                if let Some(territory) = territory {
                    match territory {
                        "black" => self.mark_type = Some(MarkType::TerritoryBlack),
                        "white" => self.mark_type = Some(MarkType::TerritoryWhite),
                        _ => self
                            .warnings
                            .add(format!("Unknown territory type {territory}")),
                    }
                }
                if kind.is_none() && territory.is_none() && self.label.is_none() {
                    self.mark_type = Some(MarkType::Mark);
                }
                if let Some(at) = attrs.get("at") {
                    self.add_mark(at)?;
                }
            }
            Tag::BlackToPlay | Tag::WhiteToPlay => {
                let id = self.current()?;
                self.builder.node_mut(id).player =
                    Some(Color::from_black(tag == Tag::BlackToPlay));
            }
            Tag::Sgf => {
                self.sgf_type = attrs.get("type").map(str::to_owned);
                self.sgf_args.clear();
            }
            Tag::Comment | Tag::Copyright => self.paragraphs.clear(),
            _ => {
                if let Some(format) = attrs.get("format") {
                    let format = format.trim().to_ascii_lowercase();
                    if format != "sgf" {
                        self.warnings.add(format!(
                            "Unknown format attribute \"{format}\" for element \"{name}\""
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn start_node(&mut self, attrs: &Attributes) -> Result<(), ErrorKind> {
        // The first node may stand for the implicit root node.
        let reuse_root = !self.seen_node
            && self
                .current
                .is_some_and(|id| self.builder.node(id).is_empty());
        let id = if reuse_root {
            self.current()?
        } else {
            self.create_node()?
        };
        self.seen_node = true;

        let node = self.builder.node_mut(id);
        if let Some(name) = attrs.get("name") {
            node.raw.add("N", name);
        }
        self.set_time_left(Color::Black, attrs.get("blacktime"))?;
        self.set_time_left(Color::White, attrs.get("whitetime"))?;

        let is_root = id == self.builder.root();
        self.interpreter = Some(Interpreter::new(
            self.board_size.unwrap_or(DEFAULT_SIZE),
            is_root,
        ));
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), ErrorKind> {
        let name = self.stack.pop().unwrap_or_default();
        if let Some(tag) = Tag::from_name(&name) {
            self.end_tag(tag, &name)?;
        }
        self.text.clear();
        Ok(())
    }

    fn end_tag(&mut self, tag: Tag, name: &str) -> Result<(), ErrorKind> {
        let text = self.text.clone();
        match tag {
            Tag::Go | Tag::GoGame | Tag::Information | Tag::Nodes => self.check_no_text(name),
            Tag::Annotation => self.info.set(InfoField::Annotation, text),
            Tag::Date => self.info.set(InfoField::Date, text),
            Tag::Result => self.info.set(InfoField::Result, text),
            Tag::Round => self.info.set(InfoField::Round, text),
            Tag::Rules => self.info.set(InfoField::Rules, text),
            Tag::Source => self.info.set(InfoField::Source, text),
            Tag::User => self.info.set(InfoField::User, text),
            Tag::BlackPlayer => self.info.set_player(PlayerField::Name, Color::Black, text),
            Tag::BlackRank => self.info.set_player(PlayerField::Rank, Color::Black, text),
            Tag::BlackTeam => self.info.set_player(PlayerField::Team, Color::Black, text),
            Tag::WhitePlayer => self.info.set_player(PlayerField::Name, Color::White, text),
            Tag::WhiteRank => self.info.set_player(PlayerField::Rank, Color::White, text),
            Tag::WhiteTeam => self.info.set_player(PlayerField::Team, Color::White, text),
            Tag::Application | Tag::Line => (),
            Tag::BoardSize => {
                let size = self.integer(name)?;
                match u8::try_from(size) {
                    Ok(size) if (1..=MAX_SIZE).contains(&size) => self.board_size = Some(size),
                    _ => return Err(ErrorKind::UnsupportedBoardSize),
                }
            }
            Tag::Handicap => {
                let handicap = self.integer(name)?;
                match u32::try_from(handicap) {
                    Ok(handicap) if handicap != 1 => self.info.handicap = Some(handicap),
                    _ => self
                        .warnings
                        .add(format!("Ignoring invalid handicap: {handicap}")),
                }
            }
            Tag::Komi => match text.parse::<Komi>() {
                Ok(komi) => self.info.komi = Some(komi),
                Err(_) => self.warnings.add(format!("Invalid komi: {text}")),
            },
            Tag::Time => {
                let value = text.trim();
                if !value.is_empty() && value != "-" {
                    match parse_time(value) {
                        Some(main) => {
                            self.info_main_time = Some(main);
                            if !main.is_zero() {
                                self.info.time_settings = Some(TimeSettings::SuddenDeath { main });
                            }
                        }
                        None => {
                            self.warnings.add("Unknown format in Time element");
                            let id = self.current()?;
                            self.builder.node_mut(id).raw.add("TM", value);
                        }
                    }
                }
            }
            Tag::Comment => {
                let comment = self.paragraph_text();
                let id = self.current()?;
                self.builder.node_mut(id).comment = Some(comment);
            }
            Tag::Copyright => {
                let copyright = self.paragraph_text();
                self.info.set(InfoField::Copyright, copyright);
            }
            Tag::P => {
                self.paragraphs.push_str(&merged_lines(&text));
                self.paragraphs.push('\n');
            }
            Tag::At => {
                // The parent is on top of the stack again.
                match self.parent().and_then(Tag::from_name) {
                    Some(Tag::Black) => self.set_move(Color::Black, &text)?,
                    Some(Tag::White) => self.set_move(Color::White, &text)?,
                    Some(Tag::Mark) => self.add_mark(&text)?,
                    Some(parent) => {
                        if let Some(color) = parent.setup_color() {
                            self.add_stone(color, &text)?;
                        }
                    }
                    None => (),
                }
            }
            // Text content instead of an at element or attribute.
            Tag::Black | Tag::White => {
                if let Some(color) = tag.move_color().filter(|_| !text.trim().is_empty()) {
                    self.set_move(color, &text)?;
                }
            }
            Tag::AddBlack | Tag::AddWhite | Tag::Delete => {
                if let Some(color) = tag.setup_color() {
                    self.add_stone(color, &text)?;
                }
            }
            Tag::Mark => {
                if !text.trim().is_empty() {
                    self.add_mark(&text)?;
                }
            }
            Tag::BlackToPlay | Tag::WhiteToPlay => {
                if !text.trim().is_empty() {
                    self.warnings
                        .add(format!("Ignoring text content in element \"{name}\""));
                }
            }
            Tag::Arg => self.sgf_args.push(text),
            Tag::Sgf => {
                self.check_no_text(name);
                self.end_sgf()?;
            }
            Tag::Node => {
                self.check_no_text(name);
                self.end_node()?;
            }
            Tag::Variation => {
                self.check_no_text(name);
                self.current = self.variations.pop();
            }
        }
        Ok(())
    }

    /// Text of a `Comment` or `Copyright` element: the paragraphs, and any
    /// direct text content.
    fn paragraph_text(&mut self) -> String {
        let mut text = std::mem::take(&mut self.paragraphs);
        let direct = merged_lines(&self.text);
        if !direct.trim().is_empty() {
            text.push_str(&direct);
            text.push('\n');
        }
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }

    /// Applies an `SGF` element to the current node.
    fn end_sgf(&mut self) -> Result<(), ErrorKind> {
        let Some(key) = self.sgf_type.take() else {
            return Ok(());
        };
        let key = canonical_name(&key.to_ascii_uppercase()).to_owned();
        let values = std::mem::take(&mut self.sgf_args);
        if values.is_empty() {
            self.warnings
                .add(format!("Property \"{key}\" has no value"));
            return Ok(());
        }

        // Jago writes the player as a color name.
        if key == "PL" {
            let id = self.current()?;
            match values[0].parse::<Color>() {
                Ok(color) => self.builder.node_mut(id).player = Some(color),
                Err(_) => self.warnings.add("Invalid color value"),
            }
            return Ok(());
        }

        // SGF points cannot be decoded without fixing the board size.
        if handler(&key).is_some_and(|h| h.takes_points()) && self.board_size.is_none() {
            self.board_size = Some(DEFAULT_SIZE.max(self.needed_size));
        }

        let id = self.current()?;
        let board_size = self.board_size.unwrap_or(DEFAULT_SIZE);
        let interpreter = self
            .interpreter
            .get_or_insert_with(|| Interpreter::new(board_size, false));
        interpreter.set_board_size(board_size);
        interpreter.apply(self.builder.node_mut(id), &key, values, &mut self.warnings)?;
        Ok(())
    }

    /// Completes the time settings of a node.
    fn end_node(&mut self) -> Result<(), ErrorKind> {
        let Some(mut interpreter) = self.interpreter.take() else {
            return Ok(());
        };
        let id = self.current()?;
        if id == self.builder.root() {
            interpreter.default_main_time(self.info_main_time);
            if let Some(time_settings) = interpreter.finish() {
                self.info.time_settings = Some(time_settings);
            }
        } else if let Some(time_settings) = interpreter.finish() {
            self.builder.node_mut(id).game_info_mut().time_settings = Some(time_settings);
        }
        Ok(())
    }
}

fn read_attributes(start: &quick_xml::events::BytesStart<'_>) -> Result<Attributes, ErrorKind> {
    let mut attrs = Attributes::default();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.0.push((key, value));
    }
    Ok(attrs)
}

/// Joins the lines of a text with spaces.
fn merged_lines(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut merged = String::with_capacity(text.len());
    for line in text.lines() {
        if !merged.is_empty() {
            merged.push(' ');
        }
        merged.push_str(line);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<XmlReader> {
        XmlReader::from_bytes(xml.as_bytes())
    }

    fn game(nodes: &str) -> String {
        format!("<Go><GoGame><Nodes>{nodes}</Nodes></GoGame></Go>")
    }

    #[test]
    fn test_merged_lines() {
        assert_eq!(merged_lines("a\nb\r\nc"), "a b c");
        assert_eq!(merged_lines("\n"), "");
        assert_eq!(merged_lines("one"), "one");
    }

    #[test]
    fn test_not_go() {
        let err = parse("<Chess/>").expect_err("wrong document element");
        assert!(matches!(err.kind, ErrorKind::NotGoGame));
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_implicit_root() {
        let reader = parse(&game("<Node/><Black at=\"D4\"/><White at=\"Q16\"/>")).expect("valid xml");
        let tree = reader.tree();
        assert_eq!(tree.len(), 3);
        assert!(tree[tree.root()].mv.is_none());
        assert_eq!(tree.board_size(), 19);
    }

    #[test]
    fn test_comment_before_first_node() {
        let reader = parse(&game(
            "<Comment><P>Hello\nworld</P><P>again</P></Comment><Node><Black at=\"C3\"/></Node>",
        ))
        .expect("valid xml");
        let tree = reader.tree();
        let root = tree.root();
        assert_eq!(tree[root].comment.as_deref(), Some("Hello world\nagain"));
        let first = tree.child(root, 0).expect("first node");
        assert_eq!(tree[first].mv, Some(Move::new(Color::Black, GamePoint::new(2, 2))));
    }

    #[test]
    fn test_variations() {
        let reader = parse(&game(
            "<Node/><Black at=\"A1\"/><Variation><Black at=\"B1\"/><White at=\"C1\"/></Variation><White at=\"D1\"/>",
        ))
        .expect("valid xml");
        let tree = reader.tree();
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);
        let main = tree.child(root, 0).expect("main line");
        assert_eq!(tree.children(main).len(), 1);
        let variation = tree.child(root, 1).expect("variation");
        assert_eq!(tree.children(variation).len(), 1);
    }

    #[test]
    fn test_variation_without_node() {
        let err = parse(&game("<Variation/>")).expect_err("variation of root");
        assert!(matches!(err.kind, ErrorKind::VariationWithoutNode));
    }

    #[test]
    fn test_illegal_child() {
        let err = parse("<Go><Nodes/></Go>").expect_err("nodes outside game");
        assert_eq!(err.line, Some(1));
        assert_eq!(err.kind.to_string(), "Element \"Nodes\" cannot be child of \"Go\"");
    }

    #[test]
    fn test_multiple_games() {
        let err = parse("<Go><GoGame/><GoGame/></Go>").expect_err("two games");
        assert!(matches!(err.kind, ErrorKind::MultipleGames));
    }

    #[test]
    fn test_size_inferred() {
        let reader = parse(&game("<Node><AddBlack at=\"T22\"/></Node>")).expect("valid xml");
        assert_eq!(reader.tree().board_size(), 22);
    }

    #[test]
    fn test_information() {
        let reader = parse(
            "<Go><GoGame name=\"Final\"><Information>\
             <BoardSize>13</BoardSize><Komi>5,5</Komi><Handicap>1</Handicap>\
             <BlackPlayer format=\"html\">Honinbo</BlackPlayer><Time>1:00</Time>\
             <Copyright><P>GPL</P></Copyright></Information>\
             <Nodes><Node/></Nodes></GoGame></Go>",
        )
        .expect("valid xml");
        let tree = reader.tree();
        let info = tree.game_info(tree.root());
        assert_eq!(tree.board_size(), 13);
        assert_eq!(info.komi.map(Komi::value), Some(5.5));
        assert_eq!(info.handicap, None);
        assert_eq!(info.get_player(PlayerField::Name, Color::Black), Some("Honinbo"));
        assert_eq!(info.copyright.as_deref(), Some("GPL"));
        assert_eq!(
            info.time_settings,
            Some(TimeSettings::SuddenDeath {
                main: Duration::from_secs(3600)
            })
        );
        assert_eq!(tree[tree.root()].raw.value("GN", 0), Ok("Final"));
        let warnings = reader.warnings();
        assert!(warnings.contains("Ignoring invalid handicap: 1"));
        assert!(warnings.contains("Unknown format attribute \"html\" for element \"BlackPlayer\""));
    }

    #[test]
    fn test_marks() {
        let reader = parse(&game(
            "<Node><Mark at=\"A1\"/><Mark type=\"triangle\"><at>B2</at></Mark>\
             <Mark label=\"x\" at=\"C3\"/><Mark territory=\"blue\" at=\"D4\"/></Node>",
        ))
        .expect("valid xml");
        let tree = reader.tree();
        let root = &tree[tree.root()];
        assert!(root.marks[&GamePoint::new(0, 0)].has(MarkType::Mark));
        assert!(root.marks[&GamePoint::new(1, 1)].has(MarkType::Triangle));
        assert_eq!(root.labels.get(&GamePoint::new(2, 2)).map(String::as_str), Some("x"));
        assert!(reader.warnings().contains("Unknown territory type blue"));
    }

    #[test]
    fn test_sgf_element() {
        let reader = parse(&game(
            "<Node><SGF type=\"TM\"><Arg>600</Arg></SGF><SGF type=\"OT\"><Arg>5/30</Arg></SGF>\
             <SGF type=\"XY\"><Arg>a</Arg><Arg>b</Arg></SGF></Node>",
        ))
        .expect("valid xml");
        let tree = reader.tree();
        let info = tree.game_info(tree.root());
        assert_eq!(
            info.time_settings,
            Some(TimeSettings::Byoyomi {
                main: Duration::from_secs(600),
                period: Duration::from_secs(30),
                moves: 5,
            })
        );
        assert_eq!(tree[tree.root()].raw.value_count("XY"), 2);
    }

    #[test]
    fn test_sgf_points_fix_size() {
        let reader = parse(&game("<Node><SGF type=\"SL\"><Arg>aa</Arg></SGF></Node>")).expect("valid xml");
        let tree = reader.tree();
        assert_eq!(tree.board_size(), 19);
        assert!(tree[tree.root()].marks[&GamePoint::new(0, 18)].has(MarkType::Select));
    }

    #[test]
    fn test_unknown_things() {
        let reader = parse(&game(
            "<Node foo=\"1\"><Sparkle/><BlackToPlay>now</BlackToPlay>stray</Node>",
        ))
        .expect("valid xml");
        let warnings = reader.warnings();
        assert!(warnings.contains("Unknown attribute \"foo\" for element \"Node\""));
        assert!(warnings.contains("Ignoring unknown element: Sparkle"));
        assert!(warnings.contains("Ignoring text content in element \"BlackToPlay\""));
        assert!(warnings.contains("Cannot handle text content in element \"Node\""));
        assert_eq!(reader.tree()[reader.tree().root()].player, Some(Color::Black));
    }

    #[test]
    fn test_latin1_declaration() {
        let mut xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>".to_vec();
        xml.extend_from_slice(b"<Go><GoGame><Nodes><Node><Comment>Gr\xfc\xdfe</Comment></Node></Nodes></GoGame></Go>");
        let reader = XmlReader::from_bytes(&xml).expect("valid xml");
        let tree = reader.tree();
        assert_eq!(tree[tree.root()].comment.as_deref(), Some("Gr\u{fc}\u{df}e"));
    }

    #[test]
    fn test_unknown_encoding() {
        let xml = format!("<?xml version=\"1.0\" encoding=\"klingon\"?>{}", game("<Node/>"));
        let reader = parse(&xml).expect("valid xml");
        assert!(reader.warnings().contains("Unknown character set \"klingon\""));
    }
}
