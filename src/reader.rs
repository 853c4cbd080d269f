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

//! Reader for the SGF text format.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use encoding_rs::Encoding;
use tracing::debug;

use crate::{
    config::Config,
    errors::{ErrorKind, SgfError, Warnings},
    game::{GameTree, NodeId, TreeBuilder},
    interpret::{apply_root_fixes, board_size, collect_property, Applied, Interpreter},
    lexer::{Lexer, Token},
    point::DEFAULT_SIZE,
    progress::{Progress, ProgressShow},
    props::PropertyTable,
};

pub type Result<T, E = SgfError> = std::result::Result<T, E>;

/// A game tree read from SGF, together with the warnings collected while
/// reading it.
///
/// # Examples
///
/// ```
/// use sgf_reader::{Color, GamePoint, SgfReader};
///
/// let reader = SgfReader::from_bytes(b"(;GM[1]FF[4]SZ[9];B[ee])")?;
/// let tree = reader.tree();
/// assert_eq!(tree.board_size(), 9);
///
/// let first = tree.child(tree.root(), 0).expect("first move");
/// let mv = tree[first].mv.expect("move");
/// assert_eq!(mv.color, Color::Black);
/// assert_eq!(mv.point, Some(GamePoint::new(4, 4)));
/// assert!(reader.warnings().is_empty());
/// # Ok::<_, sgf_reader::SgfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SgfReader {
    tree: GameTree,
    warnings: Warnings,
}

impl SgfReader {
    /// Reads a file. A `CA` property in the root node restarts reading with
    /// the declared charset.
    ///
    /// # Errors
    ///
    /// See [`SgfReader::open_with()`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SgfReader> {
        SgfReader::open_with(path, Config::default(), None)
    }

    /// Reads a file with custom settings and optional progress reports.
    ///
    /// The file name is used in error messages, unless
    /// [`Config::file_name`] is set. The file size is used for progress
    /// reports, unless [`Config::size_hint`] is set.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid game record.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        mut config: Config,
        progress: Option<&mut dyn ProgressShow>,
    ) -> Result<SgfReader> {
        let path = path.as_ref();
        if config.file_name.is_none() {
            config.file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        if config.size_hint.is_none() && progress.is_some() {
            config.size_hint = path.metadata().ok().map(|meta| meta.len());
        }
        read(|| File::open(path), true, &config, progress)
    }

    /// Reads from a stream that cannot be rewound, so that `CA` properties
    /// are ignored.
    ///
    /// # Errors
    ///
    /// See [`SgfReader::from_reader_with()`].
    pub fn from_reader<R: Read>(reader: R) -> Result<SgfReader> {
        SgfReader::from_reader_with(reader, Config::default(), None)
    }

    /// # Errors
    ///
    /// Fails on I/O errors or if the input is not a valid game record.
    pub fn from_reader_with<R: Read>(
        reader: R,
        config: Config,
        progress: Option<&mut dyn ProgressShow>,
    ) -> Result<SgfReader> {
        let mut reader = Some(reader);
        read(
            || reader.take().ok_or_else(|| io::Error::other("stream cannot be reopened")),
            false,
            &config,
            progress,
        )
    }

    /// Reads from memory. A `CA` property in the root node restarts reading
    /// with the declared charset.
    ///
    /// # Errors
    ///
    /// See [`SgfReader::from_bytes_with()`].
    pub fn from_bytes(bytes: &[u8]) -> Result<SgfReader> {
        SgfReader::from_bytes_with(bytes, Config::default(), None)
    }

    /// # Errors
    ///
    /// Fails if the input is not a valid game record.
    pub fn from_bytes_with(
        bytes: &[u8],
        mut config: Config,
        progress: Option<&mut dyn ProgressShow>,
    ) -> Result<SgfReader> {
        config.size_hint.get_or_insert(bytes.len() as u64);
        read(|| Ok(bytes), true, &config, progress)
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

/// Result of reading the input once.
enum Attempt {
    Done(SgfReader),
    Restart(&'static Encoding),
}

/// Reads a game record, reopening the input at most once if the root node
/// declares another charset.
fn read<R, F>(
    mut open: F,
    reopenable: bool,
    config: &Config,
    show: Option<&mut dyn ProgressShow>,
) -> Result<SgfReader>
where
    R: Read,
    F: FnMut() -> io::Result<R>,
{
    let file = config.file_name.as_deref();
    let mut progress = Progress::new(show, config.size_hint);
    progress.start();

    let mut encoding = config.default_charset;
    let mut restart = reopenable && config.honor_charset;
    loop {
        let input = open().map_err(|err| SgfError {
            file: file.map(str::to_owned),
            ..SgfError::new(ErrorKind::Io(err))
        })?;
        let parser = Parser::new(input, encoding, file, restart.then_some(encoding));
        match parser.parse(&mut progress)? {
            Attempt::Done(reader) => return Ok(reader),
            Attempt::Restart(charset) => {
                debug!(from = encoding.name(), to = charset.name(), "charset changed, restarting");
                encoding = charset;
                restart = false;
            }
        }
    }
}

/// State of one pass over the input.
struct Parser<'a, R> {
    lexer: Lexer<R>,
    file: Option<&'a str>,
    /// Charset of the input, if a `CA` property may request a restart.
    restart_from: Option<&'static Encoding>,
    builder: TreeBuilder,
    board_size: Option<u8>,
    warnings: Warnings,
}

impl<'a, R: Read> Parser<'a, R> {
    fn new(
        input: R,
        encoding: &'static Encoding,
        file: Option<&'a str>,
        restart_from: Option<&'static Encoding>,
    ) -> Parser<'a, R> {
        Parser {
            lexer: Lexer::new(input, encoding),
            file,
            restart_from,
            builder: TreeBuilder::new(),
            board_size: None,
            warnings: Warnings::default(),
        }
    }

    fn error(&self, kind: ErrorKind) -> SgfError {
        match kind {
            ErrorKind::Io(_) => SgfError {
                file: self.file.map(str::to_owned),
                ..SgfError::new(kind)
            },
            kind => SgfError::at_line(kind, self.file, self.lexer.line()),
        }
    }

    fn token(&mut self) -> Result<Token> {
        self.lexer
            .next_token()
            .map_err(|err| self.error(ErrorKind::Io(err)))
    }

    fn parse(mut self, progress: &mut Progress<'_>) -> Result<Attempt> {
        self.find_root()?;

        let root = self.builder.root();
        progress.update(self.lexer.consumed());
        if let Applied::Restart(charset) = self.read_node(root, true)? {
            return Ok(Attempt::Restart(charset));
        }

        // Fathers of the open variations.
        let mut fathers: Vec<NodeId> = Vec::new();
        let mut current = root;
        loop {
            match self.token()? {
                Token::Node => {
                    progress.update(self.lexer.consumed());
                    current = self.builder.append(current);
                    self.read_node(current, false)?;
                }
                Token::Open => fathers.push(current),
                Token::Close => match fathers.pop() {
                    Some(father) => current = father,
                    None => break,
                },
                Token::Eof => {
                    self.warnings.add("Game tree not closed");
                    break;
                }
                Token::Value | Token::Word(_) | Token::Other(_) => {
                    return Err(self.error(ErrorKind::NextNodeExpected));
                }
            }
        }

        self.check_end_of_file()?;

        apply_root_fixes(&mut self.builder);
        let board_size = self.board_size.unwrap_or(DEFAULT_SIZE);
        let tree = self.builder.build(board_size);
        debug!(
            nodes = tree.len(),
            board_size,
            warnings = self.warnings.len(),
            "read sgf tree"
        );
        Ok(Attempt::Done(SgfReader {
            tree,
            warnings: self.warnings,
        }))
    }

    /// Skips to the first `(;`. The root node is then the next thing to
    /// read.
    fn find_root(&mut self) -> Result<()> {
        loop {
            match self.token()? {
                Token::Open => match self.token()? {
                    Token::Node => return Ok(()),
                    other => {
                        self.warnings.add("Extra text before SGF tree");
                        self.lexer.push_back(other);
                    }
                },
                Token::Eof => return Err(self.error(ErrorKind::NoRootTree)),
                _ => self.warnings.add("Extra text before SGF tree"),
            }
        }
    }

    fn check_end_of_file(&mut self) -> Result<()> {
        match self.token()? {
            Token::Open => Err(self.error(ErrorKind::MultipleTrees)),
            Token::Eof => Ok(()),
            _ => {
                self.warnings.add("Extra text after SGF tree");
                Ok(())
            }
        }
    }

    /// Reads `WORD[value]...` pairs up to the next structural token.
    fn read_properties(&mut self) -> Result<PropertyTable> {
        let mut props = PropertyTable::new();
        loop {
            let name = match self.token()? {
                Token::Word(name) => name,
                other => {
                    self.lexer.push_back(other);
                    return Ok(props);
                }
            };
            let mut values = Vec::new();
            loop {
                match self.token()? {
                    Token::Value => {
                        let value = self.lexer.read_value().map_err(|kind| self.error(kind))?;
                        values.push(value);
                    }
                    other => {
                        self.lexer.push_back(other);
                        break;
                    }
                }
            }
            collect_property(&mut props, &name, values, &mut self.warnings);
        }
    }

    /// Reads the properties of a node and applies them.
    fn read_node(&mut self, id: NodeId, is_root: bool) -> Result<Applied> {
        let mut props = self.read_properties()?;

        // The board size is needed to decode points.
        if let Some(values) = props.remove("SZ") {
            if let Some(size) = board_size(&values, is_root, &mut self.warnings) {
                self.board_size = Some(size);
            }
        }
        let size = *self.board_size.get_or_insert(DEFAULT_SIZE);

        let mut interpreter = Interpreter::new(size, is_root);
        if let Some(current) = self.restart_from {
            interpreter = interpreter.with_restart(current);
        }
        let node = self.builder.node_mut(id);
        match interpreter.apply_all(node, props, &mut self.warnings) {
            Ok(Applied::Done) => {
                if let Some(time_settings) = interpreter.finish() {
                    node.game_info_mut().time_settings = Some(time_settings);
                }
                Ok(Applied::Done)
            }
            Ok(restart) => Ok(restart),
            Err(kind) => Err(self.error(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::UTF_8;

    use super::*;

    fn parse(s: &str) -> Result<SgfReader> {
        SgfReader::from_bytes(s.as_bytes())
    }

    #[test]
    fn test_minimal() {
        let reader = parse("(;)").expect("valid sgf");
        let tree = reader.tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.board_size(), 19);
        assert!(tree[tree.root()].game_info.is_some());
        assert!(reader.warnings().is_empty());
    }

    #[test]
    fn test_extra_text() {
        let reader = parse("garbage (x (;B[aa]) trailing").expect("valid sgf");
        assert!(reader.warnings().contains("Extra text before SGF tree"));
        assert!(reader.warnings().contains("Extra text after SGF tree"));
        assert_eq!(reader.tree().len(), 1);
    }

    #[test]
    fn test_not_closed() {
        let reader = parse("(;SZ[9];B[aa](;W[bb]").expect("valid sgf");
        assert!(reader.warnings().contains("Game tree not closed"));
        assert_eq!(reader.tree().len(), 3);
    }

    #[test]
    fn test_no_root() {
        let err = parse("(B[aa])").expect_err("no root");
        assert!(matches!(err.kind, ErrorKind::NoRootTree));
    }

    #[test]
    fn test_next_node_expected() {
        let err = parse("(;B[aa]\n\n:)").expect_err("stray character");
        assert!(matches!(err.kind, ErrorKind::NextNodeExpected));
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_nested_variations() {
        let reader = parse("(;SZ[9](;B[aa];W[bb](;B[cc])(;B[dd]))(;B[ee]))").expect("valid sgf");
        let tree = reader.tree();
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);
        let b = tree.child(tree.child(root, 0).expect("first"), 0).expect("second");
        assert_eq!(tree.children(b).len(), 2);
        assert_eq!(tree.main_variation().count(), 4);
    }

    #[test]
    fn test_size_applies_to_root_points() {
        let reader = parse("(;AB[ss]SZ[19:19])").expect("valid sgf");
        assert!(reader.tree()[reader.tree().root()]
            .setup
            .black
            .contains(&crate::GamePoint::new(18, 0)));
    }

    #[test]
    fn test_restart_from_bytes() {
        let reader = parse("(;CA[UTF-8]C[\u{e4}])").expect("valid sgf");
        let tree = reader.tree();
        assert_eq!(tree[tree.root()].comment.as_deref(), Some("\u{e4}"));
    }

    #[test]
    fn test_progress_across_restart() {
        let sgf = "(;CA[UTF-8]C[\u{e4}];B[aa];W[bb];B[cc];W[dd];B[ee])";
        let mut reports = Vec::new();
        let mut sink = |percent: u32| reports.push(percent);
        SgfReader::from_bytes_with(sgf.as_bytes(), Config::default(), Some(&mut sink))
            .expect("valid sgf");
        assert_eq!(reports.first(), Some(&0));
        assert!(reports.windows(2).all(|w| w[0] < w[1]), "{reports:?}");
    }

    #[test]
    fn test_no_restart_from_reader() {
        let bytes = "(;CA[UTF-8]C[\u{e4}])".as_bytes();
        let reader = SgfReader::from_reader(bytes).expect("valid sgf");
        let tree = reader.tree();
        assert_eq!(tree[tree.root()].comment.as_deref(), Some("\u{c3}\u{a4}"));
    }

    #[test]
    fn test_honor_charset_disabled() {
        let config = Config {
            default_charset: UTF_8,
            honor_charset: false,
            ..Config::default()
        };
        let reader =
            SgfReader::from_bytes_with(b"(;CA[Klingon]C[x])", config, None).expect("valid sgf");
        assert!(reader.warnings().is_empty());
    }
}
