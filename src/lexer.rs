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

use std::io::{self, Read};

use encoding_rs::Encoding;

use crate::{buffer::CharReader, errors::ErrorKind};

/// Structural token of SGF text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Token {
    /// `(`
    Open,
    /// `)`
    Close,
    /// `;`
    Node,
    /// `[`, followed by a value that must be read with
    /// [`Lexer::read_value()`].
    Value,
    /// Property name, as written.
    Word(String),
    /// Any other character.
    Other(char),
    Eof,
}

/// Splits SGF text into tokens, counting lines.
///
/// CR, LF, CRLF and LFCR each count as one line break.
pub(crate) struct Lexer<R> {
    reader: CharReader<R>,
    pushed: Option<Token>,
    line: u64,
    /// The last character counted was a line break of this kind.
    last_break: Option<char>,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Lexer<R> {
        Lexer {
            reader: CharReader::new(reader, encoding),
            pushed: None,
            line: 1,
            last_break: None,
        }
    }

    /// Current 1-based line number.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Number of input bytes read so far.
    pub fn consumed(&self) -> u64 {
        self.reader.consumed()
    }

    fn count(&mut self, ch: char) {
        match ch {
            '\r' | '\n' => {
                match self.last_break {
                    Some(last) if last != ch => self.last_break = None,
                    _ => {
                        self.line += 1;
                        self.last_break = Some(ch);
                    }
                }
            }
            _ => self.last_break = None,
        }
    }

    fn bump(&mut self) -> io::Result<Option<char>> {
        let ch = self.reader.bump()?;
        if let Some(ch) = ch {
            self.count(ch);
        }
        Ok(ch)
    }

    /// Returns a token to be read again by the next [`Lexer::next_token()`].
    pub fn push_back(&mut self, token: Token) {
        debug_assert!(self.pushed.is_none());
        self.pushed = Some(token);
    }

    pub fn next_token(&mut self) -> io::Result<Token> {
        if let Some(token) = self.pushed.take() {
            return Ok(token);
        }

        loop {
            let Some(ch) = self.bump()? else {
                return Ok(Token::Eof);
            };
            let token = match ch {
                '(' => Token::Open,
                ')' => Token::Close,
                ';' => Token::Node,
                '[' => Token::Value,
                ch if ch.is_ascii_alphabetic() => {
                    let mut word = String::from(ch);
                    while let Some(ch) = self.reader.peek()? {
                        if !ch.is_ascii_alphabetic() {
                            break;
                        }
                        word.push(ch);
                        self.bump()?;
                    }
                    Token::Word(word)
                }
                ch if ch.is_whitespace() => continue,
                ch => Token::Other(ch),
            };
            return Ok(token);
        }
    }

    /// Reads a property value after [`Token::Value`], up to and including
    /// the closing `]`.
    ///
    /// A backslash escapes the next character. Escaped line breaks are
    /// removed. Unescaped line breaks are normalized to `\n`, where CRLF and
    /// LFCR count as one.
    pub fn read_value(&mut self) -> Result<String, ErrorKind> {
        let mut value = String::new();
        let mut quoted = false;
        let mut last: Option<char> = None;

        loop {
            if !quoted {
                // Fast path for runs of plain characters.
                let rest = self.reader.remaining()?;
                let bytes = rest.as_bytes();
                let end = memchr::memchr3(b']', b'\\', b'\n', bytes).unwrap_or(bytes.len());
                let end = memchr::memchr(b'\r', &bytes[..end]).unwrap_or(end);
                if end > 0 {
                    let plain = &rest[..end];
                    value.push_str(plain);
                    last = plain.chars().next_back();
                    self.last_break = None;
                    self.reader.consume(end);
                }
            }

            let Some(ch) = self.bump()? else {
                return Err(ErrorKind::ValueIncomplete);
            };

            if quoted {
                if ch != '\n' && ch != '\r' {
                    value.push(ch);
                }
                last = Some(ch);
                quoted = false;
            } else if ch == ']' {
                return Ok(value);
            } else if ch == '\\' {
                quoted = true;
            } else {
                let is_break = ch == '\n' || ch == '\r';
                let last_break = matches!(last, Some('\n' | '\r'));
                if is_break && last_break && last != Some(ch) {
                    last = None;
                } else {
                    value.push(if is_break { '\n' } else { ch });
                    last = Some(ch);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::UTF_8;

    use super::*;

    fn new_lexer(s: &str) -> Lexer<&[u8]> {
        Lexer::new(s.as_bytes(), UTF_8)
    }

    fn value(s: &str) -> String {
        let mut lexer = new_lexer(s);
        assert_eq!(lexer.next_token().expect("token"), Token::Value);
        lexer.read_value().expect("value")
    }

    #[test]
    fn test_tokens() {
        let mut lexer = new_lexer("(;GM[1]\n  ;AddBlack[aa] )x");
        assert_eq!(lexer.next_token().expect("token"), Token::Open);
        assert_eq!(lexer.next_token().expect("token"), Token::Node);
        assert_eq!(lexer.next_token().expect("token"), Token::Word("GM".to_owned()));
        assert_eq!(lexer.next_token().expect("token"), Token::Value);
        assert_eq!(lexer.read_value().expect("value"), "1");
        assert_eq!(lexer.next_token().expect("token"), Token::Node);
        assert_eq!(lexer.line(), 2);
        assert_eq!(lexer.next_token().expect("token"), Token::Word("AddBlack".to_owned()));
        assert_eq!(lexer.next_token().expect("token"), Token::Value);
        assert_eq!(lexer.read_value().expect("value"), "aa");
        assert_eq!(lexer.next_token().expect("token"), Token::Close);
        assert_eq!(lexer.next_token().expect("token"), Token::Other('x'));
        assert_eq!(lexer.next_token().expect("token"), Token::Eof);
    }

    #[test]
    fn test_push_back() {
        let mut lexer = new_lexer("(;");
        let token = lexer.next_token().expect("token");
        lexer.push_back(token);
        assert_eq!(lexer.next_token().expect("token"), Token::Open);
        assert_eq!(lexer.next_token().expect("token"), Token::Node);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(value(r"[a\]b]"), "a]b");
        assert_eq!(value(r"[a\\]"), r"a\");
        assert_eq!(value(r"[\a\:b]"), "a:b");
    }

    #[test]
    fn test_linebreaks() {
        assert_eq!(value("[a\nb]"), "a\nb");
        assert_eq!(value("[a\rb]"), "a\nb");
        assert_eq!(value("[a\r\nb]"), "a\nb");
        assert_eq!(value("[a\n\rb]"), "a\nb");
        assert_eq!(value("[a\n\nb]"), "a\n\nb");
        assert_eq!(value("[a\r\n\r\nb]"), "a\n\nb");
    }

    #[test]
    fn test_soft_linebreak() {
        assert_eq!(value("[a\\\nb]"), "ab");
        assert_eq!(value("[a\\\r\nb]"), "ab");
    }

    #[test]
    fn test_line_count() {
        let mut lexer = new_lexer("\r\n\n\r\r;");
        assert_eq!(lexer.next_token().expect("token"), Token::Node);
        assert_eq!(lexer.line(), 4);

        let mut lexer = new_lexer("[x\r\ny]\n;");
        assert_eq!(lexer.next_token().expect("token"), Token::Value);
        assert_eq!(lexer.read_value().expect("value"), "x\ny");
        assert_eq!(lexer.line(), 2);
        assert_eq!(lexer.next_token().expect("token"), Token::Node);
        assert_eq!(lexer.line(), 3);
    }

    #[test]
    fn test_incomplete() {
        let mut lexer = new_lexer("[abc");
        assert_eq!(lexer.next_token().expect("token"), Token::Value);
        assert!(matches!(lexer.read_value(), Err(ErrorKind::ValueIncomplete)));
    }
}
