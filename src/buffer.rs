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

use encoding_rs::{CoderResult, Decoder, Encoding};

pub const CAPACITY: usize = 1 << 14;

/// Decodes a byte stream chunk by chunk and hands out characters.
///
/// A byte order mark at the start selects its encoding and is skipped.
pub(crate) struct CharReader<R> {
    reader: R,
    decoder: Decoder,
    bytes: Box<[u8]>,
    /// Decoded text of the current chunk.
    text: String,
    /// Start of the unconsumed text.
    ///
    /// Never greater than `self.text.len()`, always on a char boundary.
    pos: usize,
    /// Number of bytes read from `reader`.
    consumed: u64,
    eof: bool,
}

impl<R: Read> CharReader<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> CharReader<R> {
        CharReader {
            reader,
            decoder: encoding.new_decoder(),
            bytes: vec![0; CAPACITY].into_boxed_slice(),
            text: String::new(),
            pos: 0,
            consumed: 0,
            eof: false,
        }
    }

    /// Number of bytes read from the underlying reader so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Ensures that there is unconsumed text, unless the end was reached.
    fn fill(&mut self) -> io::Result<bool> {
        while self.pos >= self.text.len() {
            if self.eof {
                return Ok(false);
            }

            let len = match self.reader.read(&mut self.bytes) {
                Ok(len) => len,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            self.consumed += len as u64;
            let last = len == 0;
            self.eof = last;

            self.text.clear();
            self.pos = 0;
            let mut input = &self.bytes[..len];
            loop {
                let needed = self
                    .decoder
                    .max_utf8_buffer_length(input.len())
                    .unwrap_or(CAPACITY * 3);
                self.text.reserve(needed);
                let (result, read, _) = self.decoder.decode_to_string(input, &mut self.text, last);
                input = &input[read..];
                match result {
                    CoderResult::InputEmpty => break,
                    CoderResult::OutputFull => (),
                }
            }
        }
        Ok(true)
    }

    /// Decoded text that is available without reading more input. Empty
    /// only at the end of the stream.
    pub fn remaining(&mut self) -> io::Result<&str> {
        self.fill()?;
        Ok(&self.text[self.pos..])
    }

    /// Discards `n` bytes of [`Self::remaining`].
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.text.is_char_boundary(self.pos + n));
        self.pos = (self.pos + n).min(self.text.len());
    }

    pub fn peek(&mut self) -> io::Result<Option<char>> {
        Ok(self.remaining()?.chars().next())
    }

    pub fn bump(&mut self) -> io::Result<Option<char>> {
        let ch = self.peek()?;
        if let Some(ch) = ch {
            self.consume(ch.len_utf8());
        }
        Ok(ch)
    }
}
