//! `Begin <Name> [args]` / `End <Name>` block recognition.
//!
//! [`BlockReader`] layers block-level statements and typed token parsing on
//! top of the [`Scanner`]. Every entity-block loop in the crate has the same
//! shape:
//!
//! ```text
//! loop {
//!     let word = blocks.expect_word("Nodes")?;
//!     if blocks.check_end_block("Nodes", &word)? { break; }
//!     // parse one fixed-arity record starting with `word`
//! }
//! ```

use crate::io::scanner::Scanner;
use crate::mesh_error::{MeshIoError, ParseError, ParseErrorKind};
use std::io::{self, BufRead, Seek};
use std::str::FromStr;

pub(crate) const BEGIN: &str = "Begin";
pub(crate) const END: &str = "End";

/// Block-aware reader over a `.mdpa` stream.
#[derive(Debug)]
pub struct BlockReader<R> {
    scanner: Scanner<R>,
}

impl<R: BufRead + Seek> BlockReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            scanner: Scanner::new(source),
        }
    }

    /// Line of the most recently read token.
    #[inline]
    pub fn line(&self) -> usize {
        self.scanner.word_line()
    }

    pub fn rewind(&mut self) -> Result<(), MeshIoError> {
        self.scanner.rewind()?;
        Ok(())
    }

    pub fn scanner_mut(&mut self) -> &mut Scanner<R> {
        &mut self.scanner
    }

    pub fn into_inner(self) -> R {
        self.scanner.into_inner()
    }

    /// Build a diagnostic located at the last token.
    pub fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, self.line(), message)
    }

    /// Scanner result with undecodable text turned into a located diagnostic.
    fn scanned<T>(&self, result: io::Result<T>) -> Result<T, MeshIoError> {
        result.map_err(|err| match err.kind() {
            io::ErrorKind::InvalidData => ParseError::new(
                ParseErrorKind::InvalidValue,
                self.scanner.line(),
                format!("token is not valid UTF-8: {err}"),
            )
            .into(),
            _ => err.into(),
        })
    }

    /// Next word, or `None` at end of stream.
    pub fn next_word(&mut self) -> Result<Option<String>, MeshIoError> {
        let word = self.scanner.next_word();
        self.scanned(word)
    }

    /// Next word inside block `context`; end of stream is a grammar error.
    pub fn expect_word(&mut self, context: &str) -> Result<String, MeshIoError> {
        match self.next_word()? {
            Some(word) => Ok(word),
            None => Err(self.eof_error(context).into()),
        }
    }

    /// Next bracketed or quoted value (see [`Scanner::next_bracketed`]).
    pub fn expect_bracketed(&mut self, context: &str) -> Result<String, MeshIoError> {
        let text = self.scanner.next_bracketed();
        match self.scanned(text)? {
            Some(text) => Ok(text),
            None => Err(self.eof_error(context).into()),
        }
    }

    fn eof_error(&self, context: &str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedEof,
            self.scanner.line(),
            format!("stream ended inside block `{context}`"),
        )
        .with_tokens(format!("{END} {context}"), "<end of input>")
    }

    /// `previous` must be the literal `Begin`; returns the block name after it.
    pub fn read_block_name(&mut self, previous: &str) -> Result<String, MeshIoError> {
        if previous != BEGIN {
            return Err(self
                .error(ParseErrorKind::Grammar, "a block must start with `Begin`")
                .with_tokens(BEGIN, previous)
                .into());
        }
        self.expect_word(BEGIN)
    }

    /// Exit test for entity loops. When `word` is `End`, the following word
    /// must be `name`.
    pub fn check_end_block(&mut self, name: &str, word: &str) -> Result<bool, MeshIoError> {
        if word != END {
            return Ok(false);
        }
        let closing = self.expect_word(name)?;
        if closing != name {
            return Err(self
                .error(ParseErrorKind::Grammar, "block closed with a different name")
                .with_tokens(format!("{END} {name}"), format!("{END} {closing}"))
                .into());
        }
        Ok(true)
    }

    /// Discard everything up to the `End name` matching the current nesting
    /// level. Only the balance of nested `Begin`/`End` pairs is tracked.
    pub fn skip_block(&mut self, name: &str) -> Result<(), MeshIoError> {
        let mut nesting = 0usize;
        loop {
            let word = self.expect_word(name)?;
            if word == BEGIN {
                nesting += 1;
            } else if word == END {
                if nesting == 0 {
                    let closing = self.expect_word(name)?;
                    if closing != name {
                        return Err(self
                            .error(ParseErrorKind::Grammar, "skipped block closed with a different name")
                            .with_tokens(format!("{END} {name}"), format!("{END} {closing}"))
                            .into());
                    }
                    return Ok(());
                }
                nesting -= 1;
            }
        }
    }

    /// Collect every word of a block body up to its matching `End name`,
    /// nested blocks included.
    pub fn read_block_words(&mut self, name: &str) -> Result<Vec<String>, MeshIoError> {
        let mut nesting = 0usize;
        let mut words = Vec::new();
        loop {
            let word = self.expect_word(name)?;
            if word == BEGIN {
                nesting += 1;
            } else if word == END {
                if nesting == 0 {
                    self.check_end_block(name, &word)?;
                    return Ok(words);
                }
                nesting -= 1;
            }
            words.push(word);
        }
    }

    /// Parse `word` as `T`, reporting `what` on failure.
    pub fn parse<T: FromStr>(&self, word: &str, what: &str) -> Result<T, MeshIoError> {
        word.parse::<T>().map_err(|_| {
            self.error(ParseErrorKind::InvalidValue, format!("invalid {what}"))
                .with_found(word)
                .into()
        })
    }

    /// Parse a 1-based id.
    pub fn parse_id(&self, word: &str, what: &str) -> Result<u64, MeshIoError> {
        let id: u64 = self.parse(word, what)?;
        if id == 0 {
            return Err(self
                .error(ParseErrorKind::MissingId, format!("{what} must be 1-based"))
                .with_found(word)
                .into());
        }
        Ok(id)
    }

    /// Read the next word of block `context` as an id.
    pub fn read_id(&mut self, context: &str, what: &str) -> Result<u64, MeshIoError> {
        let word = self.expect_word(context)?;
        self.parse_id(&word, what)
    }

    /// Read the next word of block `context` as `T`.
    pub fn read<T: FromStr>(&mut self, context: &str, what: &str) -> Result<T, MeshIoError> {
        let word = self.expect_word(context)?;
        self.parse(&word, what)
    }

    /// Read a `0`/`1` (or `false`/`true`) flag.
    pub fn read_flag(&mut self, context: &str, what: &str) -> Result<bool, MeshIoError> {
        let word = self.expect_word(context)?;
        parse_bool(&word).ok_or_else(|| {
            self.error(ParseErrorKind::InvalidValue, format!("invalid {what}"))
                .with_found(word)
                .into()
        })
    }
}

pub(crate) fn parse_bool(word: &str) -> Option<bool> {
    match word {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> BlockReader<Cursor<&[u8]>> {
        BlockReader::new(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn nested_skip_consumes_exactly_one_block() {
        let mut r = reader("Begin Foo\nBegin Bar\nEnd Bar\nEnd Foo\nBegin Nodes\nEnd Nodes\n");
        let begin = r.expect_word("top").unwrap();
        let name = r.read_block_name(&begin).unwrap();
        assert_eq!(name, "Foo");
        r.skip_block(&name).unwrap();
        let begin = r.expect_word("top").unwrap();
        assert_eq!(r.read_block_name(&begin).unwrap(), "Nodes");
        let word = r.expect_word("Nodes").unwrap();
        assert!(r.check_end_block("Nodes", &word).unwrap());
        assert_eq!(r.next_word().unwrap(), None);
    }

    #[test]
    fn skip_tolerates_differently_named_nesting() {
        let mut r = reader("Begin A x End B Begin B y End C z End Foo tail");
        r.skip_block("Foo").unwrap();
        assert_eq!(r.next_word().unwrap().as_deref(), Some("tail"));
    }

    #[test]
    fn undecodable_token_is_an_invalid_value_with_line() {
        let mut r = BlockReader::new(Cursor::new(&b"Begin Nodes\n1 \xe9 0 0\n"[..]));
        r.expect_word("top").unwrap();
        r.expect_word("top").unwrap();
        r.expect_word("Nodes").unwrap();
        let err = r.expect_word("Nodes").unwrap_err();
        let parse = err.as_parse().expect("parse error");
        assert_eq!(parse.kind, ParseErrorKind::InvalidValue);
        assert_eq!(parse.line, 2);
    }

    #[test]
    fn mismatched_end_is_a_grammar_error_with_line() {
        let mut r = reader("1 2\n3\nEnd Elements\n");
        for _ in 0..3 {
            let w = r.expect_word("Nodes").unwrap();
            assert!(!r.check_end_block("Nodes", &w).unwrap());
        }
        let w = r.expect_word("Nodes").unwrap();
        let err = r.check_end_block("Nodes", &w).unwrap_err();
        let parse = err.as_parse().expect("parse error");
        assert_eq!(parse.kind, ParseErrorKind::Grammar);
        assert_eq!(parse.line, 3);
        assert_eq!(parse.expected.as_deref(), Some("End Nodes"));
        assert_eq!(parse.found.as_deref(), Some("End Elements"));
    }

    #[test]
    fn block_name_requires_begin() {
        let mut r = reader("Nodes");
        let err = r.read_block_name("Start").unwrap_err();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::Grammar));
    }

    #[test]
    fn eof_inside_skip_is_reported() {
        let mut r = reader("Begin Bar End Bar");
        let err = r.skip_block("Foo").unwrap_err();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn zero_id_is_rejected() {
        let r = reader("");
        let err = r.parse_id("0", "node id").unwrap_err();
        assert_eq!(err.parse_kind(), Some(ParseErrorKind::MissingId));
        assert_eq!(r.parse_id("17", "node id").unwrap(), 17);
    }
}
