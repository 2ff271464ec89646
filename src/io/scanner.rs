//! Character/word scanner for `.mdpa` streams.
//!
//! The scanner is the only layer that touches raw bytes. It elides `//` line
//! comments and `/* */` block comments at the character level, so nothing
//! above it ever observes comment text, and it counts every newline it
//! consumes (including those swallowed inside comments) for diagnostics.
//!
//! End of stream is reported as `None` rather than as an error; the block
//! layer decides whether running out of input is fatal.

use std::io::{self, BufRead, Seek, SeekFrom};

/// Forward-only tokenizer over a seekable buffered source.
#[derive(Debug)]
pub struct Scanner<R> {
    source: R,
    line: usize,
    word_line: usize,
}

impl<R: BufRead + Seek> Scanner<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            line: 1,
            word_line: 1,
        }
    }

    /// Current 1-based line of the read position.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Line on which the most recently read word started.
    #[inline]
    pub fn word_line(&self) -> usize {
        self.word_line
    }

    /// Reset to the origin of the stream for a fresh top-level pass.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.source.seek(SeekFrom::Start(0))?;
        self.line = 1;
        self.word_line = 1;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.source.fill_buf()?;
        Ok(buf.first().copied())
    }

    fn raw_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if let Some(b) = byte {
            self.source.consume(1);
            if b == b'\n' {
                self.line += 1;
            }
        }
        Ok(byte)
    }

    /// Next byte with comments removed.
    ///
    /// A line comment reads as the newline that terminates it; a block
    /// comment reads as a single blank, so comments always separate tokens.
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let Some(byte) = self.raw_byte()? else {
            return Ok(None);
        };
        if byte != b'/' {
            return Ok(Some(byte));
        }
        match self.peek_byte()? {
            Some(b'/') => {
                while let Some(b) = self.raw_byte()? {
                    if b == b'\n' {
                        return Ok(Some(b'\n'));
                    }
                }
                Ok(None)
            }
            Some(b'*') => {
                self.source.consume(1);
                loop {
                    match self.raw_byte()? {
                        None => return Ok(None),
                        Some(b'*') if self.peek_byte()? == Some(b'/') => {
                            self.source.consume(1);
                            return Ok(Some(b' '));
                        }
                        Some(_) => {}
                    }
                }
            }
            _ => Ok(Some(b'/')),
        }
    }

    fn skip_blank(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.next_byte()? {
                Some(b) if b.is_ascii_whitespace() => continue,
                other => return Ok(other),
            }
        }
    }

    /// Decode the character starting with `lead`, reading its continuation bytes.
    fn finish_char(&mut self, lead: u8) -> io::Result<char> {
        let width = match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        let mut bytes = vec![lead];
        for _ in 1..width {
            match self.raw_byte()? {
                Some(b) => bytes.push(b),
                None => break,
            }
        }
        let text = utf8(bytes)?;
        text.chars()
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty character"))
    }

    /// Next character with comments removed.
    pub fn next_char(&mut self) -> io::Result<Option<char>> {
        match self.next_byte()? {
            Some(lead) => self.finish_char(lead).map(Some),
            None => Ok(None),
        }
    }

    /// Skip whitespace and return the first significant character.
    pub fn skip_whitespace(&mut self) -> io::Result<Option<char>> {
        match self.skip_blank()? {
            Some(lead) => self.finish_char(lead).map(Some),
            None => Ok(None),
        }
    }

    /// Bytes up to the next whitespace, appended to `bytes`.
    fn rest_of_word(&mut self, bytes: &mut Vec<u8>) -> io::Result<()> {
        while let Some(b) = self.next_byte()? {
            if b.is_ascii_whitespace() {
                break;
            }
            bytes.push(b);
        }
        Ok(())
    }

    /// Next maximal run of non-whitespace characters.
    pub fn next_word(&mut self) -> io::Result<Option<String>> {
        let Some(first) = self.skip_blank()? else {
            return Ok(None);
        };
        self.word_line = self.line;
        let mut bytes = vec![first];
        self.rest_of_word(&mut bytes)?;
        utf8(bytes).map(Some)
    }

    /// Read one value token that may contain whitespace.
    ///
    /// A bracketed value such as `[3](1.0, 2.0, 3.0)` or `[2,2]((1,2),(3,4))`
    /// runs from the opening `[` to the `)` that balances the first `(`, and
    /// is returned with whitespace removed. A quoted string runs verbatim up
    /// to the closing `"`, quotes included. Anything else reads as a word.
    /// `None` at end of stream, also inside an unterminated string.
    pub fn next_bracketed(&mut self) -> io::Result<Option<String>> {
        let Some(first) = self.skip_blank()? else {
            return Ok(None);
        };
        self.word_line = self.line;
        let mut bytes = vec![first];
        match first {
            b'"' => loop {
                match self.raw_byte()? {
                    None => return Ok(None),
                    Some(b'"') => {
                        bytes.push(b'"');
                        break;
                    }
                    Some(b) => bytes.push(b),
                }
            },
            b'[' => {
                let mut depth = 0usize;
                let mut opened = false;
                while let Some(b) = self.next_byte()? {
                    if b.is_ascii_whitespace() {
                        continue;
                    }
                    bytes.push(b);
                    match b {
                        b'(' => {
                            depth += 1;
                            opened = true;
                        }
                        b')' => {
                            depth = depth.saturating_sub(1);
                            if opened && depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => self.rest_of_word(&mut bytes)?,
        }
        utf8(bytes).map(Some)
    }
}

/// Token bytes as text; invalid UTF-8 is reported as `InvalidData`.
fn utf8(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scanner(text: &str) -> Scanner<Cursor<&[u8]>> {
        Scanner::new(Cursor::new(text.as_bytes()))
    }

    fn words(text: &str) -> Vec<String> {
        let mut s = scanner(text);
        let mut out = Vec::new();
        while let Some(w) = s.next_word().unwrap() {
            out.push(w);
        }
        out
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("  Begin\tNodes\n1 0.0  0.0\r\n"), [
            "Begin", "Nodes", "1", "0.0", "0.0"
        ]);
    }

    #[test]
    fn comments_are_transparent() {
        assert_eq!(words("a // line comment\nb /* block\ncomment */ c/*x*/d"), [
            "a", "b", "c", "d"
        ]);
        assert_eq!(words("x/y"), ["x/y"]);
    }

    #[test]
    fn newlines_inside_comments_advance_line_counter() {
        let mut s = scanner("a\n/* one\ntwo\n*/ b // tail\nc");
        assert_eq!(s.next_word().unwrap().as_deref(), Some("a"));
        assert_eq!(s.word_line(), 1);
        assert_eq!(s.next_word().unwrap().as_deref(), Some("b"));
        assert_eq!(s.word_line(), 4);
        assert_eq!(s.next_word().unwrap().as_deref(), Some("c"));
        assert_eq!(s.word_line(), 5);
        assert_eq!(s.next_word().unwrap(), None);
    }

    #[test]
    fn bracketed_values_ignore_inner_whitespace() {
        let mut s = scanner("[3] ( 1.0, 2.0,\n 3.0 ) next [2,2]((1,2),(3,4))");
        assert_eq!(s.next_bracketed().unwrap().as_deref(), Some("[3](1.0,2.0,3.0)"));
        assert_eq!(s.next_word().unwrap().as_deref(), Some("next"));
        assert_eq!(
            s.next_bracketed().unwrap().as_deref(),
            Some("[2,2]((1,2),(3,4))")
        );
    }

    #[test]
    fn quoted_values_keep_inner_whitespace_and_slashes() {
        let mut s = scanner("\"stainless  steel\" \"a//b /*c*/\"\nnext \"open");
        assert_eq!(
            s.next_bracketed().unwrap().as_deref(),
            Some("\"stainless  steel\"")
        );
        assert_eq!(s.next_bracketed().unwrap().as_deref(), Some("\"a//b /*c*/\""));
        assert_eq!(s.next_word().unwrap().as_deref(), Some("next"));
        assert_eq!(s.word_line(), 2);
        assert_eq!(s.next_bracketed().unwrap(), None);
    }

    #[test]
    fn multibyte_characters_survive() {
        assert_eq!(words("\"acier-\u{3b1}\" \u{e9}t\u{e9}"), [
            "\"acier-\u{3b1}\"",
            "\u{e9}t\u{e9}"
        ]);
        let mut s = scanner("  \u{3b1}b");
        assert_eq!(s.skip_whitespace().unwrap(), Some('\u{3b1}'));
        assert_eq!(s.next_char().unwrap(), Some('b'));
    }

    #[test]
    fn invalid_utf8_is_invalid_data() {
        let mut s = Scanner::new(Cursor::new(&b"ok \xff\xfe"[..]));
        assert_eq!(s.next_word().unwrap().as_deref(), Some("ok"));
        let err = s.next_word().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn rewind_restarts_counting() {
        let mut s = scanner("a\nb\n");
        s.next_word().unwrap();
        s.next_word().unwrap();
        s.rewind().unwrap();
        assert_eq!(s.line(), 1);
        assert_eq!(s.next_word().unwrap().as_deref(), Some("a"));
    }
}
