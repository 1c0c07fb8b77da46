//! Cursor-tracked lexing for the ASCII container.
//!
//! Every byte advance updates a row/column cursor so diagnostics point at
//! exact locations. `#` comments and whitespace are transparent to the
//! grammar; string literals take single or triple quotes.

use crate::util::{Error, Result};

/// A source location: row and column are 0-based, offset is a byte index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: u32,
    pub col: u32,
    pub offset: usize,
}

/// Saved lexer state for speculative lookahead.
#[derive(Clone, Copy, Debug)]
pub struct LexState {
    cursor: Cursor,
}

pub struct Lexer<'a> {
    buf: &'a [u8],
    cursor: Cursor,
}

impl<'a> Lexer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            cursor: Cursor::default(),
        }
    }

    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.cursor.offset >= self.buf.len()
    }

    #[inline]
    pub fn save(&self) -> LexState {
        LexState {
            cursor: self.cursor,
        }
    }

    #[inline]
    pub fn restore(&mut self, state: LexState) {
        self.cursor = state.cursor;
    }

    /// Peek the byte under the cursor.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.cursor.offset).copied()
    }

    /// Peek `n` bytes ahead of the cursor.
    #[inline]
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.buf.get(self.cursor.offset + n).copied()
    }

    /// Advance one byte, tracking line and column.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.cursor.offset += 1;
        if b == b'\n' {
            self.cursor.row += 1;
            self.cursor.col = 0;
        } else {
            self.cursor.col += 1;
        }
        Some(b)
    }

    fn error(&self, msg: impl Into<String>) -> Error {
        let c = self.cursor;
        Error::invalid(format!("{} at {}:{}", msg.into(), c.row + 1, c.col + 1))
    }

    /// Skip spaces and tabs (not newlines).
    pub fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\r')) {
            self.bump();
        }
    }

    /// Skip whitespace, newlines and `#...` comments.
    pub fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.bump();
                }
                Some(b'#') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Skip to the end of the current line.
    pub fn skip_until_newline(&mut self) {
        while let Some(b) = self.peek() {
            self.bump();
            if b == b'\n' {
                break;
            }
        }
    }

    /// Consume the expected byte or fail with a located error.
    pub fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.bump();
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected `{}` but found `{}`",
                expected as char, b as char
            ))),
            None => Err(self.error(format!(
                "expected `{}` but found end of input",
                expected as char
            ))),
        }
    }

    /// Consume the byte if it matches.
    pub fn accept(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Check (without consuming) that the next bytes match `s`.
    pub fn looking_at(&self, s: &str) -> bool {
        let bytes = s.as_bytes();
        self.buf[self.cursor.offset.min(self.buf.len())..]
            .starts_with(bytes)
    }

    /// Consume `s` if the input starts with it.
    pub fn accept_str(&mut self, s: &str) -> bool {
        if self.looking_at(s) {
            for _ in 0..s.len() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    /// Identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn read_identifier(&mut self) -> Result<String> {
        let mut out = String::new();
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                out.push(self.bump().unwrap() as char);
            }
            _ => return Err(self.error("expected identifier")),
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                out.push(self.bump().unwrap() as char);
            } else {
                break;
            }
        }
        Ok(out)
    }

    /// Property identifier: identifier segments joined by `:` namespaces,
    /// with an optional trailing `.connect` / `.timeSamples` suffix left
    /// in place for the caller. Also accepts the `!`-wrapped xformOp
    /// sentinels inside quoted contexts (handled by the string reader).
    pub fn read_namespaced_identifier(&mut self) -> Result<String> {
        let mut out = self.read_identifier()?;
        while self.peek() == Some(b':') {
            self.bump();
            out.push(':');
            out.push_str(&self.read_identifier()?);
        }
        Ok(out)
    }

    /// Path literal: `<` up to the matching `>`.
    pub fn read_path_identifier(&mut self) -> Result<String> {
        self.expect(b'<')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(b'>') => break,
                Some(b) => out.push(b as char),
                None => return Err(self.error("unterminated path literal")),
            }
        }
        Ok(out)
    }

    /// Asset path literal: `@...@` or `@@@...@@@`.
    pub fn read_asset_path(&mut self) -> Result<String> {
        let triple = self.looking_at("@@@");
        let delim: &str = if triple { "@@@" } else { "@" };
        if !self.accept_str(delim) {
            return Err(self.error("expected asset path literal"));
        }
        let mut out = String::new();
        loop {
            if self.accept_str(delim) {
                break;
            }
            match self.bump() {
                Some(b) => out.push(b as char),
                None => return Err(self.error("unterminated asset path literal")),
            }
        }
        Ok(out)
    }

    /// String literal with `"` or `'` delimiters, or their triple forms.
    /// Escapes: `\n \t \r \" \' \\ \xHH`.
    pub fn read_string_literal(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(b @ b'"') | Some(b @ b'\'') => b,
            _ => return Err(self.error("expected string literal")),
        };
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let delim_len = if triple { 3 } else { 1 };
        for _ in 0..delim_len {
            self.bump();
        }

        let mut out = String::new();
        loop {
            if triple {
                if self.peek() == Some(quote)
                    && self.peek_at(1) == Some(quote)
                    && self.peek_at(2) == Some(quote)
                {
                    for _ in 0..3 {
                        self.bump();
                    }
                    break;
                }
            } else if self.peek() == Some(quote) {
                self.bump();
                break;
            }
            match self.bump() {
                Some(b'\\') => {
                    let esc = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated escape"))?;
                    match esc {
                        b'n' => out.push('\n'),
                        b't' => out.push('\t'),
                        b'r' => out.push('\r'),
                        b'"' => out.push('"'),
                        b'\'' => out.push('\''),
                        b'\\' => out.push('\\'),
                        b'x' => {
                            let hi = self
                                .bump()
                                .ok_or_else(|| self.error("truncated \\x escape"))?;
                            let lo = self
                                .bump()
                                .ok_or_else(|| self.error("truncated \\x escape"))?;
                            let hex = [hi, lo];
                            let s = std::str::from_utf8(&hex)
                                .map_err(|_| self.error("bad \\x escape"))?;
                            let v = u8::from_str_radix(s, 16)
                                .map_err(|_| self.error("bad \\x escape"))?;
                            out.push(v as char);
                        }
                        other => {
                            return Err(
                                self.error(format!("unknown escape `\\{}`", other as char))
                            )
                        }
                    }
                }
                Some(b'\n') if !triple => {
                    return Err(self.error("newline in single-quoted string"))
                }
                Some(b) => out.push(b as char),
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(out)
    }

    /// Lex a numeric literal into its source text. Accepts a leading
    /// sign, decimal digits, one `.`, an exponent, and the non-finite
    /// spellings `inf`, `-inf`, `nan`.
    pub fn lex_number(&mut self) -> Result<String> {
        let mut out = String::new();
        if self.peek() == Some(b'-') || self.peek() == Some(b'+') {
            out.push(self.bump().unwrap() as char);
        }

        if self.looking_at("inf") {
            self.accept_str("inf");
            out.push_str("inf");
            return Ok(out);
        }
        if self.looking_at("nan") {
            self.accept_str("nan");
            out.push_str("nan");
            return Ok(out);
        }

        let mut has_digits = false;
        let mut has_dot = false;
        let mut has_exp = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {
                    has_digits = true;
                    out.push(self.bump().unwrap() as char);
                }
                b'.' if !has_dot && !has_exp => {
                    has_dot = true;
                    out.push(self.bump().unwrap() as char);
                }
                b'e' | b'E' if has_digits && !has_exp => {
                    has_exp = true;
                    out.push(self.bump().unwrap() as char);
                    if self.peek() == Some(b'-') || self.peek() == Some(b'+') {
                        out.push(self.bump().unwrap() as char);
                    }
                }
                _ => break,
            }
        }
        if !has_digits {
            return Err(self.error("expected number"));
        }
        Ok(out)
    }

    /// Parse a numeric literal as f64 (`inf`/`nan` included).
    pub fn read_f64(&mut self) -> Result<f64> {
        let text = self.lex_number()?;
        match text.as_str() {
            "inf" | "+inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" | "-nan" | "+nan" => Ok(f64::NAN),
            t => t
                .parse::<f64>()
                .map_err(|_| self.error(format!("malformed number `{}`", t))),
        }
    }

    /// Parse a numeric literal as i64 (no fraction or exponent allowed).
    pub fn read_i64(&mut self) -> Result<i64> {
        let text = self.lex_number()?;
        text.parse::<i64>()
            .map_err(|_| self.error(format!("malformed integer `{}`", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracking() {
        let mut lex = Lexer::new(b"ab\ncd");
        lex.bump();
        lex.bump();
        assert_eq!(lex.cursor().row, 0);
        lex.bump(); // newline
        assert_eq!(lex.cursor().row, 1);
        assert_eq!(lex.cursor().col, 0);
        lex.bump();
        assert_eq!(lex.cursor().col, 1);
    }

    #[test]
    fn test_skip_comments() {
        let mut lex = Lexer::new(b"  # a comment\n  x");
        lex.skip_whitespace_and_comments();
        assert_eq!(lex.peek(), Some(b'x'));
    }

    #[test]
    fn test_identifiers() {
        let mut lex = Lexer::new(b"xformOp:translate:pivot rest");
        assert_eq!(
            lex.read_namespaced_identifier().unwrap(),
            "xformOp:translate:pivot"
        );

        let mut lex = Lexer::new(b"9bad");
        assert!(lex.read_identifier().is_err());
    }

    #[test]
    fn test_string_literals() {
        let mut lex = Lexer::new(br#""hello \"world\"\n""#);
        assert_eq!(lex.read_string_literal().unwrap(), "hello \"world\"\n");

        let mut lex = Lexer::new(br#""""multi
line""""#);
        assert_eq!(lex.read_string_literal().unwrap(), "multi\nline");

        let mut lex = Lexer::new(br#""\x41""#);
        assert_eq!(lex.read_string_literal().unwrap(), "A");
    }

    #[test]
    fn test_numbers() {
        let mut lex = Lexer::new(b"-12.5e3");
        assert_eq!(lex.read_f64().unwrap(), -12.5e3);

        let mut lex = Lexer::new(b"inf");
        assert_eq!(lex.read_f64().unwrap(), f64::INFINITY);

        let mut lex = Lexer::new(b"-inf");
        assert_eq!(lex.read_f64().unwrap(), f64::NEG_INFINITY);

        let mut lex = Lexer::new(b"nan");
        assert!(lex.read_f64().unwrap().is_nan());

        let mut lex = Lexer::new(b"42");
        assert_eq!(lex.read_i64().unwrap(), 42);
    }

    #[test]
    fn test_path_and_asset_literals() {
        let mut lex = Lexer::new(b"</Mat/Tex.outputs:rgb>");
        assert_eq!(lex.read_path_identifier().unwrap(), "/Mat/Tex.outputs:rgb");

        let mut lex = Lexer::new(b"@./tex/wood.png@");
        assert_eq!(lex.read_asset_path().unwrap(), "./tex/wood.png");
    }

    #[test]
    fn test_save_restore() {
        let mut lex = Lexer::new(b"abc def");
        let saved = lex.save();
        lex.read_identifier().unwrap();
        lex.restore(saved);
        assert_eq!(lex.read_identifier().unwrap(), "abc");
    }
}
