use crate::error::{ParseError, ParseResult};
use std::ops::Range;

/// String literal token; ranges index the source, `content` excludes quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct StringToken {
    pub full: Range<usize>,
    pub content: Range<usize>,
}

/// Template literal token split at `${...}` interpolations.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateToken {
    pub full: Range<usize>,
    pub chunks: Vec<Range<usize>>,
    pub exprs: Vec<Range<usize>>,
}

/// Cursor over markup/script source.
///
/// The grammar is modal: script code, JSX children and template literals
/// follow different lexical rules, so this is a hand-rolled scanner the
/// parser drives mode-by-mode rather than a fixed token stream. All ranges
/// are byte offsets into the original source; scanning only ever stops at
/// ASCII bytes, which keeps slicing UTF-8 safe.
pub struct Tokenizer<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
}

impl<'src> Tokenizer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    pub fn source(&self) -> &'src str {
        self.src
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.bytes.len());
        self.pos = pos;
    }

    pub fn slice(&self, range: Range<usize>) -> &'src str {
        &self.src[range]
    }

    fn byte(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    /// First non-trivia offset at or after `from`. Trivia is whitespace and
    /// `//` / `/* */` comments; an unterminated block comment runs to EOF
    /// and surfaces later as an end-of-file error.
    fn trivia_end(&self, from: usize) -> usize {
        let mut p = from;
        loop {
            match self.byte(p) {
                Some(b) if b.is_ascii_whitespace() => p += 1,
                Some(b'/') if self.byte(p + 1) == Some(b'/') => {
                    while let Some(b) = self.byte(p) {
                        if b == b'\n' {
                            break;
                        }
                        p += 1;
                    }
                }
                Some(b'/') if self.byte(p + 1) == Some(b'*') => {
                    p += 2;
                    while p < self.bytes.len() {
                        if self.byte(p) == Some(b'*') && self.byte(p + 1) == Some(b'/') {
                            p += 2;
                            break;
                        }
                        p += 1;
                    }
                }
                _ => return p,
            }
        }
    }

    pub fn skip_trivia(&mut self) {
        self.pos = self.trivia_end(self.pos);
    }

    /// Next meaningful byte without consuming anything.
    pub fn peek_nontrivia(&self) -> Option<u8> {
        self.byte(self.trivia_end(self.pos))
    }

    /// Raw byte at the cursor, trivia included.
    pub fn peek_raw(&self) -> Option<u8> {
        self.byte(self.pos)
    }

    pub fn at_end(&self) -> bool {
        self.trivia_end(self.pos) >= self.bytes.len()
    }

    /// True when the next meaningful bytes are exactly `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        let p = self.trivia_end(self.pos);
        self.src[p..].starts_with(s)
    }

    pub fn eat_char(&mut self, c: u8) -> bool {
        let p = self.trivia_end(self.pos);
        if self.byte(p) == Some(c) {
            self.pos = p + 1;
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, s: &str) -> bool {
        let p = self.trivia_end(self.pos);
        if self.src[p..].starts_with(s) {
            self.pos = p + s.len();
            true
        } else {
            false
        }
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_' || b == b'$'
    }

    fn is_ident_continue(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
    }

    pub fn eat_ident(&mut self) -> Option<Range<usize>> {
        self.eat_word(Self::is_ident_continue)
    }

    /// JSX names additionally allow dashes (`data-*` attributes, custom
    /// elements).
    pub fn eat_jsx_ident(&mut self) -> Option<Range<usize>> {
        self.eat_word(|b| Self::is_ident_continue(b) || b == b'-')
    }

    fn eat_word(&mut self, cont: impl Fn(u8) -> bool) -> Option<Range<usize>> {
        let start = self.trivia_end(self.pos);
        if !Self::is_ident_start(self.byte(start)?) {
            return None;
        }
        let mut end = start + 1;
        while self.byte(end).is_some_and(&cont) {
            end += 1;
        }
        self.pos = end;
        Some(start..end)
    }

    pub fn peek_keyword(&self, kw: &str) -> bool {
        let p = self.trivia_end(self.pos);
        self.src[p..].starts_with(kw)
            && !self
                .byte(p + kw.len())
                .is_some_and(Self::is_ident_continue)
    }

    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos = self.trivia_end(self.pos) + kw.len();
            true
        } else {
            false
        }
    }

    pub fn eat_number(&mut self) -> Option<Range<usize>> {
        let start = self.trivia_end(self.pos);
        let mut p = start;
        if self.byte(p) == Some(b'-') {
            p += 1;
        }
        if !self.byte(p).is_some_and(|b| b.is_ascii_digit()) {
            return None;
        }
        while self
            .byte(p)
            .is_some_and(|b| b.is_ascii_digit() || b == b'.')
        {
            p += 1;
        }
        self.pos = p;
        Some(start..p)
    }

    /// Single- or double-quoted string, or `None` when not at a quote.
    pub fn eat_string(&mut self) -> ParseResult<Option<StringToken>> {
        let start = self.trivia_end(self.pos);
        let quote = match self.byte(start) {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Ok(None),
        };
        let mut p = start + 1;
        loop {
            match self.byte(p) {
                None | Some(b'\n') => {
                    return Err(ParseError::invalid_syntax(start, "unterminated string literal"))
                }
                Some(b'\\') => p += 2,
                Some(b) if b == quote => {
                    self.pos = p + 1;
                    return Ok(Some(StringToken {
                        full: start..p + 1,
                        content: start + 1..p,
                    }));
                }
                Some(_) => p += 1,
            }
        }
    }

    /// Template literal starting at the next backtick.
    pub fn scan_template(&mut self) -> ParseResult<TemplateToken> {
        let start = self.trivia_end(self.pos);
        if self.byte(start) != Some(b'`') {
            return Err(ParseError::unexpected_token(
                start,
                "`",
                preview(self.src, start),
            ));
        }
        self.pos = start + 1;
        let mut chunks = Vec::new();
        let mut exprs = Vec::new();
        let mut chunk_start = self.pos;
        loop {
            match self.byte(self.pos) {
                None => return Err(ParseError::unexpected_eof(self.pos)),
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    chunks.push(chunk_start..self.pos);
                    self.pos += 1;
                    return Ok(TemplateToken {
                        full: start..self.pos,
                        chunks,
                        exprs,
                    });
                }
                Some(b'$') if self.byte(self.pos + 1) == Some(b'{') => {
                    chunks.push(chunk_start..self.pos);
                    self.pos += 2;
                    let expr = self.scan_delimited(b'}')?;
                    exprs.push(expr);
                    chunk_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Raw JSX text: everything up to the next `<`, `{` or EOF. No trivia
    /// skipping; the text is the node.
    pub fn scan_jsx_text(&mut self) -> Range<usize> {
        let start = self.pos;
        while let Some(b) = self.byte(self.pos) {
            if b == b'<' || b == b'{' {
                break;
            }
            self.pos += 1;
        }
        start..self.pos
    }

    /// Skips one string/template/comment atom at the cursor; returns whether
    /// anything was consumed. Used by the balanced scanners so brackets and
    /// stop characters inside literals are never miscounted.
    fn skip_atom(&mut self) -> ParseResult<bool> {
        match self.byte(self.pos) {
            Some(b'"' | b'\'') => {
                self.eat_string()?;
                Ok(true)
            }
            Some(b'`') => {
                self.scan_template()?;
                Ok(true)
            }
            Some(b'/') if matches!(self.byte(self.pos + 1), Some(b'/') | Some(b'*')) => {
                self.pos = self.trivia_end(self.pos);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Scans forward until one of `stops` appears outside any bracket
    /// nesting. An unbalanced `)`, `]` or `}` also ends the scan (before the
    /// byte). The stop byte is consumed only when `include_stop` is set, and
    /// is part of the returned range in that case.
    pub fn scan_until(
        &mut self,
        stops: &[u8],
        include_stop: bool,
        allow_eof: bool,
    ) -> ParseResult<Range<usize>> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            if self.pos >= self.bytes.len() {
                if allow_eof {
                    return Ok(start..self.pos);
                }
                return Err(ParseError::unexpected_eof(self.pos));
            }
            if self.skip_atom()? {
                continue;
            }
            let b = self.bytes[self.pos];
            if depth == 0 && stops.contains(&b) {
                if include_stop {
                    self.pos += 1;
                    return Ok(start..self.pos);
                }
                return Ok(start..self.pos);
            }
            match b {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        return Ok(start..self.pos);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// A raw statement: consumed through its terminating `;`, or up to an
    /// enclosing close bracket / EOF.
    pub fn scan_raw_statement(&mut self) -> ParseResult<Range<usize>> {
        self.scan_until(&[b';'], true, true)
    }

    /// Scans the inside of a bracketed region whose opener was already
    /// consumed; consumes the matching `close` but excludes it from the
    /// returned range.
    pub fn scan_delimited(&mut self, close: u8) -> ParseResult<Range<usize>> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            if self.pos >= self.bytes.len() {
                return Err(ParseError::unexpected_eof(self.pos));
            }
            if self.skip_atom()? {
                continue;
            }
            let b = self.bytes[self.pos];
            match b {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        if b == close {
                            let range = start..self.pos;
                            self.pos += 1;
                            return Ok(range);
                        }
                        return Err(ParseError::unexpected_token(
                            self.pos,
                            char::from(close),
                            char::from(b),
                        ));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }
}

/// Short preview of the source at a position, for error messages.
pub(crate) fn preview(src: &str, pos: usize) -> String {
    if pos >= src.len() {
        return "end of file".to_string();
    }
    let rest = &src[pos..];
    let end = rest
        .char_indices()
        .take_while(|(i, c)| *i < 12 && *c != '\n')
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    if end == 0 {
        return "end of line".to_string();
    }
    rest[..end].to_string()
}
