//! @ai:module:intent Tokenize Go source bytes with byte offsets and line numbers
//! @ai:module:layer infrastructure
//! @ai:module:public_api tokenize, Token, TokenKind, SyntaxError
//! @ai:module:stateless true

use std::ops::Range;
use thiserror::Error;

/// @ai:intent Lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    String,
    RawString,
    Rune,
    LineComment,
    BlockComment,
    Punct,
}

/// @ai:intent A token located by byte span and by the lines it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub end_line: usize,
}

impl Token {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn text<'a>(&self, src: &'a [u8]) -> &'a [u8] {
        &src[self.start..self.end]
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_punct(&self, src: &[u8], c: u8) -> bool {
        self.kind == TokenKind::Punct && src[self.start] == c
    }

    pub fn is_ident(&self, src: &[u8], name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(src) == name.as_bytes()
    }

    /// @ai:intent Whether a line break after this token terminates a declaration
    /// @ai:effects pure
    pub fn ends_line(&self, src: &[u8]) -> bool {
        match self.kind {
            TokenKind::Ident
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::RawString
            | TokenKind::Rune => true,
            TokenKind::Punct => matches!(src[self.start], b')' | b']' | b'}'),
            TokenKind::LineComment | TokenKind::BlockComment => false,
        }
    }
}

/// @ai:intent Malformed source detected while scanning
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// @ai:intent Split Go source into tokens, keeping comments
/// @ai:pre src is the complete contents of one file
/// @ai:post tokens are in ascending, non-overlapping byte order
/// @ai:effects pure
pub fn tokenize(src: &[u8]) -> Result<Vec<Token>, SyntaxError> {
    let pos = if src.starts_with(BYTE_ORDER_MARK) { BYTE_ORDER_MARK.len() } else { 0 };
    Lexer { src, pos, line: 1 }.run()
}

const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        while let Some(&b) = self.src.get(self.pos) {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                _ => tokens.push(self.token(b)?),
            }
        }

        Ok(tokens)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn token(&mut self, b: u8) -> Result<Token, SyntaxError> {
        let start = self.pos;
        let line = self.line;

        let kind = match b {
            b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
            b'/' if self.peek(1) == Some(b'*') => self.block_comment(line)?,
            b'"' => self.quoted(b'"', TokenKind::String, line)?,
            b'\'' => self.quoted(b'\'', TokenKind::Rune, line)?,
            b'`' => self.raw_string(line)?,
            b'0'..=b'9' => self.number(),
            b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            _ if is_ident_start(b) => {
                while self.peek(0).is_some_and(is_ident_continue) {
                    self.pos += 1;
                }
                TokenKind::Ident
            }
            _ => {
                self.pos += 1;
                TokenKind::Punct
            }
        };

        let mut end = self.pos;
        if kind == TokenKind::LineComment && end > start + 2 && self.src[end - 1] == b'\r' {
            end -= 1;
        }

        Ok(Token {
            kind,
            start,
            end,
            line,
            end_line: self.line,
        })
    }

    fn line_comment(&mut self) -> TokenKind {
        while self.peek(0).is_some_and(|c| c != b'\n') {
            self.pos += 1;
        }
        TokenKind::LineComment
    }

    fn block_comment(&mut self, line: usize) -> Result<TokenKind, SyntaxError> {
        self.pos += 2;
        loop {
            match self.peek(0) {
                None => return Err(SyntaxError::new(line, "comment not terminated")),
                Some(b'*') if self.peek(1) == Some(b'/') => {
                    self.pos += 2;
                    return Ok(TokenKind::BlockComment);
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn quoted(
        &mut self,
        quote: u8,
        kind: TokenKind,
        line: usize,
    ) -> Result<TokenKind, SyntaxError> {
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    let what = if kind == TokenKind::Rune { "rune" } else { "string" };
                    return Err(SyntaxError::new(line, format!("{what} literal not terminated")));
                }
                Some(b'\\') => self.pos += 2,
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(kind);
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn raw_string(&mut self, line: usize) -> Result<TokenKind, SyntaxError> {
        self.pos += 1;
        loop {
            match self.peek(0) {
                None => return Err(SyntaxError::new(line, "raw string literal not terminated")),
                Some(b'`') => {
                    self.pos += 1;
                    return Ok(TokenKind::RawString);
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn number(&mut self) -> TokenKind {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            let exponent_sign = matches!(c, b'+' | b'-')
                && matches!(self.src[self.pos - 1], b'e' | b'E' | b'p' | b'P');
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        TokenKind::Number
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
