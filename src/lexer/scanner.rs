//! Lexer/Scanner for Lox source code.

use std::iter::FusedIterator;

use tracing::trace;

use crate::lexer::token::{Token, TokenKind};

/// The scanner hands out one token per call, borrowing lexemes straight from
/// the source buffer. Errors come back as `TokenKind::Error` tokens.
pub struct Scanner<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    line: u32,
    finished: bool,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            finished: false,
        }
    }

    /// Scan all remaining tokens, ending with (and including) `Eof`.
    pub fn scan_tokens(&mut self) -> Vec<Token<'src>> {
        self.by_ref().collect()
    }

    /// Scan the next token. Once the input is exhausted every call returns
    /// `Eof`.
    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace_and_comments();
        self.start = self.current;

        let Some(c) = self.advance() else {
            return Token::eof(self.line);
        };

        let token = match c {
            c if is_alpha(c) => self.scan_identifier(),
            c if c.is_ascii_digit() => self.scan_number(),

            // Single-character tokens
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),

            // Two-character tokens
            b'!' => self.make_pair(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.make_pair(b'=', TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.make_pair(b'=', TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.make_pair(b'=', TokenKind::GreaterEqual, TokenKind::Greater),

            b'"' => self.scan_string(),

            _ => self.unexpected_character(),
        };

        trace!(%token, "scanned token");
        token
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\r' | b'\t') => {
                    self.advance();
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    // Line comment
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_string(&mut self) -> Token<'src> {
        while let Some(c) = self.peek() {
            if c == b'"' {
                break;
            }
            if c == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Token::error("Unterminated string.", self.line);
        }

        // The closing quote.
        self.advance();
        self.make_token(TokenKind::String)
    }

    fn scan_number(&mut self) -> Token<'src> {
        self.skip_digits();

        // Look for a fractional part.
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            // Consume the "."
            self.advance();
            self.skip_digits();
        }

        self.make_token(TokenKind::Number)
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn scan_identifier(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.advance();
        }
        self.make_token(identifier_kind(self.lexeme()))
    }

    fn unexpected_character(&mut self) -> Token<'src> {
        // Skip the rest of a multi-byte character so lexemes stay on
        // UTF-8 boundaries.
        while !self.source.is_char_boundary(self.current) {
            self.current += 1;
        }
        Token::error("Unexpected character.", self.line)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.current += 1;
        Some(c)
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current + 1).copied()
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> &'src str {
        &self.source[self.start..self.current]
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, self.lexeme(), self.line)
    }

    fn make_pair(&mut self, second: u8, matched: TokenKind, single: TokenKind) -> Token<'src> {
        let kind = if self.match_byte(second) {
            matched
        } else {
            single
        };
        self.make_token(kind)
    }
}

impl<'src> Iterator for Scanner<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        if self.finished {
            return None;
        }
        let token = self.scan_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

impl FusedIterator for Scanner<'_> {}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Classify an identifier lexeme, dispatching on its leading characters
/// before comparing the remainder against a single reserved word.
fn identifier_kind(lexeme: &str) -> TokenKind {
    match lexeme.as_bytes() {
        [b'a', rest @ ..] => check_keyword(rest, b"nd", TokenKind::And),
        [b'c', rest @ ..] => check_keyword(rest, b"lass", TokenKind::Class),
        [b'e', rest @ ..] => check_keyword(rest, b"lse", TokenKind::Else),
        [b'f', b'a', rest @ ..] => check_keyword(rest, b"lse", TokenKind::False),
        [b'f', b'o', rest @ ..] => check_keyword(rest, b"r", TokenKind::For),
        [b'f', b'u', rest @ ..] => check_keyword(rest, b"n", TokenKind::Fun),
        [b'i', rest @ ..] => check_keyword(rest, b"f", TokenKind::If),
        [b'n', rest @ ..] => check_keyword(rest, b"il", TokenKind::Nil),
        [b'o', rest @ ..] => check_keyword(rest, b"r", TokenKind::Or),
        [b'p', rest @ ..] => check_keyword(rest, b"rint", TokenKind::Print),
        [b'r', rest @ ..] => check_keyword(rest, b"eturn", TokenKind::Return),
        [b's', rest @ ..] => check_keyword(rest, b"uper", TokenKind::Super),
        [b't', b'h', rest @ ..] => check_keyword(rest, b"is", TokenKind::This),
        [b't', b'r', rest @ ..] => check_keyword(rest, b"ue", TokenKind::True),
        [b'v', rest @ ..] => check_keyword(rest, b"ar", TokenKind::Var),
        [b'w', rest @ ..] => check_keyword(rest, b"hile", TokenKind::While),
        _ => TokenKind::Identifier,
    }
}

fn check_keyword(rest: &[u8], expected: &[u8], kind: TokenKind) -> TokenKind {
    if rest == expected {
        kind
    } else {
        TokenKind::Identifier
    }
}
