use std::borrow::Cow;

use dw_core::{DotError, Position};

use crate::token::{Token, TokenKind};

/// Hand-written scanner for DOT source.
///
/// Errors never stop the scan: every bad character is consumed, reported in
/// [`Lexer::errors`], and scanning resumes right after it.
pub struct Lexer<'src> {
    src: Cow<'src, str>,
    filename: String,
    ch: Option<char>,
    offset: usize,
    line: usize,
    column: usize,
    errors: Vec<DotError>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Invalid UTF-8 is replaced with U+FFFD before scanning.
    #[must_use]
    pub fn new(filename: impl Into<String>, src: &'src [u8]) -> Self {
        Self::from_cow(filename.into(), String::from_utf8_lossy(src))
    }

    #[must_use]
    pub fn with_source(filename: impl Into<String>, src: &'src str) -> Self {
        Self::from_cow(filename.into(), Cow::Borrowed(src))
    }

    fn from_cow(filename: String, src: Cow<'src, str>) -> Self {
        let ch = src.chars().next();
        Self {
            src,
            filename,
            ch,
            offset: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
            finished: false,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[DotError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<DotError> {
        std::mem::take(&mut self.errors)
    }

    /// Returns the next token and the position of its first character.
    /// Once the input is exhausted every call returns `Eof`.
    pub fn next_token(&mut self) -> (Position, Token) {
        self.skip_trivia();
        let pos = self.pos();

        let Some(ch) = self.ch else {
            return (pos, Token::punct(TokenKind::Eof));
        };

        let token = match ch {
            c if is_letter(c) => {
                let word = self.scan_ident();
                Token::new(TokenKind::lookup(word), word)
            }
            c if c.is_ascii_digit() => Token::new(TokenKind::Ident, self.scan_number()),
            '-' | '.' if self.peek().is_some_and(|next| next.is_ascii_digit()) => {
                Token::new(TokenKind::Ident, self.scan_number())
            }
            '"' => {
                self.bump();
                let (text, terminated) = self.scan_quoted();
                if !terminated {
                    self.error(pos.clone(), "unterminated string");
                }
                Token::new(TokenKind::Quoted, text)
            }
            '<' => {
                self.bump();
                let (text, terminated) = self.scan_html();
                if !terminated {
                    self.error(pos.clone(), "unterminated HTML string");
                }
                Token::new(TokenKind::Html, text)
            }
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            ',' => self.single(TokenKind::Comma),
            '=' => self.single(TokenKind::Equal),
            '-' => {
                self.bump();
                match self.ch {
                    Some('>') => self.single(TokenKind::Arrow),
                    Some('-') => self.single(TokenKind::DashDash),
                    _ => {
                        self.error(pos.clone(), "unexpected character: -");
                        Token::new(TokenKind::Illegal, "-")
                    }
                }
            }
            other => {
                if other.is_control() {
                    self.error(pos.clone(), "unexpected character");
                } else {
                    self.error(pos.clone(), format!("unexpected character: {other}"));
                }
                self.bump();
                Token::new(TokenKind::Illegal, other.to_string())
            }
        };

        (pos, token)
    }

    fn pos(&self) -> Position {
        Position::new(self.filename.clone(), self.offset, self.line, self.column)
    }

    fn error(&mut self, pos: Position, message: impl Into<String>) {
        self.errors.push(DotError::lex(pos, message));
    }

    fn bump(&mut self) {
        let Some(ch) = self.ch else {
            return;
        };
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.ch = self.src[self.offset..].chars().next();
    }

    fn peek(&self) -> Option<char> {
        let ch = self.ch?;
        self.src[self.offset + ch.len_utf8()..].chars().next()
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        self.bump();
        Token::punct(kind)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.ch {
                Some(' ' | '\t' | '\n' | '\r') => self.bump(),
                Some('/') if self.peek() == Some('/') => self.skip_line(),
                Some('/') if self.peek() == Some('*') => {
                    let start = self.pos();
                    self.bump();
                    self.bump();
                    if !self.skip_block_comment() {
                        self.error(start, "unterminated block comment");
                    }
                }
                Some('#') => self.skip_line(),
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while self.ch.is_some_and(|ch| ch != '\n') {
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> bool {
        loop {
            match self.ch {
                None => return false,
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    self.bump();
                    return true;
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn scan_ident(&mut self) -> &str {
        let start = self.offset;
        while self.ch.is_some_and(is_alphanumeric) {
            self.bump();
        }
        &self.src[start..self.offset]
    }

    fn scan_number(&mut self) -> String {
        let start = self.offset;
        if self.ch == Some('-') {
            self.bump();
        }
        while self.ch.is_some_and(|ch| ch.is_ascii_digit()) {
            self.bump();
        }
        if self.ch == Some('.') {
            self.bump();
            while self.ch.is_some_and(|ch| ch.is_ascii_digit()) {
                self.bump();
            }
        }
        self.src[start..self.offset].to_string()
    }

    /// Expects the opening quote to be consumed already.
    fn scan_quoted(&mut self) -> (String, bool) {
        let mut text = String::new();
        loop {
            match self.ch {
                None | Some('\n') => return (text, false),
                Some('"') => {
                    self.bump();
                    return (text, true);
                }
                Some('\\') => {
                    self.bump();
                    let Some(escaped) = self.ch else {
                        return (text, false);
                    };
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    self.bump();
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
    }

    /// Expects the opening `<` to be consumed already; nesting starts at depth 1.
    fn scan_html(&mut self) -> (String, bool) {
        let mut text = String::new();
        let mut depth = 1_usize;
        while let Some(ch) = self.ch {
            match ch {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return (text, true);
                    }
                }
                _ => {}
            }
            text.push(ch);
            self.bump();
        }
        (text, false)
    }
}

impl Iterator for Lexer<'_> {
    type Item = (Position, Token);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let (pos, token) = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
            return None;
        }
        Some((pos, token))
    }
}

/// Scans the whole input, returning every token before EOF plus the lexer
/// diagnostics.
#[must_use]
pub fn tokenize(filename: &str, src: &[u8]) -> (Vec<(Position, Token)>, Vec<DotError>) {
    let mut lexer = Lexer::new(filename, src);
    let tokens = lexer.by_ref().collect();
    (tokens, lexer.take_errors())
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_alphanumeric(ch: char) -> bool {
    is_letter(ch) || ch.is_ascii_digit()
}
