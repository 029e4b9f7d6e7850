//! Lexer for computed-column expressions.

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte offset into `input`.
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }

    /// Digits with an optional fractional part.
    fn read_number(&mut self, start: usize) -> Token<'a> {
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.bump();
            } else {
                break;
            }
        }
        self.token(TokenKind::Number(&self.input[start..self.position]), start)
    }

    /// Reads up to the closing `quote`; the opening one was consumed by the
    /// caller. A doubled quote is an escaped quote. Unterminated input is
    /// illegal.
    fn read_quoted(&mut self, start: usize, quote: char) -> Option<&'a str> {
        let content_start = self.position;
        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.bump();
                        continue;
                    }
                    let content_end = self.position - quote.len_utf8();
                    return Some(&self.input[content_start..content_end]);
                }
                Some(_) => continue,
                None => {
                    self.position = self.input.len().max(start);
                    return None;
                }
            }
        }
    }

    /// Letters, digits and underscores.
    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.token(TokenKind::Identifier(&self.input[start..self.position]), start)
    }

    /// One- or two-character operator starting with `first`.
    fn read_operator(&mut self, start: usize, first: char) -> Token<'a> {
        let second = self.peek();
        let two_char = matches!(
            (first, second),
            ('<', Some('=')) | ('<', Some('>')) | ('>', Some('=')) | ('!', Some('=')) | ('|', Some('|'))
        );
        if two_char {
            self.bump();
        } else if first == '!' || first == '|' {
            return self.token(TokenKind::Illegal, start);
        }
        self.token(TokenKind::Operator(&self.input[start..self.position]), start)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let c = self.bump()?;

        let token = match c {
            '(' => self.token(TokenKind::LParen, start),
            ')' => self.token(TokenKind::RParen, start),
            ',' => self.token(TokenKind::Comma, start),
            '.' => self.token(TokenKind::Dot, start),
            ';' => self.token(TokenKind::Semicolon, start),
            '-' if self.peek() == Some('-') => self.token(TokenKind::Comment, start),
            '/' if self.peek() == Some('*') => self.token(TokenKind::Comment, start),
            '+' | '-' | '*' | '/' | '%' | '=' => {
                self.token(TokenKind::Operator(&self.input[start..self.position]), start)
            }
            '<' | '>' | '!' | '|' => self.read_operator(start, c),
            '\'' => match self.read_quoted(start, '\'') {
                Some(content) => self.token(TokenKind::String(content), start),
                None => self.token(TokenKind::Illegal, start),
            },
            '"' => match self.read_quoted(start, '"') {
                Some(content) => self.token(TokenKind::QuotedIdentifier(content), start),
                None => self.token(TokenKind::Illegal, start),
            },
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(start),
            _ => self.token(TokenKind::Illegal, start),
        };
        Some(token)
    }
}
