//! Tokens of a computed-column expression.

/// A token is a single unit of an expression, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // Names
    Identifier(&'a str),
    QuotedIdentifier(&'a str), // Content between double quotes

    // Literals
    String(&'a str), // Content between single quotes, escapes left as-is
    Number(&'a str),

    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,
    Dot,    // .

    // Arithmetic, comparison and concatenation
    Operator(&'a str),

    // Never legal inside an expression
    Semicolon, // ;
    Comment,   // -- or /*
    Illegal,   // Unknown character or unterminated literal
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
