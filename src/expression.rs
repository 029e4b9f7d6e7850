//! Checks a computed-column expression before it is emitted verbatim.
//!
//! Used under [`ExpressionPolicy::Validated`](crate::config::ExpressionPolicy).
//! Every name in the expression must be a known column, a select-list alias,
//! a whitelisted function or a fixed SQL keyword; statement separators,
//! comments and unknown characters are rejected outright.

use crate::error::QueryError;
use crate::identifier;
use crate::lexer::Lexer;
use crate::schema::ColumnUniverse;
use crate::token::{Token, TokenKind};
use std::collections::HashSet;

const FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "TOTAL", "COALESCE", "IFNULL", "NULLIF", "ROUND", "ABS",
    "LOWER", "UPPER", "LENGTH", "SUBSTR", "STRFTIME", "DATE",
];

const KEYWORDS: &[&str] = &[
    "CASE", "WHEN", "THEN", "ELSE", "END", "AND", "OR", "NOT", "NULL", "IS", "IN", "BETWEEN",
    "LIKE", "AS", "DISTINCT", "CAST", "TRUE", "FALSE", "INTEGER", "REAL", "TEXT", "NUMERIC",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

fn is_function(word: &str) -> bool {
    FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(word))
}

/// Rejects a `?` outside string and identifier literals. The compiled
/// statement binds parameters by position, so an extra placeholder in the
/// select list would shift every filter value after it.
pub fn check_placeholders(expression: &str) -> Result<(), QueryError> {
    let stray = Lexer::new(expression).any(|token| {
        token.kind == TokenKind::Illegal && &expression[token.span.start..token.span.end] == "?"
    });
    if stray {
        return Err(QueryError::UnsafeExpression {
            expression: expression.to_string(),
            token: "?".to_string(),
        });
    }
    Ok(())
}

pub fn validate_expression(
    expression: &str,
    available: &ColumnUniverse,
    aliases: &HashSet<String>,
) -> Result<(), QueryError> {
    let reject = |token: &str| QueryError::UnsafeExpression {
        expression: expression.to_string(),
        token: token.to_string(),
    };

    let tokens: Vec<Token<'_>> = Lexer::new(expression).collect();
    if tokens.is_empty() {
        return Err(reject(""));
    }

    let text = |token: &Token<'_>| &expression[token.span.start..token.span.end];
    let mut depth: i64 = 0;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Identifier(word) | TokenKind::QuotedIdentifier(word) => {
                let quoted = matches!(token.kind, TokenKind::QuotedIdentifier(_));
                let next = tokens.get(i + 1).map(|t| &t.kind);

                if !quoted && is_keyword(word) {
                    i += 1;
                    continue;
                }
                if !quoted && next == Some(&TokenKind::LParen) {
                    if !is_function(word) {
                        return Err(reject(word));
                    }
                    i += 1;
                    continue;
                }

                // Column reference, possibly `qualifier.column`.
                let mut name = word.to_string();
                if next == Some(&TokenKind::Dot) {
                    match tokens.get(i + 2).map(|t| &t.kind) {
                        Some(TokenKind::Identifier(column)) | Some(TokenKind::QuotedIdentifier(column)) => {
                            name = format!("{}.{}", word, column);
                            i += 2;
                        }
                        _ => return Err(reject(".")),
                    }
                }
                if !identifier::is_valid_identifier(&name) {
                    return Err(reject(&name));
                }
                if !available.contains(&name) && !aliases.contains(&name) {
                    return Err(reject(&name));
                }
                // Emitted verbatim, so a name shared with a joined table
                // must be written qualified.
                if !aliases.contains(&name) && available.resolve(&name) != name {
                    return Err(reject(&name));
                }
            }
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth < 0 {
                    return Err(reject(")"));
                }
            }
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::Comma | TokenKind::Operator(_) => {}
            TokenKind::Dot | TokenKind::Semicolon | TokenKind::Comment | TokenKind::Illegal => {
                return Err(reject(text(token)));
            }
        }
        i += 1;
    }

    if depth != 0 {
        return Err(reject("("));
    }
    Ok(())
}
