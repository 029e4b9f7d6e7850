//! Identifier whitelisting and quoting.
//!
//! No character outside `[A-Za-z0-9_.\s]` may ever reach statement text
//! through a table, column or alias name. Because `"` is outside the
//! whitelist, quoting never needs escaping.

use crate::error::QueryError;
use crate::schema::ColumnUniverse;
use lazy_static::lazy_static;
use regex::Regex;
use sea_query::{Alias, ColumnRef, IntoColumnRef};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z0-9_.\s]+$").unwrap();
}

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Checks `name` against the whitelist without quoting it.
pub fn check(name: &str) -> Result<(), QueryError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Validates and double-quotes `name`.
///
/// A `qualifier.column` reference is quoted per segment (`"c"."category"`);
/// anything else is wrapped whole (`"Child Bounties"`).
pub fn sanitize(name: &str) -> Result<String, QueryError> {
    check(name)?;
    Ok(match split_qualified(name) {
        Some((qualifier, column)) => format!("\"{}\".\"{}\"", qualifier, column),
        None => format!("\"{}\"", name),
    })
}

/// Fails with `UnknownColumn` unless `column` is exactly in the allow-list.
pub fn validate_column(column: &str, available: &ColumnUniverse) -> Result<(), QueryError> {
    if available.contains(column) {
        Ok(())
    } else {
        Err(QueryError::UnknownColumn {
            column: column.to_string(),
        })
    }
}

/// Whitelist check followed by allow-list membership, in that order.
pub fn checked_column(column: &str, available: &ColumnUniverse) -> Result<ColumnRef, QueryError> {
    check(column)?;
    validate_column(column, available)?;
    Ok(column_ref(available.resolve(column)))
}

/// sea-query reference for an already-validated column name.
pub fn column_ref(name: &str) -> ColumnRef {
    match split_qualified(name) {
        Some((qualifier, column)) => (Alias::new(qualifier), Alias::new(column)).into_column_ref(),
        None => Alias::new(name).into_column_ref(),
    }
}

pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once('.')
        .filter(|(qualifier, column)| !qualifier.is_empty() && !column.is_empty())
}
