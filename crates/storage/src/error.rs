// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error types

use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column value that failed to parse into a domain enum.
#[derive(Debug, Error)]
#[error("invalid {what} value: {value}")]
pub(crate) struct InvalidColumn {
    pub what: &'static str,
    pub value: String,
}

/// Parse a TEXT column into a domain enum, mapping failures into a
/// rusqlite conversion error so row mappers stay composable.
pub(crate) fn parse_column<T>(
    idx: usize,
    what: &'static str,
    value: String,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(InvalidColumn { what, value }),
        )
    })
}
