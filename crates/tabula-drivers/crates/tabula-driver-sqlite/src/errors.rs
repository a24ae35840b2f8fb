//! SQLite error classification
//!
//! SQLite reports most DDL failures with the generic `SQLITE_ERROR` code, so
//! the message text is the only reliable signal.

use rusqlite::ffi;
use tabula_core::TabulaError;

const NOT_FOUND_PREFIXES: &[&str] = &[
    "no such table",
    "no such view",
    "no such index",
    "no such trigger",
];

/// Map a SQLite error message onto the shared error taxonomy
pub fn classify_message(message: &str) -> TabulaError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("already exists") {
        TabulaError::AlreadyExists(message.to_string())
    } else if NOT_FOUND_PREFIXES.iter().any(|p| lower.contains(p)) {
        TabulaError::NotFound(message.to_string())
    } else if lower.contains("foreign key constraint failed")
        || lower.contains("foreign key mismatch")
    {
        TabulaError::Referential(message.to_string())
    } else {
        TabulaError::Transport(message.to_string())
    }
}

pub(crate) fn map_sqlite_error(err: rusqlite::Error) -> TabulaError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            TabulaError::Referential(err.to_string())
        }
        _ => classify_message(&err.to_string()),
    }
}
