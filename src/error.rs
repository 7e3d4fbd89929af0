//! Import error taxonomy
//!
//! Row-level variants are recorded against the row and never stop a batch.
//! `UnreadableFile` aborts the file it was raised for.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unrecognized date format: {0}")]
    DateFormat(String),

    #[error("Missing {0}")]
    MissingRequiredField(&'static str),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Failed to process {file}: {reason}")]
    UnreadableFile { file: String, reason: String },
}

impl ImportError {
    pub fn persistence(err: anyhow::Error) -> Self {
        ImportError::Persistence(format!("{:#}", err))
    }

    pub fn unreadable(file: impl Into<String>, reason: impl ToString) -> Self {
        ImportError::UnreadableFile {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why a row was passed over without counting as an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A record with the same natural key already exists for the account
    DuplicateRecord,
    /// Quotes are not orders
    Quote,
}
