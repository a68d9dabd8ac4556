//! Backup Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Everything here is fatal to a
//! conversion: no output is written once one of these is raised.

use derive_more::{Display, Error};

/// A backup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for backup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container itself is unreadable: not a ZIP, not protobuf, bad gzip.
    /// Don't retry with the same input.
    #[display("malformed backup archive")]
    MalformedArchive,
    /// A mandatory section is absent from the archive.
    #[display("backup is missing its {_0} section")]
    MissingSection(#[error(not(source))] &'static str),
    /// A section is present but doesn't parse.
    #[display("backup section {_0} is malformed")]
    MalformedSection(#[error(not(source))] &'static str),
    /// The payload is about to be written but violates the target schema.
    #[display("schema violation: {_0}")]
    Schema(#[error(not(source))] String),
    /// Reading or writing the underlying file failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
