//! Identity Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Resolution itself never fails; these
//! errors only surface when parsing identifiers handed to us by other crates.

use derive_more::{Display, Error};

/// An identity error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The value is not a 64-bit source identifier (signed or unsigned).
    #[display("invalid source id: {_0}")]
    InvalidSourceId(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Identifiers are either parseable or they aren't.
        false
    }
}
