//! Transcoding Error Types
//!
//! Per-record problems are defaulted, not raised. The only failure left is a
//! transcoded backup that doesn't pass the target format's validation.

use derive_more::{Display, Error};

/// A transcoding error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transcoding operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The produced backup would not restore; nothing may be written.
    #[display("transcoded {_0} backup is invalid")]
    InvalidOutput(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
