//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration file or environment variable could not be read or
    /// doesn't match the expected shape. Fix the file, then run again.
    #[display("could not load configuration")]
    Load,
    /// The configuration loaded, but a value is out of range.
    #[display("invalid value for '{key}': {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        key: &'static str,
        /// What the value should have been.
        reason: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Load.to_string(), "could not load configuration");
        assert_eq!(
            ErrorKind::Invalid {
                key: "catalog.batch_size",
                reason: "must be at least 1".to_string()
            }
            .to_string(),
            "invalid value for 'catalog.batch_size': must be at least 1"
        );
    }
}
