//! Application Error Types

use derive_more::{Display, Error};

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for a conversion run.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fix the configuration file or environment and run again.
    #[display("configuration could not be loaded")]
    Config,
    /// Neither backup file exists.
    #[display("no backup found: looked for {kotatsu} and {tachiyomi}")]
    NoInput { kotatsu: String, tachiyomi: String },
    /// The input backup is unreadable or malformed.
    #[display("could not read backup {_0}")]
    Read(#[error(not(source))] String),
    #[display("conversion failed")]
    Transcode,
    /// Encoding or writing the output failed; nothing was left behind.
    #[display("could not write {_0}")]
    Write(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Write(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let kind = ErrorKind::NoInput {
            kotatsu: "Backup.zip".to_string(),
            tachiyomi: "Backup.tachibk".to_string(),
        };
        assert_eq!(kind.to_string(), "no backup found: looked for Backup.zip and Backup.tachibk");
        assert!(!kind.is_retryable());
        assert!(ErrorKind::Write("output/x.zip".to_string()).is_retryable());
    }
}
