//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. None of these are fatal to a
//! conversion: [`sync`](crate::sync) logs them and carries on with the
//! built-in knowledge base.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed (TLS backend, bad settings).
    #[display("could not build HTTP client")]
    Client,
    /// The request never got a response: DNS, connection, timeout.
    #[display("request to {_0} failed")]
    Network(#[error(not(source))] String),
    /// The server answered with a non-success status.
    #[display("unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The response arrived but isn't the document we expected.
    #[display("invalid response from {_0}")]
    InvalidResponse(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in this crate retries; this only informs the log message.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Network(_) => true,
            ErrorKind::Status { status, .. } => *status == 429 || *status >= 500,
            ErrorKind::Client | ErrorKind::InvalidResponse(_) => false,
        }
    }
}
