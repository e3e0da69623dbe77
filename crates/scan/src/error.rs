//! Scan Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A scan error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Note how small this is: an unreadable mount point and a file with a
/// non-numeric name are operational noise, not errors. They are logged and
/// skipped inside the scanner itself.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Underlying I/O error while enumerating the repository.
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
