//! Pass-boundary error types.
//!
//! Child crates raise their own `exn` trees; the binary re-kinds them here so
//! the run loop can log one category per failed pass. Nothing above the pass
//! boundary ever sees these: the loop logs and moves on.

use derive_more::{Display, Error};

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Enumerating the image repository failed.
    #[display("failed to scan the image repository")]
    Scan,
    /// Connecting to or synchronizing the reference database failed.
    #[display("database synchronization failed")]
    Database,
    /// The repository sweep could not run.
    #[display("failed to sweep the image repository")]
    Purge,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Every pass failure is retried by the next cycle anyway.
        matches!(self, Self::Scan | Self::Database)
    }
}
