//! Registry Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A registry error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The persisted catalog file cannot be read or written.
    #[display("cannot access catalog file: {}", _0.display())]
    Persistence(#[error(not(source))] PathBuf),
    /// The persisted catalog file does not deserialize.
    #[display("catalog file is not valid JSON: {}", _0.display())]
    Malformed(#[error(not(source))] PathBuf),
    /// The catalog lock was poisoned by a panicking writer.
    #[display("catalog lock poisoned")]
    Poisoned,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Persistence(_))
    }
}
