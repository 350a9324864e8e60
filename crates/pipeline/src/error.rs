//! Pipeline Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// All of these are fatal to one archive at most; batch processing records
/// them and moves on to the next archive.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive container could not be opened at all.
    #[display("cannot process archive `{_0}`")]
    Archive(#[error(not(source))] String),
    /// The retrieval collaborator could not supply the archive bytes.
    #[display("retrieval unavailable: {_0}")]
    Retrieval(#[error(not(source))] String),
    /// The catalog refused the operation (lock poisoned).
    #[display("catalog unavailable")]
    Registry,
    /// A validation worker panicked.
    #[display("validation worker failed")]
    Worker,
    /// Processing was cancelled by the caller between members.
    #[display("processing cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Retrieval(_))
    }
}
