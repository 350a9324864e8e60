//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container structure cannot be parsed (bad magic, truncated
    /// stream, garbage where a header should be). Fatal to this archive;
    /// don't retry with the same bytes.
    #[display("corrupt archive: {_0}")]
    Corrupt(#[error(not(source))] String),
    /// The container was recognized but this build doesn't handle it
    /// (e.g. a compression format outside the supported set).
    #[display("unsupported container: {_0}")]
    Unsupported(#[error(not(source))] String),
    /// Nested archives exceeded the configured depth limit.
    #[display("archive nesting exceeds depth limit of {_0}")]
    DepthExceeded(#[error(not(source))] usize),
    /// A member path failed the submission naming rules (traversal,
    /// disallowed characters, over-long).
    #[display("unsafe member path: {}", _0.display())]
    MemberPath(#[error(not(source))] PathBuf),
    /// An I/O operation on the in-memory stream failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
