//! Validation Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A validation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for validation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Handlers report malformed input through outcome statuses, never through
/// errors, so the only error a handler may raise is an environment failure.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A decoding capability the handler needs is not available in this
    /// build or environment. Dispatch converts this into a
    /// `warning`-status outcome.
    #[display("handler capability unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
