//! Retrieval Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A retrieval error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested object key does not exist in the bucket.
    #[display("object not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The bucket is unreachable or the request failed after the SDK's own
    /// retries. Callers treat the affected archive as failed and move on;
    /// they do not retry on top.
    #[display("retrieval unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::NotFound("src/arXiv_src_9902_005.tar".to_string()).to_string(),
            "object not found: src/arXiv_src_9902_005.tar"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::NotFound("key".to_string()).is_retryable());
        assert!(ErrorKind::Unavailable("timeout".to_string()).is_retryable());
    }
}
