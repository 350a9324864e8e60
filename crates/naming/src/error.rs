//! Naming Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A filename does not follow the expected naming convention.
    #[display("filename does not match any known convention: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// The manifest XML cannot be parsed or misses required fields.
    #[display("malformed manifest: {_0}")]
    MalformedManifest(#[error(not(source))] String),
    /// The manifest parsed but contradicts itself (bad entry filenames,
    /// impossible months, duplicate keys) or another manifest it is
    /// compared against.
    #[display("inconsistent manifest: {_0}")]
    InconsistentManifest(#[error(not(source))] String),
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
        assert_eq!(
            ErrorKind::InvalidName("notes.txt".to_string()).to_string(),
            "filename does not match any known convention: notes.txt"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::MalformedManifest("truncated".to_string()).is_retryable());
    }
}
