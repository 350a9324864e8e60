//! Application Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories for the command-line surface.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration could not be loaded or failed validation.
    #[display("invalid configuration: {_0}")]
    Config(#[error(not(source))] String),
    /// A local file could not be read or written.
    #[display("cannot access `{}`", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The bucket credentials are missing for an operation that needs them.
    #[display("missing credentials: set `access_key_id` and `secret_access_key` (the bucket is requester-pays)")]
    Credentials,
    /// The manifest could not be fetched or parsed.
    #[display("cannot read bucket manifest")]
    Manifest,
    /// A bulk archive name does not follow the bucket's conventions.
    #[display("`{_0}` is not a bulk archive name (expected `arXiv_src_YYMM_NNN.tar`)")]
    Name(#[error(not(source))] String),
    /// A download failed after retries.
    #[display("download failed for `{_0}`")]
    Fetch(#[error(not(source))] String),
    /// The pipeline aborted; per-archive failures are reported, this is
    /// for catalog or worker breakage.
    #[display("processing aborted")]
    Pipeline,
    /// The registry file could not be loaded or saved.
    #[display("registry persistence failed for `{}`", _0.display())]
    Registry(#[error(not(source))] PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Io(PathBuf::from("archives/a.tar")).to_string(), "cannot access `archives/a.tar`");
        assert_eq!(
            ErrorKind::Config("unknown field `buckit`".to_string()).to_string(),
            "invalid configuration: unknown field `buckit`"
        );
    }
}
