//! Validation outcomes: status, metadata, diagnostics.

use arxcat_filetype::FileTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Result status of validating one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Valid,
    Invalid,
    Warning,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Status::Valid => "valid",
            Status::Invalid => "invalid",
            Status::Warning => "warning",
        })
    }
}

/// The outcome of validating one member: exactly one per member, produced
/// by exactly one handler, never merged across handlers.
///
/// Metadata keys are format-specific (`page_count` for a PDF, `width` for
/// an image) and kept in a sorted map so serialized outcomes compare
/// byte-stably.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub tag: FileTag,
    pub status: Status,
    /// Set when no handler could be resolved for the member's kind, so
    /// reporting does not have to pattern-match diagnostic text.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unhandled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ValidationOutcome {
    #[must_use]
    pub fn valid(tag: FileTag) -> Self {
        Self::with_status(tag, Status::Valid)
    }

    #[must_use]
    pub fn invalid(tag: FileTag, diagnostic: impl Into<String>) -> Self {
        Self::with_status(tag, Status::Invalid).diagnostic(diagnostic)
    }

    #[must_use]
    pub fn warning(tag: FileTag, diagnostic: impl Into<String>) -> Self {
        Self::with_status(tag, Status::Warning).diagnostic(diagnostic)
    }

    #[must_use]
    pub fn with_status(tag: FileTag, status: Status) -> Self {
        Self { tag, status, unhandled: false, metadata: BTreeMap::new(), diagnostics: Vec::new() }
    }

    /// Mark the outcome as produced without a handler (builder style).
    #[must_use]
    pub fn unhandled(mut self) -> Self {
        self.unhandled = true;
        self
    }

    /// Attach a metadata field (builder style).
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a diagnostic message (builder style).
    #[must_use]
    pub fn diagnostic(mut self, message: impl Into<String>) -> Self {
        self.diagnostics.push(message.into());
        self
    }

    /// Whether this outcome refines `prior`: same status, and every
    /// metadata field `prior` recorded is still present with the same
    /// value. A refinement may add fields and diagnostics but never
    /// contradicts what was already stored.
    #[must_use]
    pub fn is_refinement_of(&self, prior: &Self) -> bool {
        self.status == prior.status
            && prior.metadata.iter().all(|(key, value)| self.metadata.get(key) == Some(value))
    }
}
