//! Catalog entries and their provenance.

use crate::identity::ContentIdentity;
use arxcat_validate::ValidationOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;

/// Where a payload was first observed: the archive it came from and its
/// member path within that archive.
///
/// Provenance only. Identity is content-addressed, so two sources can
/// legitimately point at the same entry; the recorded source is the first
/// one seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub archive: String,
    pub member_path: PathBuf,
}

impl SourceRef {
    pub fn new(archive: impl Into<String>, member_path: impl Into<PathBuf>) -> Self {
        Self { archive: archive.into(), member_path: member_path.into() }
    }
}

/// One catalog entry. Owned exclusively by the [`Catalog`]; mutated only
/// through its upsert operation, never deleted within a run.
///
/// [`Catalog`]: crate::Catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub identity: ContentIdentity,
    pub source: SourceRef,
    pub outcome: ValidationOutcome,
    #[serde(with = "time::serde::rfc3339")]
    pub first_seen: OffsetDateTime,
    pub update_count: u64,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(identity: ContentIdentity, source: SourceRef, outcome: ValidationOutcome) -> Self {
        Self { identity, source, outcome, first_seen: OffsetDateTime::now_utc(), update_count: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::identify;
    use arxcat_filetype::FileTag;

    #[test]
    fn entry_round_trips_through_json() {
        let entry = RegistryEntry::new(
            identify(b"%PDF-1.4"),
            SourceRef::new("arXiv_src_9912_001.tar", "9912.00001.pdf"),
            ValidationOutcome::valid(FileTag::Pdf).meta("page_count", 2),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: RegistryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn fresh_entry_has_zero_updates() {
        let entry = RegistryEntry::new(
            identify(b"x"),
            SourceRef::new("a.tar", "x"),
            ValidationOutcome::valid(FileTag::Unknown),
        );
        assert_eq!(entry.update_count, 0);
    }
}
