//! Diagnostics report aggregation.

use crate::conflict::ConflictRecord;
use crate::entry::RegistryEntry;
use arxcat_validate::Status;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Aggregated outcome of a run: per-status entry counts, every conflict,
/// and the members no handler could be resolved for. Pure aggregation over
/// catalog snapshots; the caller decides where it goes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub valid: usize,
    pub invalid: usize,
    pub warning: usize,
    pub conflicts: Vec<ConflictRecord>,
    /// Member paths whose outcome records a handler-resolution failure.
    pub unhandled: Vec<PathBuf>,
    /// Archives that failed before any member reached the catalog
    /// (corrupt container, retrieval failure). One line each.
    pub archive_failures: Vec<String>,
}

impl Report {
    /// Aggregate catalog snapshots into a report.
    #[must_use]
    pub fn aggregate(entries: &[RegistryEntry], conflicts: Vec<ConflictRecord>) -> Self {
        let mut report = Report { conflicts, ..Report::default() };
        for entry in entries {
            match entry.outcome.status {
                Status::Valid => report.valid += 1,
                Status::Invalid => report.invalid += 1,
                Status::Warning => report.warning += 1,
            }
            if entry.outcome.unhandled {
                report.unhandled.push(entry.source.member_path.clone());
            }
        }
        report
    }

    /// Fold another report into this one (batch runs aggregate per-archive
    /// reports).
    pub fn merge(&mut self, other: Report) {
        self.valid += other.valid;
        self.invalid += other.invalid;
        self.warning += other.warning;
        self.conflicts.extend(other.conflicts);
        self.unhandled.extend(other.unhandled);
        self.archive_failures.extend(other.archive_failures);
    }

    /// Whether the run should exit nonzero: any invalid entry, any
    /// conflict, or any archive-level failure.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.invalid > 0 || !self.conflicts.is_empty() || !self.archive_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SourceRef;
    use crate::identity::identify;
    use arxcat_filetype::FileTag;
    use arxcat_validate::ValidationOutcome;

    fn entry(bytes: &[u8], outcome: ValidationOutcome) -> RegistryEntry {
        RegistryEntry::new(identify(bytes), SourceRef::new("a.tar", "member"), outcome)
    }

    #[test]
    fn counts_per_status() {
        let entries = vec![
            entry(b"1", ValidationOutcome::valid(FileTag::Pdf)),
            entry(b"2", ValidationOutcome::valid(FileTag::Xml)),
            entry(b"3", ValidationOutcome::invalid(FileTag::Pdf, "truncated")),
            entry(b"4", ValidationOutcome::warning(FileTag::ImagePng, "decoder missing")),
        ];
        let report = Report::aggregate(&entries, Vec::new());
        assert_eq!((report.valid, report.invalid, report.warning), (2, 1, 1));
        assert!(report.has_failures());
    }

    #[test]
    fn clean_run_has_no_failures() {
        let entries = vec![entry(b"1", ValidationOutcome::valid(FileTag::Pdf))];
        let report = Report::aggregate(&entries, Vec::new());
        assert!(!report.has_failures());
    }

    #[test]
    fn unhandled_members_listed() {
        let entries = vec![entry(
            b"1",
            ValidationOutcome::invalid(FileTag::Unknown, "no handler for type tag `unknown`").unhandled(),
        )];
        let report = Report::aggregate(&entries, Vec::new());
        assert_eq!(report.unhandled, vec![PathBuf::from("member")]);
    }

    #[test]
    fn unhandled_tracking_ignores_diagnostic_wording() {
        let entries = vec![entry(b"1", ValidationOutcome::invalid(FileTag::Pdf, "xref table says: no handler"))];
        let report = Report::aggregate(&entries, Vec::new());
        assert!(report.unhandled.is_empty());
    }

    #[test]
    fn merge_accumulates() {
        let mut left = Report { valid: 1, ..Report::default() };
        let right = Report { invalid: 2, archive_failures: vec!["b.tar: corrupt".to_string()], ..Report::default() };
        left.merge(right);
        assert_eq!(left.valid, 1);
        assert_eq!(left.invalid, 2);
        assert!(left.has_failures());
    }
}
