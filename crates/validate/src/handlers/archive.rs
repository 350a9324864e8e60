//! Nested archive validation.

use crate::error::Result;
use crate::handler::Handler;
use crate::outcome::{Status, ValidationOutcome};
use arxcat_archive::{ArchiveMember, Container, Extractor, member_paths_unique};
use arxcat_filetype::{Classification, FileTag};
use arxcat_naming::submission_type_by_extension;
use std::path::PathBuf;

/// Validates archive members: container integrity, member path safety,
/// case-insensitive path uniqueness, and nesting depth.
///
/// Submissions legitimately nest one level (a bulk tar holds gzipped
/// submissions, a submission holds its source files), so `max_depth`
/// bounds the recursion rather than forbidding it. Anything deeper is
/// invalid, not an error: the archive is readable, it just breaks the
/// conventions.
pub struct ArchiveHandler {
    max_depth: usize,
}

impl ArchiveHandler {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    fn inspect(&self, name: &str, bytes: &[u8], tag: FileTag, depth: usize) -> ValidationOutcome {
        let mut extractor = match Extractor::open_named(name, bytes) {
            Ok(extractor) => extractor,
            Err(error) => return ValidationOutcome::invalid(tag, error.to_string()),
        };
        let container = extractor.container();
        let mut outcome = ValidationOutcome::valid(tag).meta("container", container.to_string());

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut total_size: u64 = 0;
        let members = match extractor.members() {
            Ok(members) => members,
            Err(error) => return ValidationOutcome::invalid(tag, error.to_string()),
        };
        for member in members {
            let member = match member {
                Ok(member) => member,
                Err(error) => {
                    outcome.status = Status::Invalid;
                    outcome.diagnostics.push(error.to_string());
                    continue;
                },
            };
            total_size += member.size();
            if Container::detect(&member.bytes).is_some() {
                if depth >= self.max_depth {
                    outcome.status = Status::Invalid;
                    outcome.diagnostics.push(format!(
                        "nested archive `{}` exceeds depth limit of {}",
                        member.path.display(),
                        self.max_depth
                    ));
                } else {
                    let label = member.path.to_string_lossy();
                    let nested = self.inspect(&label, &member.bytes, tag, depth + 1);
                    if nested.status != Status::Valid {
                        outcome.status = Status::Invalid;
                        for diagnostic in nested.diagnostics {
                            outcome.diagnostics.push(format!("in `{label}`: {diagnostic}"));
                        }
                    }
                }
            }
            paths.push(member.path);
        }

        if !member_paths_unique(paths.iter().map(PathBuf::as_path)) {
            outcome.status = Status::Invalid;
            outcome.diagnostics.push("member paths collide on case-insensitive filesystems".to_string());
        }
        let submission_type = submission_type_by_extension(paths.iter().map(PathBuf::as_path));
        outcome
            .meta("member_count", paths.len())
            .meta("total_size", total_size)
            .meta("submission_type", submission_type.to_string())
    }
}

impl Handler for ArchiveHandler {
    fn validate(&self, member: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome> {
        let name = member.path.to_string_lossy();
        Ok(self.inspect(&name, &member.bytes, classification.tag, 1))
    }
}
