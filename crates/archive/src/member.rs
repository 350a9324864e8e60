//! Extracted archive members and member-path validation.

use crate::error::{ErrorKind, Result};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Longest member path accepted by the submission conventions.
const MAX_MEMBER_PATH_LENGTH: usize = 250;

/// Characters allowed in each path component: alphanumeric, underscore,
/// period, plus, minus and equals.
static ALLOWED_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-.+=]+$").expect("static pattern compiles"));

/// A single file extracted from an archive.
///
/// Ephemeral: owned by the extraction pass and dropped once the member has
/// been dispatched, so a large archive is never fully resident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Path of the member relative to the archive root, already validated.
    pub path: PathBuf,
    /// Raw (still compressed, if the member is itself a container) content.
    pub bytes: Vec<u8>,
}

impl ArchiveMember {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { path: path.into(), bytes: bytes.into() }
    }

    /// Size of the member content in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Validate a member path against the submission naming rules.
///
/// Accepts only relative paths whose components consist of alphanumerics,
/// `_`, `-`, `.`, `+` and `=`, with no empty, `.` or `..` components and a
/// total length under 250 characters. This is stricter than general
/// traversal protection on purpose: anything outside the convention is
/// suspect in a submission archive.
///
/// # Examples
///
/// ```
/// use arxcat_archive::validate_member_path;
/// assert!(validate_member_path("1202.3054/main.tex").is_ok());
/// assert!(validate_member_path("../etc/passwd").is_err());
/// assert!(validate_member_path("/absolute/path").is_err());
/// assert!(validate_member_path("spaces in name.tex").is_err());
/// ```
pub fn validate_member_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    use exn::OptionExt;
    let path = path.as_ref();
    let as_str = path.to_str().ok_or_raise(|| ErrorKind::MemberPath(path.to_path_buf()))?;
    if as_str.is_empty() || as_str.len() >= MAX_MEMBER_PATH_LENGTH {
        exn::bail!(ErrorKind::MemberPath(path.to_path_buf()));
    }
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_raise(|| ErrorKind::MemberPath(path.to_path_buf()))?;
                if !ALLOWED_COMPONENT.is_match(part) {
                    exn::bail!(ErrorKind::MemberPath(path.to_path_buf()));
                }
                components.push(part);
            },
            // No absolute paths, no `.`/`..`, no Windows prefixes.
            _ => exn::bail!(ErrorKind::MemberPath(path.to_path_buf())),
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::MemberPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Check that a list of member paths stays unique on case-insensitive
/// filesystems.
///
/// Bulk archives are unpacked by all sorts of tooling; two members whose
/// paths differ only by case will clobber each other on such systems, so
/// the archive handler reports them.
#[must_use]
pub fn member_paths_unique<'a>(paths: impl IntoIterator<Item = &'a Path>) -> bool {
    let mut seen = std::collections::HashSet::new();
    paths.into_iter().all(|path| seen.insert(path.to_string_lossy().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1202.3054.gz")]
    #[case("cond-mat9602101.gz")]
    #[case("figures/plot-1.eps")]
    #[case("a+b=c.tex")]
    fn valid_member_paths(#[case] path: &str) {
        assert_eq!(validate_member_path(path).unwrap(), PathBuf::from(path));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../escape.tex")]
    #[case("nested/../../escape.tex")]
    #[case("/absolute.tex")]
    #[case("has space.tex")]
    #[case("has\ttab.tex")]
    #[case("shell$(cmd).tex")]
    fn invalid_member_paths(#[case] path: &str) {
        assert!(validate_member_path(path).is_err());
    }

    #[test]
    fn over_long_path_rejected() {
        let long = "a".repeat(MAX_MEMBER_PATH_LENGTH);
        assert!(validate_member_path(&long).is_err());
        let ok = "a".repeat(MAX_MEMBER_PATH_LENGTH - 1);
        assert!(validate_member_path(&ok).is_ok());
    }

    #[test]
    fn uniqueness_is_case_insensitive() {
        let a = PathBuf::from("Main.tex");
        let b = PathBuf::from("main.tex");
        let c = PathBuf::from("other.tex");
        assert!(member_paths_unique([a.as_path(), c.as_path()]));
        assert!(!member_paths_unique([a.as_path(), b.as_path()]));
    }

    #[test]
    fn member_size() {
        let member = ArchiveMember::new("file.txt", b"12345".to_vec());
        assert_eq!(member.size(), 5);
    }
}
