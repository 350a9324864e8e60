//! Bulk archive filenames: `arXiv_src_{yymm}_{seq}.tar`.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::LazyLock;

static BULK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arXiv_src_(\d{2})(\d{2})_(\d{3})\.tar$").expect("static pattern compiles"));

/// A parsed bulk archive name.
///
/// `arXiv_src_9902_005.tar` is the fifth bulk file of February 1999.
/// Two-digit years pivot at 90: above it is the 1990s, at or below it the
/// 2000s (the bucket starts in 1991).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulkArchiveName {
    pub yy: u8,
    pub month: u8,
    pub sequence: u16,
}

impl BulkArchiveName {
    /// Parse a bulk archive filename. Directory components are ignored;
    /// the month must be in range.
    pub fn parse(name: impl AsRef<Path>) -> Result<Self> {
        let name = name.as_ref();
        let basename = name.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let invalid = || ErrorKind::InvalidName(name.display().to_string());

        let captures = BULK_PATTERN.captures(basename).ok_or_raise(invalid)?;
        // Digits-only by construction of the pattern.
        let yy: u8 = captures[1].parse().ok().ok_or_raise(invalid)?;
        let month: u8 = captures[2].parse().ok().ok_or_raise(invalid)?;
        let sequence: u16 = captures[3].parse().ok().ok_or_raise(invalid)?;
        if !(1..=12).contains(&month) {
            exn::bail!(invalid());
        }
        Ok(Self { yy, month, sequence })
    }

    /// Four-digit year: two-digit years above 90 are the 1990s, the rest
    /// the 2000s.
    #[must_use]
    pub fn year(&self) -> u16 {
        match self.yy > 90 {
            true => 1900 + u16::from(self.yy),
            false => 2000 + u16::from(self.yy),
        }
    }

    /// The requester-pays object URI for this archive.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("s3://arxiv/src/{self}")
    }

    /// The object key within the bucket.
    #[must_use]
    pub fn key(&self) -> String {
        format!("src/{self}")
    }
}

impl Display for BulkArchiveName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "arXiv_src_{:02}{:02}_{:03}.tar", self.yy, self.month, self.sequence)
    }
}
