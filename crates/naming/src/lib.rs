//! arXiv naming conventions and the source bucket manifest.
//!
//! The bucket's layout is all convention: bulk archives are named
//! `arXiv_src_{yymm}_{seq}.tar`, the submissions inside follow either the
//! pre-2008 `{category}{yymm}{number}` scheme or the current
//! `{yymm}.{number}` scheme, and `arXiv_src_manifest.xml` indexes every
//! bulk archive with sizes, checksums, and item ranges. This crate parses
//! and cross-checks those conventions; it corroborates content-based
//! classification, it never replaces it.

mod bulk;
pub mod error;
mod manifest;
mod submission;

pub use crate::bulk::BulkArchiveName;
pub use crate::manifest::{Manifest, ManifestEntry};
pub use crate::submission::{SubmissionName, SubmissionType, submission_type_by_extension};
