//! Content-first file type classification.
//!
//! Submission archives carry whatever their authors uploaded: TeX sources,
//! PDFs, PostScript figures, images, the odd XML manifest, and plenty of
//! files whose extension lies about their content. Classification here
//! trusts content signatures first and falls back to the filename extension
//! only when the bytes are ambiguous, marking such results as low
//! confidence.
//!
//! Classification never fails: unrecognized content is tagged
//! [`FileTag::Unknown`] and still flows through dispatch so it shows up in
//! diagnostics instead of vanishing.

mod classify;
mod tag;

pub use crate::classify::{Classification, Confidence, classify, classify_bytes};
pub use crate::tag::{FileKind, FileTag};
