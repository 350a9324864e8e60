//! Structural PDF validation.

use crate::error::Result;
use crate::handler::Handler;
use crate::outcome::ValidationOutcome;
use arxcat_archive::ArchiveMember;
use arxcat_filetype::Classification;
use memchr::memmem;

const HEADER: &[u8] = b"%PDF-";
const TRAILER: &[u8] = b"%%EOF";
/// How far from the end the trailer marker may legitimately sit (a PDF may
/// carry trailing whitespace or a few bytes of junk after `%%EOF`).
const TRAILER_WINDOW: usize = 1024;

/// Validates PDF members structurally: header with version, end-of-file
/// trailer, and a page-object count. No content stream decoding.
pub struct PdfHandler;

impl Handler for PdfHandler {
    fn validate(&self, member: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome> {
        let bytes = &member.bytes;
        let tag = classification.tag;

        if !bytes.starts_with(HEADER) {
            return Ok(ValidationOutcome::invalid(tag, "missing %PDF- header"));
        }
        let mut outcome = ValidationOutcome::valid(tag);
        if let Some(version) = header_version(bytes) {
            outcome = outcome.meta("version", version);
        }

        let tail_start = bytes.len().saturating_sub(TRAILER_WINDOW);
        if memmem::find(&bytes[tail_start..], TRAILER).is_none() {
            return Ok(ValidationOutcome::invalid(tag, "missing %%EOF trailer, file is likely truncated"));
        }

        let pages = page_count(bytes);
        if pages == 0 {
            outcome = outcome.diagnostic("no page objects found");
        }
        Ok(outcome.meta("page_count", pages))
    }
}

/// The version digits following `%PDF-`, e.g. `1.4`.
fn header_version(bytes: &[u8]) -> Option<String> {
    let rest = &bytes[HEADER.len()..];
    let end = rest.iter().position(|b| !(b.is_ascii_digit() || *b == b'.')).unwrap_or(rest.len());
    (end > 0).then(|| String::from_utf8_lossy(&rest[..end]).into_owned())
}

/// Count page objects: `/Type /Page` occurrences that are not the
/// `/Pages` tree node.
fn page_count(bytes: &[u8]) -> u64 {
    let mut count = 0;
    for needle in [b"/Type /Page" as &[u8], b"/Type/Page"] {
        for position in memmem::find_iter(bytes, needle) {
            let next = bytes.get(position + needle.len());
            if next != Some(&b's') {
                count += 1;
            }
        }
    }
    count
}
