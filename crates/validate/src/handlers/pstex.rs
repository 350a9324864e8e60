//! PostScript and TeX validation.

use crate::error::Result;
use crate::handler::Handler;
use crate::outcome::ValidationOutcome;
use arxcat_archive::ArchiveMember;
use arxcat_filetype::{Classification, FileTag};
use memchr::memmem;

const PS_HEADER: &[u8] = b"%!PS";
const DVI_MAGIC: &[u8] = &[0xF7, 0x02];

/// Validates the PostScript/TeX family.
///
/// PostScript members must carry the `%!PS` signature; encapsulated
/// flavors should also declare a bounding box. LaTeX main files must carry
/// a complete document environment in order. Everything else in the TeX
/// family (style files, bibliographies, logs) is plain text and only has
/// to decode as UTF-8; DVI and the PostScript half of an xfig export are
/// the binary exceptions.
pub struct PsTexHandler;

impl Handler for PsTexHandler {
    fn validate(&self, member: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome> {
        let bytes = &member.bytes;
        let tag = classification.tag;
        let outcome = match tag {
            FileTag::PostscriptPs | FileTag::PostscriptEps | FileTag::PostscriptEpsf | FileTag::PostscriptEpsi
            | FileTag::TexPstex => validate_postscript(tag, bytes),
            FileTag::TexLatex2eMain => validate_latex_main(tag, bytes, b"\\documentclass", "latex2e"),
            FileTag::TexLatex209Main => validate_latex_main(tag, bytes, b"\\documentstyle", "latex209"),
            FileTag::TexDvi => match bytes.starts_with(DVI_MAGIC) {
                true => ValidationOutcome::valid(tag).meta("format", "dvi"),
                false => ValidationOutcome::invalid(tag, "missing DVI preamble"),
            },
            _ => validate_text_fragment(tag, bytes),
        };
        Ok(outcome)
    }
}

fn validate_postscript(tag: FileTag, bytes: &[u8]) -> ValidationOutcome {
    if !bytes.starts_with(PS_HEADER) {
        return ValidationOutcome::invalid(tag, "missing %!PS signature");
    }
    let mut outcome = ValidationOutcome::valid(tag);
    if let Some(bounding_box) = dsc_comment(bytes, b"%%BoundingBox:") {
        outcome = outcome.meta("bounding_box", bounding_box);
    } else if matches!(tag, FileTag::PostscriptEps | FileTag::PostscriptEpsf | FileTag::PostscriptEpsi) {
        outcome = outcome.diagnostic("encapsulated PostScript without %%BoundingBox");
    }
    outcome
}

fn validate_latex_main(tag: FileTag, bytes: &[u8], preamble: &[u8], flavor: &str) -> ValidationOutcome {
    if std::str::from_utf8(bytes).is_err() {
        return ValidationOutcome::invalid(tag, "not valid UTF-8 text");
    }
    let preamble_at = memmem::find(bytes, preamble);
    let begin_at = memmem::find(bytes, b"\\begin{document}");
    let end_at = memmem::find(bytes, b"\\end{document}");
    match (preamble_at, begin_at, end_at) {
        (Some(p), Some(b), Some(e)) if p < b && b < e => {
            ValidationOutcome::valid(tag).meta("flavor", flavor)
        },
        (Some(_), Some(_), Some(_)) => {
            ValidationOutcome::invalid(tag, "document environment out of order")
        },
        _ => ValidationOutcome::invalid(tag, "incomplete document environment"),
    }
}

fn validate_text_fragment(tag: FileTag, bytes: &[u8]) -> ValidationOutcome {
    match std::str::from_utf8(bytes) {
        Ok(text) => ValidationOutcome::valid(tag).meta("line_count", text.lines().count()),
        Err(_) => ValidationOutcome::invalid(tag, "not valid UTF-8 text"),
    }
}

/// The remainder of the first line carrying the given DSC comment.
fn dsc_comment(bytes: &[u8], key: &[u8]) -> Option<String> {
    let start = memmem::find(bytes, key)? + key.len();
    let end = memchr::memchr2(b'\r', b'\n', &bytes[start..]).map_or(bytes.len(), |offset| start + offset);
    Some(String::from_utf8_lossy(&bytes[start..end]).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use std::path::Path;

    fn validate(path: &str, bytes: &[u8]) -> ValidationOutcome {
        let member = ArchiveMember::new(path, bytes.to_vec());
        let classification = arxcat_filetype::classify_bytes(Path::new(path), bytes);
        PsTexHandler.validate(&member, &classification).unwrap()
    }

    #[test]
    fn eps_with_bounding_box_is_valid() {
        let bytes = b"%!PS-Adobe-3.0 EPSF-3.0\n%%BoundingBox: 0 0 612 792\nshowpage\n";
        let outcome = validate("fig.eps", bytes);
        assert_eq!(outcome.status, Status::Valid);
        assert_eq!(outcome.metadata["bounding_box"], serde_json::json!("0 0 612 792"));
    }

    #[test]
    fn eps_without_bounding_box_gets_diagnostic() {
        let outcome = validate("fig.eps", b"%!PS-Adobe-3.0 EPSF-3.0\nshowpage\n");
        assert_eq!(outcome.status, Status::Valid);
        assert!(outcome.diagnostics.iter().any(|d| d.contains("BoundingBox")));
    }

    #[test]
    fn postscript_without_signature_is_invalid() {
        let member = ArchiveMember::new("fig.ps", b"not postscript".to_vec());
        let classification = arxcat_filetype::classify_bytes(Path::new("fig.ps"), &member.bytes);
        let outcome = PsTexHandler.validate(&member, &classification).unwrap();
        assert_eq!(outcome.status, Status::Invalid);
    }

    #[test]
    fn latex_main_file_is_valid() {
        let source = b"\\documentclass{article}\n\\begin{document}\nbody\n\\end{document}\n";
        let outcome = validate("main.tex", source);
        assert_eq!(outcome.status, Status::Valid);
        assert_eq!(outcome.metadata["flavor"], serde_json::json!("latex2e"));
    }

    #[test]
    fn legacy_latex_main_file_is_valid() {
        let source = b"\\documentstyle{article}\n\\begin{document}\nbody\n\\end{document}\n";
        let outcome = validate("old.tex", source);
        assert_eq!(outcome.status, Status::Valid);
        assert_eq!(outcome.metadata["flavor"], serde_json::json!("latex209"));
    }

    #[test]
    fn out_of_order_document_environment_is_invalid() {
        let source = b"\\documentclass{article}\n\\end{document}\nbody\n\\begin{document}\n";
        let outcome = validate("main.tex", source);
        assert_eq!(outcome.status, Status::Invalid);
        assert!(outcome.diagnostics[0].contains("out of order"));
    }

    #[test]
    fn text_fragment_counts_lines() {
        let outcome = validate("refs.bib", b"@article{a,\n  title={T}\n}\n");
        assert_eq!(outcome.status, Status::Valid);
        assert_eq!(outcome.metadata["line_count"], serde_json::json!(3));
    }

    #[test]
    fn binary_fragment_is_invalid() {
        let outcome = validate("style.sty", &[0xFF, 0xFE, 0x00, 0x01]);
        assert_eq!(outcome.status, Status::Invalid);
    }

    #[test]
    fn dvi_preamble_checked() {
        let outcome = validate("paper.dvi", &[0xF7, 0x02, 0x01, 0x00]);
        assert_eq!(outcome.status, Status::Valid);
        assert_eq!(validate("paper.dvi", b"junk").status, Status::Invalid);
    }
}
