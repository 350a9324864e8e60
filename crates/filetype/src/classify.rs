//! Ordered content probes and the extension fallback.

use crate::tag::{FileKind, FileTag};
use arxcat_archive::{ArchiveMember, Container};
use memchr::memmem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const PDF_MAGIC: &[u8] = b"%PDF-";
const POSTSCRIPT_MAGIC: &[u8] = b"%!PS";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const TIFF_LE_MAGIC: &[u8] = &[0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];
const ICO_MAGIC: &[u8] = &[0x00, 0x00, 0x01, 0x00];

/// How much to trust a classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The tag was established from content signatures.
    Content,
    /// The content was ambiguous; the tag comes from the filename
    /// extension alone.
    Extension,
}

/// A classified member: its path, type tag, and how the tag was reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub path: PathBuf,
    pub tag: FileTag,
    pub confidence: Confidence,
}

impl Classification {
    /// The coarse kind handlers dispatch on.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.tag.kind()
    }
}

/// Classify an extracted member.
///
/// Content signatures win; the filename extension is consulted only to
/// refine an ambiguous probe (PostScript flavor, LaTeX fragment vs main
/// file) or as a last-resort fallback, and fallback results carry
/// [`Confidence::Extension`]. Never fails: anything unrecognized is
/// [`FileTag::Unknown`].
#[instrument(skip(member), fields(path = %member.path.display()))]
pub fn classify(member: &ArchiveMember) -> Classification {
    classify_bytes(&member.path, &member.bytes)
}

/// Classify raw bytes under a path. See [`classify`].
pub fn classify_bytes(path: &Path, bytes: &[u8]) -> Classification {
    let extension = lowercase_extension(path);
    let (tag, confidence) = match probe_content(bytes, extension.as_deref()) {
        Some(tag) => (tag, Confidence::Content),
        None => (extension_fallback(extension.as_deref()), Confidence::Extension),
    };
    tracing::debug!(%tag, ?confidence, "classified member");
    Classification { path: path.to_path_buf(), tag, confidence }
}

/// Ordered content probes. Container shapes first (a gzipped tar would
/// otherwise probe as whatever its first member looks like), then the
/// unambiguous magics, then text formats.
fn probe_content(bytes: &[u8], extension: Option<&str>) -> Option<FileTag> {
    if let Some(container) = Container::detect(bytes) {
        return Some(match container {
            Container::Tar => FileTag::ArchiveTar,
            Container::Tgz => FileTag::ArchiveTgz,
            Container::Gz => FileTag::ArchiveGz,
        });
    }
    if bytes.starts_with(PDF_MAGIC) {
        return Some(FileTag::Pdf);
    }
    if bytes.starts_with(POSTSCRIPT_MAGIC) {
        return Some(postscript_flavor(bytes, extension));
    }
    if let Some(tag) = image_magic(bytes) {
        return Some(tag);
    }
    if xml_prolog(bytes) {
        return Some(FileTag::Xml);
    }
    latex_markers(bytes)
}

/// Distinguish plain PostScript from its encapsulated flavors.
///
/// An `EPSF` marker on the header line is decisive; failing that, an
/// `eps`-family extension refines the tag while the probe itself stays
/// content-grounded (the bytes are PostScript either way).
fn postscript_flavor(bytes: &[u8], extension: Option<&str>) -> FileTag {
    let header_end = memchr::memchr(b'\n', bytes).unwrap_or(bytes.len());
    if memmem::find(&bytes[..header_end], b"EPSF").is_some() {
        return match extension {
            Some("epsf") => FileTag::PostscriptEpsf,
            Some("epsi") => FileTag::PostscriptEpsi,
            _ => FileTag::PostscriptEps,
        };
    }
    match extension {
        Some("eps") => FileTag::PostscriptEps,
        Some("epsf") => FileTag::PostscriptEpsf,
        Some("epsi") => FileTag::PostscriptEpsi,
        _ => FileTag::PostscriptPs,
    }
}

fn image_magic(bytes: &[u8]) -> Option<FileTag> {
    if bytes.starts_with(PNG_MAGIC) {
        Some(FileTag::ImagePng)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(FileTag::ImageGif)
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some(FileTag::ImageJpg)
    } else if bytes.starts_with(b"BM") {
        Some(FileTag::ImageBmp)
    } else if bytes.starts_with(TIFF_LE_MAGIC) || bytes.starts_with(TIFF_BE_MAGIC) {
        Some(FileTag::ImageTiff)
    } else if bytes.starts_with(ICO_MAGIC) {
        Some(FileTag::ImageIco)
    } else {
        None
    }
}

/// An XML declaration, optionally behind a UTF-8 BOM and leading
/// whitespace.
fn xml_prolog(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    bytes[start..].starts_with(b"<?xml")
}

/// LaTeX main-file detection: a document preamble command plus a complete
/// document environment. LaTeX 2e uses `\documentclass`, the legacy 2.09
/// format `\documentstyle`. Fragments without the environment are left to
/// the extension fallback.
fn latex_markers(bytes: &[u8]) -> Option<FileTag> {
    if std::str::from_utf8(bytes).is_err() {
        return None;
    }
    let has = |needle: &[u8]| memmem::find(bytes, needle).is_some();
    if !(has(b"\\begin{document}") && has(b"\\end{document}")) {
        return None;
    }
    if has(b"\\documentclass") {
        Some(FileTag::TexLatex2eMain)
    } else if has(b"\\documentstyle") {
        Some(FileTag::TexLatex209Main)
    } else {
        None
    }
}

fn extension_fallback(extension: Option<&str>) -> FileTag {
    extension
        .map(FileTag::from_extension)
        .and_then(|candidates| candidates.first().copied())
        .unwrap_or(FileTag::Unknown)
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn classified(path: &str, bytes: &[u8]) -> Classification {
        classify_bytes(Path::new(path), bytes)
    }

    #[rstest]
    #[case("doc.pdf", b"%PDF-1.4 rest of file" as &[u8], FileTag::Pdf)]
    #[case("fig.ps", b"%!PS-Adobe-3.0\n0 0 moveto", FileTag::PostscriptPs)]
    #[case("fig.eps", b"%!PS-Adobe-3.0 EPSF-3.0\n", FileTag::PostscriptEps)]
    #[case("fig.epsi", b"%!PS-Adobe-3.0 EPSF-3.0\n", FileTag::PostscriptEpsi)]
    #[case("img.png", &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00], FileTag::ImagePng)]
    #[case("img.gif", b"GIF89a\x01\x00", FileTag::ImageGif)]
    #[case("img.jpg", &[0xFF, 0xD8, 0xFF, 0xE0], FileTag::ImageJpg)]
    #[case("meta.xml", b"<?xml version=\"1.0\"?><arXivSRC/>", FileTag::Xml)]
    #[case("meta.xml", b"\xEF\xBB\xBF<?xml version=\"1.0\"?>", FileTag::Xml)]
    fn content_probes(#[case] path: &str, #[case] bytes: &[u8], #[case] tag: FileTag) {
        let classification = classified(path, bytes);
        assert_eq!(classification.tag, tag);
        assert_eq!(classification.confidence, Confidence::Content);
    }

    #[test]
    fn latex_main_file_detected() {
        let source = b"\\documentclass{article}\n\\begin{document}\nhi\n\\end{document}\n";
        let classification = classified("main.tex", source);
        assert_eq!(classification.tag, FileTag::TexLatex2eMain);
        assert_eq!(classification.confidence, Confidence::Content);
        assert_eq!(classification.kind(), FileKind::PostscriptTex);
    }

    #[test]
    fn legacy_latex_main_file_detected() {
        let source = b"\\documentstyle[12pt]{article}\n\\begin{document}\nhi\n\\end{document}\n";
        assert_eq!(classified("old.tex", source).tag, FileTag::TexLatex209Main);
    }

    #[test]
    fn tex_fragment_falls_back_to_extension() {
        let classification = classified("macros.tex", b"\\newcommand{\\x}{y}\n");
        assert_eq!(classification.tag, FileTag::TexTex);
        assert_eq!(classification.confidence, Confidence::Extension);
    }

    #[test]
    fn extension_does_not_override_content() {
        // A PDF renamed to .tex still classifies as PDF.
        let classification = classified("sneaky.tex", b"%PDF-1.7 stream");
        assert_eq!(classification.tag, FileTag::Pdf);
        assert_eq!(classification.confidence, Confidence::Content);
    }

    #[test]
    fn gzip_payload_is_archive() {
        let gz = arxcat_compress::Compression::Gzip.compress(b"\\documentclass").unwrap();
        let classification = classified("1202.3054.gz", &gz);
        assert_eq!(classification.tag, FileTag::ArchiveGz);
        assert_eq!(classification.kind(), FileKind::Archive);
    }

    #[test]
    fn tgz_payload_is_archive() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_cksum();
        builder.append_data(&mut header, "a.tex", &b"hi"[..]).unwrap();
        let tgz = arxcat_compress::Compression::Gzip.compress(&builder.into_inner().unwrap()).unwrap();
        assert_eq!(classified("1202.3054.gz", &tgz).tag, FileTag::ArchiveTgz);
    }

    #[rstest]
    #[case("mystery.bin")]
    #[case("noextension")]
    fn unrecognized_content_is_unknown(#[case] path: &str) {
        let classification = classified(path, b"\x00\x01\x02\x03 nothing recognizable");
        assert_eq!(classification.tag, FileTag::Unknown);
        assert_eq!(classification.kind(), FileKind::Unknown);
    }
}
