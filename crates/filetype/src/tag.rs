//! File type tags and the coarse dispatch kinds they roll up into.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Fine-grained file type tag.
///
/// Covers everything the submission corpus is known to contain. Tags are
/// deliberately specific (a `.bbl` is not just "some TeX file") because the
/// registry records them and later tooling filters on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileTag {
    Unknown,

    ArchiveGz,
    ArchiveTar,
    ArchiveTgz,

    ImageBmp,
    ImageGif,
    ImageIco,
    ImageJpg,
    ImagePng,
    ImageSvg,
    ImageTiff,

    Pdf,

    PostscriptPs,
    PostscriptEps,
    PostscriptEpsf,
    PostscriptEpsi,

    Xml,

    TexAux,
    TexBbl,
    TexBib,
    TexBst,
    TexClo,
    TexCls,
    TexDvi,
    TexFig,
    TexLog,
    TexPstex,
    TexPstexT,
    TexSty,
    TexSynctex,
    TexTex,
    TexLatex209Main,
    TexLatex2eMain,
    TexTikz,
    TexToc,
}

/// Coarse type kind used for handler dispatch.
///
/// Every [`FileTag`] rolls up into exactly one kind; handlers register per
/// kind, not per tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Archive,
    Pdf,
    PostscriptTex,
    Image,
    Xml,
    Unknown,
}

impl FileTag {
    /// The dispatch kind this tag belongs to.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        use FileTag::*;
        match self {
            Unknown => FileKind::Unknown,
            ArchiveGz | ArchiveTar | ArchiveTgz => FileKind::Archive,
            ImageBmp | ImageGif | ImageIco | ImageJpg | ImagePng | ImageSvg | ImageTiff => FileKind::Image,
            Pdf => FileKind::Pdf,
            Xml => FileKind::Xml,
            PostscriptPs | PostscriptEps | PostscriptEpsf | PostscriptEpsi | TexAux | TexBbl | TexBib | TexBst
            | TexClo | TexCls | TexDvi | TexFig | TexLog | TexPstex | TexPstexT | TexSty | TexSynctex | TexTex
            | TexLatex209Main | TexLatex2eMain | TexTikz | TexToc => FileKind::PostscriptTex,
        }
    }

    /// Candidate tags for a lowercase filename extension (without the dot).
    ///
    /// An extension can admit several tags (`tex` may be a plain source
    /// fragment or a LaTeX main file); content probes disambiguate. Unknown
    /// extensions yield an empty slice.
    #[must_use]
    pub fn from_extension(extension: &str) -> &'static [FileTag] {
        use FileTag::*;
        match extension {
            "gz" => &[ArchiveGz],
            "tar" => &[ArchiveTar],
            "tgz" => &[ArchiveTgz],
            "bmp" => &[ImageBmp],
            "gif" => &[ImageGif],
            "ico" => &[ImageIco],
            "jpg" | "jpeg" => &[ImageJpg],
            "png" => &[ImagePng],
            "svg" => &[ImageSvg],
            "tif" | "tiff" => &[ImageTiff],
            "pdf" => &[Pdf],
            "ps" => &[PostscriptPs],
            "eps" => &[PostscriptEps],
            "epsf" => &[PostscriptEpsf],
            "epsi" => &[PostscriptEpsi],
            "xml" => &[Xml],
            "aux" => &[TexAux],
            "bbl" => &[TexBbl],
            "bib" => &[TexBib],
            "bst" => &[TexBst],
            "clo" => &[TexClo],
            "cls" => &[TexCls],
            "dvi" => &[TexDvi],
            "fig" => &[TexFig],
            "log" => &[TexLog],
            "pstex" => &[TexPstex],
            "pstex_t" => &[TexPstexT],
            "sty" => &[TexSty],
            "synctex" => &[TexSynctex],
            "tex" => &[TexTex, TexLatex209Main, TexLatex2eMain],
            "tikz" => &[TexTikz],
            "toc" => &[TexToc],
            _ => &[],
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        use FileTag::*;
        match self {
            Unknown => "unknown",
            ArchiveGz => "archive_gz",
            ArchiveTar => "archive_tar",
            ArchiveTgz => "archive_tgz",
            ImageBmp => "image_bmp",
            ImageGif => "image_gif",
            ImageIco => "image_ico",
            ImageJpg => "image_jpg",
            ImagePng => "image_png",
            ImageSvg => "image_svg",
            ImageTiff => "image_tiff",
            Pdf => "pdf",
            PostscriptPs => "postscript_ps",
            PostscriptEps => "postscript_eps",
            PostscriptEpsf => "postscript_epsf",
            PostscriptEpsi => "postscript_epsi",
            Xml => "xml",
            TexAux => "tex_aux",
            TexBbl => "tex_bbl",
            TexBib => "tex_bib",
            TexBst => "tex_bst",
            TexClo => "tex_clo",
            TexCls => "tex_cls",
            TexDvi => "tex_dvi",
            TexFig => "tex_fig",
            TexLog => "tex_log",
            TexPstex => "tex_pstex",
            TexPstexT => "tex_pstex_t",
            TexSty => "tex_sty",
            TexSynctex => "tex_synctex",
            TexTex => "tex_tex",
            TexLatex209Main => "tex_latex_209_main",
            TexLatex2eMain => "tex_latex_2e_main",
            TexTikz => "tex_tikz",
            TexToc => "tex_toc",
        }
    }
}

impl Display for FileTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FileKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Archive => "archive",
            FileKind::Pdf => "pdf",
            FileKind::PostscriptTex => "postscript-tex",
            FileKind::Image => "image",
            FileKind::Xml => "xml",
            FileKind::Unknown => "unknown",
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FileTag::ArchiveGz, FileKind::Archive)]
    #[case(FileTag::ImagePng, FileKind::Image)]
    #[case(FileTag::Pdf, FileKind::Pdf)]
    #[case(FileTag::PostscriptEps, FileKind::PostscriptTex)]
    #[case(FileTag::TexLatex2eMain, FileKind::PostscriptTex)]
    #[case(FileTag::Xml, FileKind::Xml)]
    #[case(FileTag::Unknown, FileKind::Unknown)]
    fn tag_rolls_up_to_kind(#[case] tag: FileTag, #[case] kind: FileKind) {
        assert_eq!(tag.kind(), kind);
    }

    #[test]
    fn tex_extension_admits_several_tags() {
        let tags = FileTag::from_extension("tex");
        assert!(tags.contains(&FileTag::TexTex));
        assert!(tags.contains(&FileTag::TexLatex2eMain));
    }

    #[test]
    fn unknown_extension_yields_nothing() {
        assert!(FileTag::from_extension("docx").is_empty());
    }

    #[test]
    fn display_matches_serde_spelling() {
        assert_eq!(FileTag::TexPstexT.to_string(), "tex_pstex_t");
        assert_eq!(FileKind::PostscriptTex.to_string(), "postscript-tex");
    }
}
