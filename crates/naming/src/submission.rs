//! Submission filenames and extension-based submission typing.

use arxcat_filetype::FileTag;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::LazyLock;

static OLD_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z\-]+)(\d{2})(\d{2})(\d{3})$").expect("static pattern compiles"));
static CURRENT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})\.(\d{4,5})$").expect("static pattern compiles"));

/// A parsed submission filename.
///
/// Pre-2008 submissions carry their subject category in the name
/// (`cond-mat9602101.gz` is cond-mat/9602101); current ones are numeric
/// (`1202.3054.gz` is arXiv 1202.3054). Either way the payload extension
/// is `.gz` or `.pdf`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionName {
    Old { category: String, yy: u8, month: u8, number: String },
    Current { yy: u8, month: u8, number: String },
}

impl SubmissionName {
    /// Parse a submission filename. Returns `None` for anything outside
    /// the two conventions, including out-of-range months; the caller
    /// records the mismatch as a diagnostic, so this is not an error.
    #[must_use]
    pub fn parse(name: impl AsRef<Path>) -> Option<Self> {
        let name = name.as_ref();
        let extension = name.extension()?.to_str()?;
        if !matches!(extension, "gz" | "pdf") {
            return None;
        }
        let stem = name.file_stem()?.to_str()?;

        let parsed = if let Some(captures) = OLD_STYLE.captures(stem) {
            Self::Old {
                category: captures[1].to_string(),
                yy: captures[2].parse().ok()?,
                month: captures[3].parse().ok()?,
                number: captures[4].to_string(),
            }
        } else if let Some(captures) = CURRENT_STYLE.captures(stem) {
            Self::Current {
                yy: captures[1].parse().ok()?,
                month: captures[2].parse().ok()?,
                number: captures[3].to_string(),
            }
        } else {
            return None;
        };
        (1..=12).contains(&parsed.month()).then_some(parsed)
    }

    #[must_use]
    pub fn month(&self) -> u8 {
        match self {
            Self::Old { month, .. } | Self::Current { month, .. } => *month,
        }
    }

    /// The canonical abstract page URL for this submission.
    #[must_use]
    pub fn url(&self) -> String {
        match self {
            Self::Old { category, yy, month, number } => {
                format!("https://arxiv.org/abs/{category}/{yy:02}{month:02}{number}")
            },
            Self::Current { yy, month, number } => format!("https://arxiv.org/abs/{yy:02}{month:02}.{number}"),
        }
    }
}

impl Display for SubmissionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Old { category, yy, month, number } => write!(f, "{category}{yy:02}{month:02}{number}"),
            Self::Current { yy, month, number } => write!(f, "{yy:02}{month:02}.{number}"),
        }
    }
}

/// Overall submission type derived from the extensions of a submission's
/// file list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    Pdf,
    Postscript,
    Tex,
    Unknown,
}

impl Display for SubmissionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            SubmissionType::Pdf => "pdf",
            SubmissionType::Postscript => "postscript",
            SubmissionType::Tex => "tex",
            SubmissionType::Unknown => "unknown",
        })
    }
}

/// File tags a TeX submission may legitimately contain besides its main
/// file.
const TEX_SUPPORTING: &[FileTag] = &[
    FileTag::TexLog,
    FileTag::TexFig,
    FileTag::ImageGif,
    FileTag::ImagePng,
    FileTag::ImageJpg,
    FileTag::TexBib,
    FileTag::TexClo,
    FileTag::TexBst,
    FileTag::TexToc,
    FileTag::TexCls,
    FileTag::TexBbl,
    FileTag::PostscriptEpsf,
    FileTag::TexPstexT,
    FileTag::TexPstex,
    FileTag::TexSty,
    FileTag::TexLatex209Main,
    FileTag::TexLatex2eMain,
    FileTag::TexTex,
    FileTag::Pdf,
    FileTag::PostscriptPs,
    FileTag::PostscriptEpsi,
    FileTag::PostscriptEps,
];

const TEX_MAIN: &[FileTag] = &[FileTag::TexTex, FileTag::TexLatex209Main, FileTag::TexLatex2eMain];

/// Classify a submission by the extensions of its file list.
///
/// Pure PostScript and pure PDF submissions are exactly that. A TeX
/// submission needs at least one candidate main file, and every other
/// file must come from the supporting set; one residual file outside it
/// makes the whole submission `Unknown`. This corroborates content
/// validation, it does not replace it.
#[must_use]
pub fn submission_type_by_extension<'a>(paths: impl IntoIterator<Item = &'a Path>) -> SubmissionType {
    let mut tags: HashSet<FileTag> = HashSet::new();
    for path in paths {
        let candidates = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FileTag::from_extension(&ext.to_lowercase()))
            .unwrap_or_default();
        match candidates.is_empty() {
            true => {
                tags.insert(FileTag::Unknown);
            },
            false => tags.extend(candidates),
        }
    }

    if tags.len() == 1 && tags.contains(&FileTag::PostscriptPs) {
        return SubmissionType::Postscript;
    }
    if tags.len() == 1 && tags.contains(&FileTag::Pdf) {
        return SubmissionType::Pdf;
    }
    if TEX_MAIN.iter().any(|tag| tags.contains(tag)) {
        let residual = tags.iter().filter(|tag| !TEX_SUPPORTING.contains(tag)).count();
        return match residual {
            0 => SubmissionType::Tex,
            _ => SubmissionType::Unknown,
        };
    }
    SubmissionType::Unknown
}
