//! The source bucket manifest, `arXiv_src_manifest.xml`.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use time::PrimitiveDateTime;
use time::macros::format_description;
use tracing::instrument;

/// Header timestamp, e.g. `Mon Apr  7 04:58:03 2025`.
const HEADER_TIMESTAMP: &[time::format_description::BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
);
/// Per-file timestamp, e.g. `2010-12-23 00:13:59`.
const ENTRY_TIMESTAMP: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const REQUIRED_ENTRY_FIELDS: &[&str] = &[
    "content_md5sum",
    "filename",
    "first_item",
    "last_item",
    "md5sum",
    "num_items",
    "seq_num",
    "size",
    "timestamp",
    "yymm",
];

/// One bulk archive as described by the manifest.
///
/// Timestamps are kept naive: the manifest writes bucket-local (US
/// Eastern) wall-clock times without an offset, and every comparison this
/// crate makes is between two values from the same zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Object key as written in the manifest, `src/arXiv_src_{yymm}_{seq}.tar`.
    pub filename: String,
    pub size_bytes: u64,
    pub timestamp: PrimitiveDateTime,
    pub year: u16,
    pub month: u8,
    pub sequence: u16,
    pub num_items: u64,
    pub first_item: String,
    pub last_item: String,
    pub md5: String,
    pub content_md5: String,
}

/// The parsed manifest: a header timestamp plus one entry per bulk
/// archive, keyed by the archive basename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub timestamp: PrimitiveDateTime,
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Parse manifest XML.
    ///
    /// Every `<file>` entry must carry the full field set, its filename
    /// must agree with its own `yymm`/`seq_num` fields, its month must be
    /// in range, and basenames must be unique.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut path: Vec<String> = Vec::new();
        let mut header_timestamp: Option<String> = None;
        let mut current: HashMap<String, String> = HashMap::new();
        let mut entries = BTreeMap::new();
        let mut buffer = Vec::new();
        loop {
            match reader
                .read_event_into(&mut buffer)
                .or_raise(|| ErrorKind::MalformedManifest("unparseable XML".to_string()))?
            {
                Event::Start(start) => path.push(String::from_utf8_lossy(start.name().as_ref()).into_owned()),
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .or_raise(|| ErrorKind::MalformedManifest("undecodable text node".to_string()))?
                        .into_owned();
                    match path.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
                        ["arXivSRC", "timestamp"] => header_timestamp = Some(value),
                        ["arXivSRC", "file", field] => {
                            current.insert((*field).to_string(), value);
                        },
                        _ => {},
                    }
                },
                Event::End(_) => {
                    let closed = path.pop();
                    if closed.as_deref() == Some("file") {
                        let entry = build_entry(std::mem::take(&mut current))?;
                        let basename = entry.filename.rsplit('/').next().unwrap_or(&entry.filename).to_string();
                        if entries.insert(basename.clone(), entry).is_some() {
                            exn::bail!(ErrorKind::InconsistentManifest(format!(
                                "duplicate bulk archive basename `{basename}`"
                            )));
                        }
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buffer.clear();
        }

        let raw = header_timestamp
            .ok_or_raise(|| ErrorKind::MalformedManifest("missing arXivSRC timestamp".to_string()))?;
        let timestamp = PrimitiveDateTime::parse(&raw, HEADER_TIMESTAMP)
            .or_raise(|| ErrorKind::MalformedManifest(format!("bad manifest timestamp `{raw}`")))?;
        Ok(Self { timestamp, entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bulk archive basenames, the manifest's key set.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, basename: &str) -> Option<&ManifestEntry> {
        self.entries.get(basename)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    /// Total submissions across all bulk archives.
    #[must_use]
    pub fn total_submissions(&self) -> u64 {
        self.entries.values().map(|entry| entry.num_items).sum()
    }

    /// Total size in bytes across all bulk archives.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|entry| entry.size_bytes).sum()
    }

    /// Whether this manifest is newer than `other`.
    ///
    /// The bucket only ever grows, so the comparison cross-checks the key
    /// sets: identical timestamps require identical keys, and whichever
    /// manifest is newer must add at least one entry and delete none.
    /// Violations mean one of the manifests is not what it claims to be.
    pub fn is_newer_than(&self, other: &Manifest) -> Result<bool> {
        let ours = self.keys();
        let theirs = other.keys();
        let added: BTreeSet<_> = ours.difference(&theirs).collect();
        let removed: BTreeSet<_> = theirs.difference(&ours).collect();

        if self.timestamp == other.timestamp {
            if !added.is_empty() || !removed.is_empty() {
                exn::bail!(ErrorKind::InconsistentManifest(
                    "manifests with identical timestamps must have identical keys".to_string()
                ));
            }
            return Ok(false);
        }

        let newer = self.timestamp > other.timestamp;
        let (gained, lost) = match newer {
            true => (added, removed),
            false => (removed, added),
        };
        if gained.is_empty() {
            exn::bail!(ErrorKind::InconsistentManifest(
                "newer manifest must add at least one entry".to_string()
            ));
        }
        if !lost.is_empty() {
            exn::bail!(ErrorKind::InconsistentManifest("newer manifest cannot delete entries".to_string()));
        }
        Ok(newer)
    }

    /// Keys present here but not in the older `reference` manifest.
    pub fn new_entries(&self, reference: &Manifest) -> Result<BTreeSet<String>> {
        self.require_newer_than(reference)?;
        Ok(self.keys().difference(&reference.keys()).cloned().collect())
    }

    /// Keys present in both manifests whose archive checksum changed.
    pub fn updated_entries(&self, reference: &Manifest) -> Result<BTreeSet<String>> {
        self.require_newer_than(reference)?;
        let updated = self
            .entries
            .iter()
            .filter(|(key, entry)| reference.entries.get(*key).is_some_and(|old| old.md5 != entry.md5))
            .map(|(key, _)| key.clone())
            .collect();
        Ok(updated)
    }

    fn require_newer_than(&self, reference: &Manifest) -> Result<()> {
        match self.is_newer_than(reference)? {
            true => Ok(()),
            false => exn::bail!(ErrorKind::InconsistentManifest(
                "reference manifest must be older than this one".to_string()
            )),
        }
    }
}

fn build_entry(mut fields: HashMap<String, String>) -> Result<ManifestEntry> {
    for field in REQUIRED_ENTRY_FIELDS {
        if !fields.contains_key(*field) {
            exn::bail!(ErrorKind::MalformedManifest(format!("file entry missing `{field}`")));
        }
    }
    let take = |fields: &mut HashMap<String, String>, key: &str| fields.remove(key).unwrap_or_default();

    let filename = take(&mut fields, "filename");
    let yymm = take(&mut fields, "yymm");
    let seq_raw = take(&mut fields, "seq_num");
    let inconsistent = |why: String| ErrorKind::InconsistentManifest(why);

    let (yy, month): (u8, u8) = match (yymm.get(..2).and_then(|s| s.parse().ok()), yymm.get(2..).and_then(|s| s.parse().ok())) {
        (Some(yy), Some(month)) => (yy, month),
        _ => exn::bail!(inconsistent(format!("bad yymm `{yymm}`"))),
    };
    if !(1..=12).contains(&month) {
        exn::bail!(inconsistent(format!("month out of range in `{yymm}`")));
    }
    let sequence: u16 = seq_raw.parse().ok().ok_or_raise(|| inconsistent(format!("bad seq_num `{seq_raw}`")))?;
    let expected = format!("src/arXiv_src_{yymm}_{sequence:03}.tar");
    if filename != expected {
        exn::bail!(inconsistent(format!("entry filename `{filename}` does not match `{expected}`")));
    }

    let raw_timestamp = take(&mut fields, "timestamp");
    let timestamp = PrimitiveDateTime::parse(&raw_timestamp, ENTRY_TIMESTAMP)
        .or_raise(|| ErrorKind::MalformedManifest(format!("bad entry timestamp `{raw_timestamp}`")))?;
    let size_bytes = take(&mut fields, "size")
        .parse()
        .ok()
        .ok_or_raise(|| ErrorKind::MalformedManifest("bad size field".to_string()))?;
    let num_items = take(&mut fields, "num_items")
        .parse()
        .ok()
        .ok_or_raise(|| ErrorKind::MalformedManifest("bad num_items field".to_string()))?;

    let year = match yy > 90 {
        true => 1900 + u16::from(yy),
        false => 2000 + u16::from(yy),
    };
    Ok(ManifestEntry {
        filename,
        size_bytes,
        timestamp,
        year,
        month,
        sequence,
        num_items,
        first_item: take(&mut fields, "first_item"),
        last_item: take(&mut fields, "last_item"),
        md5: take(&mut fields, "md5sum"),
        content_md5: take(&mut fields, "content_md5sum"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_entry(yymm: &str, seq: u16, md5: &str) -> String {
        format!(
            "<file>\
             <content_md5sum>c{md5}</content_md5sum>\
             <filename>src/arXiv_src_{yymm}_{seq:03}.tar</filename>\
             <first_item>astro-ph{yymm}001</first_item>\
             <last_item>astro-ph{yymm}250</last_item>\
             <md5sum>{md5}</md5sum>\
             <num_items>250</num_items>\
             <seq_num>{seq}</seq_num>\
             <size>504710816</size>\
             <timestamp>2010-12-23 00:13:59</timestamp>\
             <yymm>{yymm}</yymm>\
             </file>"
        )
    }

    fn manifest_xml(timestamp: &str, files: &[String]) -> Vec<u8> {
        format!(
            "<?xml version=\"1.0\"?><arXivSRC><timestamp>{timestamp}</timestamp>{}</arXivSRC>",
            files.concat()
        )
        .into_bytes()
    }

    #[test]
    fn parses_well_formed_manifest() {
        let xml = manifest_xml("Mon Apr  7 04:58:03 2025", &[file_entry("9902", 5, "aaa"), file_entry("2301", 1, "bbb")]);
        let manifest = Manifest::parse(&xml).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.total_submissions(), 500);

        let entry = manifest.get("arXiv_src_9902_005.tar").unwrap();
        assert_eq!((entry.year, entry.month, entry.sequence), (1999, 2, 5));
        assert_eq!(entry.num_items, 250);
        assert_eq!(entry.md5, "aaa");
        assert_eq!(entry.timestamp.to_string(), "2010-12-23 0:13:59.0");
    }

    #[test]
    fn missing_field_is_malformed() {
        let broken = file_entry("9902", 5, "aaa").replace("<num_items>250</num_items>", "");
        let xml = manifest_xml("Mon Apr  7 04:58:03 2025", &[broken]);
        let err = Manifest::parse(&xml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedManifest(_)));
    }

    #[test]
    fn bad_header_timestamp_is_malformed() {
        let xml = manifest_xml("not a timestamp", &[file_entry("9902", 5, "aaa")]);
        let err = Manifest::parse(&xml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedManifest(_)));
    }

    #[test]
    fn bad_entry_timestamp_is_malformed() {
        let broken = file_entry("9902", 5, "aaa").replace("2010-12-23 00:13:59", "sometime");
        let xml = manifest_xml("Mon Apr  7 04:58:03 2025", &[broken]);
        let err = Manifest::parse(&xml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedManifest(_)));
    }

    #[test]
    fn filename_disagreeing_with_fields_is_inconsistent() {
        let broken = file_entry("9902", 5, "aaa").replace("arXiv_src_9902_005.tar", "arXiv_src_9903_005.tar");
        let xml = manifest_xml("Mon Apr  7 04:58:03 2025", &[broken]);
        let err = Manifest::parse(&xml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InconsistentManifest(_)));
    }

    #[test]
    fn newer_manifest_with_new_entry() {
        let old = Manifest::parse(&manifest_xml("Mon Apr  7 04:58:03 2025", &[file_entry("9902", 5, "aaa")])).unwrap();
        let new = Manifest::parse(&manifest_xml(
            "Tue Apr  8 04:58:03 2025",
            &[file_entry("9902", 5, "aaa"), file_entry("2301", 1, "bbb")],
        ))
        .unwrap();

        assert!(new.is_newer_than(&old).unwrap());
        assert!(!old.is_newer_than(&new).unwrap());
        assert_eq!(new.new_entries(&old).unwrap(), BTreeSet::from(["arXiv_src_2301_001.tar".to_string()]));
        assert!(new.updated_entries(&old).unwrap().is_empty());
    }

    #[test]
    fn updated_entries_detected_by_checksum() {
        let old = Manifest::parse(&manifest_xml("Mon Apr  7 04:58:03 2025", &[file_entry("9902", 5, "aaa")])).unwrap();
        let new = Manifest::parse(&manifest_xml(
            "Tue Apr  8 04:58:03 2025",
            &[file_entry("9902", 5, "ZZZ"), file_entry("2301", 1, "bbb")],
        ))
        .unwrap();
        assert_eq!(new.updated_entries(&old).unwrap(), BTreeSet::from(["arXiv_src_9902_005.tar".to_string()]));
    }

    #[test]
    fn newer_timestamp_without_new_entries_is_inconsistent() {
        let old = Manifest::parse(&manifest_xml("Mon Apr  7 04:58:03 2025", &[file_entry("9902", 5, "aaa")])).unwrap();
        let new = Manifest::parse(&manifest_xml("Tue Apr  8 04:58:03 2025", &[file_entry("9902", 5, "aaa")])).unwrap();
        assert!(new.is_newer_than(&old).is_err());
    }

    #[test]
    fn identical_timestamps_require_identical_keys() {
        let a = Manifest::parse(&manifest_xml("Mon Apr  7 04:58:03 2025", &[file_entry("9902", 5, "aaa")])).unwrap();
        let b = Manifest::parse(&manifest_xml(
            "Mon Apr  7 04:58:03 2025",
            &[file_entry("9902", 5, "aaa"), file_entry("2301", 1, "bbb")],
        ))
        .unwrap();
        assert!(!a.is_newer_than(&a.clone()).unwrap());
        assert!(a.is_newer_than(&b).is_err());
    }
}
