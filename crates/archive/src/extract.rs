//! Archive opening and lazy member iteration.

use crate::container::Container;
use crate::error::{ErrorKind, Result};
use crate::member::{ArchiveMember, validate_member_path};
use arxcat_compress::Compression;
use exn::ResultExt;
use std::io::Read;
use std::path::PathBuf;
use tracing::instrument;

/// An opened archive, ready to yield members.
///
/// Opening detects the container format from content and wires up the
/// decompression layer; no member data is read until [`members`](Self::members)
/// is iterated. The iterator is not restartable — once consumed, open a new
/// `Extractor` from the original bytes.
pub struct Extractor<'a> {
    container: Container,
    inner: Inner<'a>,
}

enum Inner<'a> {
    Tar(Box<tar::Archive<Box<dyn Read + 'a>>>),
    // Single gzip payload: the one member it will yield, or nothing left.
    Single { name: PathBuf, bytes: &'a [u8], consumed: bool },
}

impl<'a> Extractor<'a> {
    /// Open an archive from raw bytes.
    ///
    /// Fails with [`ErrorKind::Corrupt`] when no supported container
    /// structure is recognized, and [`ErrorKind::Unsupported`] for
    /// recognized-but-unhandled compression (bzip2 streams).
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        Self::open_named("payload", bytes)
    }

    /// Open an archive, using `name` to label the member of a single-payload
    /// gzip stream (conventionally the `.gz` filename with the extension
    /// stripped). Tar-based containers carry their own member paths and
    /// ignore the hint.
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn open_named(name: &str, bytes: &'a [u8]) -> Result<Self> {
        let container = match Container::detect(bytes) {
            Some(container) => container,
            None => match Compression::from_magic_bytes(bytes) {
                Compression::Bzip2 => exn::bail!(ErrorKind::Unsupported("bzip2".to_string())),
                _ => exn::bail!(ErrorKind::Corrupt("unrecognized container magic".to_string())),
            },
        };
        let inner = match container {
            Container::Tar => {
                let reader: Box<dyn Read + 'a> = Box::new(bytes);
                Inner::Tar(Box::new(tar::Archive::new(reader)))
            },
            Container::Tgz => {
                let reader = Compression::Gzip.wrap_reader(bytes);
                Inner::Tar(Box::new(tar::Archive::new(reader)))
            },
            Container::Gz => Inner::Single {
                name: PathBuf::from(name.strip_suffix(".gz").unwrap_or(name)),
                bytes,
                consumed: false,
            },
        };
        Ok(Self { container, inner })
    }

    /// The detected container format.
    #[must_use]
    pub fn container(&self) -> Container {
        self.container
    }

    /// Iterate the archive's file members lazily.
    ///
    /// Directories and other non-file entries are skipped. Each member's
    /// path is validated against the submission naming rules before its
    /// content is read; a bad path or a truncated stream surfaces as an
    /// `Err` item, after which iteration of a tar stream is best-effort.
    pub fn members(&mut self) -> Result<Members<'a, '_>> {
        let inner = match &mut self.inner {
            Inner::Tar(archive) => {
                let entries = archive.entries().or_raise(|| ErrorKind::Corrupt("unreadable tar stream".to_string()))?;
                MembersInner::Tar(entries)
            },
            Inner::Single { name, bytes, consumed } => MembersInner::Single {
                name: std::mem::take(name),
                bytes,
                consumed,
            },
        };
        Ok(Members { inner })
    }
}

/// Lazy member iterator returned by [`Extractor::members`].
pub struct Members<'a, 'e> {
    inner: MembersInner<'a, 'e>,
}

enum MembersInner<'a, 'e> {
    Tar(tar::Entries<'e, Box<dyn Read + 'a>>),
    Single { name: PathBuf, bytes: &'a [u8], consumed: &'e mut bool },
}

impl Iterator for Members<'_, '_> {
    type Item = Result<ArchiveMember>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            MembersInner::Tar(entries) => loop {
                let entry = match entries.next()? {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(
                            Err(e).or_raise(|| ErrorKind::Corrupt("truncated or malformed tar entry".to_string())),
                        );
                    },
                };
                if !entry.header().entry_type().is_file() {
                    continue;
                }
                return Some(read_entry(entry));
            },
            MembersInner::Single { name, bytes, consumed } => {
                if **consumed {
                    return None;
                }
                **consumed = true;
                let mut payload = Vec::new();
                let result = Compression::Gzip
                    .decompress_into(bytes, &mut payload)
                    .or_raise(|| ErrorKind::Corrupt("undecodable gzip payload".to_string()))
                    .map(|_| ArchiveMember { path: std::mem::take(name), bytes: payload });
                Some(result)
            },
        }
    }
}

// Size fields in tar headers are untrusted; preallocation is capped here
// and the buffer grows only as real bytes arrive.
const MEMBER_PREALLOC_CAP: u64 = 64 * 1024;

fn read_entry<R: Read>(mut entry: tar::Entry<'_, R>) -> Result<ArchiveMember> {
    let raw_path = entry.path().or_raise(|| ErrorKind::Corrupt("non-UTF8 member path".to_string()))?.into_owned();
    let path = validate_member_path(&raw_path)?;
    let claimed = entry.header().size().or_raise(|| ErrorKind::Corrupt("bad size field".to_string()))?;
    let mut bytes = Vec::with_capacity(claimed.min(MEMBER_PREALLOC_CAP) as usize);
    entry.read_to_end(&mut bytes).or_raise(|| ErrorKind::Io)?;
    if bytes.len() as u64 != claimed {
        exn::bail!(ErrorKind::Corrupt(format!(
            "member `{}` claims {claimed} bytes but carries {}",
            path.display(),
            bytes.len()
        )));
    }
    tracing::debug!(path = %path.display(), size = bytes.len(), "extracted member");
    Ok(ArchiveMember { path, bytes })
}
