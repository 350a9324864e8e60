//! Container format detection from content.

use arxcat_compress::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Read;

/// Offset of the `ustar` magic within a POSIX tar header block.
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8; 5] = b"ustar";
/// Enough decompressed bytes to cover one tar header block.
const PROBE_LEN: usize = 512;

/// A recognized archive container format.
///
/// The source bucket only ever serves these three shapes: bulk archives are
/// plain tar, submissions inside them are either gzipped tar bundles or a
/// gzipped single file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    /// Uncompressed tar archive.
    Tar,
    /// Gzip-compressed tar archive (`.tgz` / `.tar.gz`).
    Tgz,
    /// Gzip stream holding a single payload (not a tar).
    Gz,
}

impl Display for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Container::Tar => "tar",
            Container::Tgz => "tgz",
            Container::Gz => "gz",
        })
    }
}

impl Container {
    /// Detect the container format from content alone.
    ///
    /// Gzip detection uses the stream magic; tar detection checks for the
    /// `ustar` magic in the first header block (decompressing just enough
    /// of a gzip stream to probe it). Returns `None` for anything else,
    /// including bzip2 streams, which are recognized upstream but not
    /// handled as submission containers.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match Compression::from_magic_bytes(bytes) {
            Compression::Gzip => {
                let mut probe = vec![0u8; PROBE_LEN];
                let mut reader = Compression::Gzip.wrap_reader(bytes);
                // A short or corrupt gzip stream still *is* a gzip stream;
                // whether it decodes fully is the extractor's problem.
                let read = read_up_to(&mut reader, &mut probe);
                match is_tar_header(&probe[..read]) {
                    true => Some(Container::Tgz),
                    false => Some(Container::Gz),
                }
            },
            Compression::Bzip2 => None,
            Compression::None => is_tar_header(bytes).then_some(Container::Tar),
        }
    }

    /// Whether members of this container are themselves enumerable
    /// (tar-based), as opposed to a single opaque payload.
    #[must_use]
    pub fn is_tar_based(&self) -> bool {
        matches!(self, Container::Tar | Container::Tgz)
    }
}

/// Check for the POSIX `ustar` magic in the first header block.
fn is_tar_header(bytes: &[u8]) -> bool {
    bytes.len() >= TAR_MAGIC_OFFSET + TAR_MAGIC.len()
        && &bytes[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
}

/// Read as many bytes as the reader will give, stopping at EOF or error.
fn read_up_to(reader: &mut dyn Read, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    filled
}
