//! Compression and decompression for submission payloads.
//!
//! Bulk submission archives arrive as uncompressed tar containers whose
//! members are individually gzip-compressed (`.gz` single-file payloads or
//! `.tgz` source bundles). This crate wraps the compression libraries behind
//! a single [`Compression`] enum, providing:
//!
//! - **Format detection** from magic bytes ([`Compression::from_magic_bytes`])
//!   or file extensions ([`Compression::from_path`])
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//! - **Streaming** decompression via wrapped readers
//!   ([`Compression::wrap_reader`])
//!
//! Detection from magic bytes is the primary signal everywhere in the
//! pipeline; extensions only corroborate.

mod construct;
pub mod error;
mod ops;
mod util;

/// A supported compression format.
///
/// Defaults to [`None`](Self::None) (uncompressed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    Gzip,
}

#[cfg(test)]
mod tests {
    use crate::Compression;

    #[test]
    fn compression_default() {
        assert_eq!(Compression::default(), Compression::None);
    }
}
