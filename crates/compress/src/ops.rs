//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use bzip2::{Compression as BzCompression, read::BzDecoder, write::BzEncoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use tracing::instrument;

// Compression in this crate only exists to build test fixtures and the
// occasional re-packed payload; nothing here is size- or speed-critical.
const BZIP2_LEVEL: BzCompression = BzCompression::best();
const GZIP_LEVEL: GzCompression = GzCompression::best();

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use arxcat_compress::Compression;
    ///
    /// let data = b"\\documentclass{article}";
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert!(compressed.starts_with(&[0x1F, 0x8B]));
    /// ```
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.compress_into(input, &mut output)?;
        Ok(output)
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arxcat_compress::Compression;
    ///
    /// let original = b"\\documentclass{article}";
    /// let compressed = Compression::Gzip.compress(original).unwrap();
    /// assert_ne!(compressed, original);
    /// let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.decompress_into(input, &mut output)?;
        Ok(output)
    }

    #[instrument(skip(input, output), fields(
        format = %self,
        input_size = input.len(),
        output_size
    ))]
    pub fn compress_into(&self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let size = match self {
            Compression::None => {
                output.extend_from_slice(input);
                input.len()
            },
            Compression::Bzip2 => {
                let mut encoder = BzEncoder::new(&mut *output, BZIP2_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?;
                output.len()
            },
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(&mut *output, GZIP_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?;
                output.len()
            },
        };
        tracing::Span::current().record("output_size", size);
        Ok(size)
    }

    #[instrument(skip(input, output), fields(
        format = %self,
        input_size = input.len(),
        output_size
    ))]
    pub fn decompress_into(&self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let size = match self {
            Compression::None => {
                output.extend_from_slice(input);
                input.len()
            },
            Compression::Bzip2 => {
                let mut decoder = BzDecoder::new(input);
                decoder.read_to_end(output).or_raise(|| ErrorKind::InvalidData)?
            },
            Compression::Gzip => {
                let mut decoder = GzDecoder::new(input);
                decoder.read_to_end(output).or_raise(|| ErrorKind::InvalidData)?
            },
        };
        tracing::Span::current().record("output_size", size);
        Ok(size)
    }

    /// Wrap a reader with the appropriate decompression layer.
    ///
    /// Returns a boxed reader that automatically decompresses data. Used to
    /// stream tar entries out of `.tgz` members without an intermediate
    /// buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use arxcat_compress::Compression;
    ///
    /// let original = b"%PDF-1.4";
    /// let compressed = Compression::Gzip.compress(original).unwrap();
    /// let cursor = Cursor::new(compressed);
    /// let mut reader = Compression::Gzip.wrap_reader(cursor);
    /// let mut decompressed = Vec::new();
    /// reader.read_to_end(&mut decompressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;
    use std::io::Read;

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    fn test_compress_decompress(#[case] format: Compression) {
        let original = b"\\documentclass{article} A test of some compression.";
        let compressed = format.compress(original).unwrap();
        let decompressed = format.decompress(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[rstest]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    fn test_invalid_compressed_data(#[case] format: Compression) {
        let invalid_data = b"This is not compressed data";
        assert!(format.decompress(invalid_data).is_err());
    }

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    fn test_wrap_reader(#[case] format: Compression) {
        use std::io::Cursor;
        let original = b"%!PS-Adobe-2.0";
        let compressed = format.compress(original).unwrap();
        let cursor = Cursor::new(compressed);
        let mut reader = format.wrap_reader(cursor);
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_empty_input_roundtrip() {
        let compressed = Compression::Gzip.compress(b"").unwrap();
        let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
        assert!(decompressed.is_empty());
    }
}
