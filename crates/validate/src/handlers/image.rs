//! Image validation via header decoding.

use crate::error::Result;
use crate::handler::Handler;
use crate::outcome::ValidationOutcome;
use arxcat_archive::ArchiveMember;
use arxcat_filetype::{Classification, FileTag};
use memchr::memmem;
use std::io::Cursor;

/// Validates image members by decoding the header: the format must be
/// recognizable and the dimensions extractable. Pixel data is not decoded.
///
/// SVG is the exception: it is XML text, so it gets a root-element probe
/// instead of a raster header decode.
pub struct ImageHandler;

impl Handler for ImageHandler {
    fn validate(&self, member: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome> {
        let tag = classification.tag;
        if tag == FileTag::ImageSvg {
            return Ok(validate_svg(tag, &member.bytes));
        }

        let reader = match image::ImageReader::new(Cursor::new(&member.bytes)).with_guessed_format() {
            Ok(reader) => reader,
            Err(error) => return Ok(ValidationOutcome::invalid(tag, error.to_string())),
        };
        let Some(format) = reader.format() else {
            return Ok(ValidationOutcome::invalid(tag, "unrecognizable image format"));
        };
        match reader.into_dimensions() {
            Ok((width, height)) => Ok(ValidationOutcome::valid(tag)
                .meta("format", format.extensions_str()[0])
                .meta("width", width)
                .meta("height", height)),
            Err(error) => Ok(ValidationOutcome::invalid(tag, format!("undecodable image header: {error}"))),
        }
    }
}

fn validate_svg(tag: FileTag, bytes: &[u8]) -> ValidationOutcome {
    match std::str::from_utf8(bytes) {
        Ok(_) if memmem::find(bytes, b"<svg").is_some() => ValidationOutcome::valid(tag).meta("format", "svg"),
        Ok(_) => ValidationOutcome::invalid(tag, "no <svg> root element"),
        Err(_) => ValidationOutcome::invalid(tag, "not valid UTF-8 text"),
    }
}
