//! XML well-formedness validation.

use crate::error::Result;
use crate::handler::Handler;
use crate::outcome::ValidationOutcome;
use arxcat_archive::ArchiveMember;
use arxcat_filetype::Classification;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Validates XML members by streaming the whole document through a parser:
/// every tag must close, and exactly one root element must exist. No
/// schema validation.
pub struct XmlHandler;

impl Handler for XmlHandler {
    fn validate(&self, member: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome> {
        let tag = classification.tag;
        let mut reader = Reader::from_reader(member.bytes.as_slice());
        reader.config_mut().check_end_names = true;

        let mut root: Option<String> = None;
        let mut element_count: u64 = 0;
        let mut depth: u64 = 0;
        let mut buffer = Vec::new();
        loop {
            match reader.read_event_into(&mut buffer) {
                Ok(Event::Start(start)) => {
                    element_count += 1;
                    depth += 1;
                    if root.is_none() {
                        root = Some(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                    }
                },
                Ok(Event::Empty(empty)) => {
                    element_count += 1;
                    if root.is_none() {
                        root = Some(String::from_utf8_lossy(empty.name().as_ref()).into_owned());
                    }
                },
                Ok(Event::End(_)) => depth = depth.saturating_sub(1),
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(error) => {
                    let position = reader.buffer_position();
                    return Ok(ValidationOutcome::invalid(tag, format!("malformed XML at byte {position}: {error}")));
                },
            }
            buffer.clear();
        }

        let Some(root) = root else {
            return Ok(ValidationOutcome::invalid(tag, "no root element"));
        };
        if depth != 0 {
            return Ok(ValidationOutcome::invalid(tag, "unclosed elements at end of document"));
        }
        Ok(ValidationOutcome::valid(tag).meta("root_element", root).meta("element_count", element_count))
    }
}
