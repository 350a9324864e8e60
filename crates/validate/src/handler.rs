//! The handler contract and dispatch table.

use crate::error::Result;
use crate::outcome::{Status, ValidationOutcome};
use arxcat_archive::ArchiveMember;
use arxcat_filetype::{Classification, Confidence, FileKind};
use std::collections::HashMap;
use tracing::instrument;

/// Capability contract shared by all type-specific validators.
///
/// Implementations must treat malformed input as data, not as failure:
/// anything readable-but-wrong is a [`Status::Invalid`] outcome with
/// diagnostics. Returning `Err` is reserved for environment failures and
/// is converted to a warning outcome by [`HandlerRegistry::dispatch`].
pub trait Handler: Send + Sync {
    fn validate(&self, member: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome>;
}

/// Maps coarse file kinds to their registered handler.
///
/// The table is explicit: handlers are registered at construction, nothing
/// is discovered. Re-registering a kind replaces the prior handler (last
/// write wins) and is logged, not rejected, so tests can swap a handler in
/// without new dispatch plumbing.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<FileKind, Box<dyn Handler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard handler set: nested archives (bounded by `max_depth`),
    /// PDF, PostScript/TeX, image, and XML.
    #[must_use]
    pub fn with_default_handlers(max_depth: usize) -> Self {
        let mut registry = Self::new();
        registry.register(FileKind::Archive, crate::handlers::ArchiveHandler::new(max_depth));
        registry.register(FileKind::Pdf, crate::handlers::PdfHandler);
        registry.register(FileKind::PostscriptTex, crate::handlers::PsTexHandler);
        registry.register(FileKind::Image, crate::handlers::ImageHandler);
        registry.register(FileKind::Xml, crate::handlers::XmlHandler);
        registry
    }

    /// Register a handler for a kind. Last write wins.
    pub fn register(&mut self, kind: FileKind, handler: impl Handler + 'static) {
        if self.handlers.insert(kind, Box::new(handler)).is_some() {
            tracing::warn!(%kind, "replaced previously registered handler");
        }
    }

    #[must_use]
    pub fn has_handler(&self, kind: FileKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Resolve the handler for a classified member and run it.
    ///
    /// Never fails: a missing handler yields an `invalid` outcome with a
    /// "no handler" diagnostic, and a handler error yields a `warning`
    /// outcome, so one member can never abort the rest of the archive.
    #[instrument(skip(self, member, classification), fields(path = %classification.path.display(), kind = %classification.kind()))]
    pub fn dispatch(&self, member: &ArchiveMember, classification: &Classification) -> ValidationOutcome {
        let kind = classification.kind();
        let mut outcome = match self.handlers.get(&kind) {
            Some(handler) => match handler.validate(member, classification) {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(%error, "handler unavailable, downgrading to warning");
                    ValidationOutcome::warning(classification.tag, error.to_string())
                },
            },
            None => {
                tracing::warn!("no handler for type tag");
                ValidationOutcome::invalid(classification.tag, format!("no handler for type tag `{kind}`")).unhandled()
            },
        };
        if classification.confidence == Confidence::Extension && outcome.status == Status::Valid {
            outcome = outcome.diagnostic("type inferred from extension only");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use arxcat_filetype::FileTag;
    use std::path::Path;

    struct AlwaysValid;
    impl Handler for AlwaysValid {
        fn validate(&self, _: &ArchiveMember, classification: &Classification) -> Result<ValidationOutcome> {
            Ok(ValidationOutcome::valid(classification.tag))
        }
    }

    struct AlwaysUnavailable;
    impl Handler for AlwaysUnavailable {
        fn validate(&self, _: &ArchiveMember, _: &Classification) -> Result<ValidationOutcome> {
            exn::bail!(ErrorKind::Unavailable("decoder missing".to_string()))
        }
    }

    fn member_and_classification(path: &str, bytes: &[u8]) -> (ArchiveMember, Classification) {
        let member = ArchiveMember::new(path, bytes.to_vec());
        let classification = arxcat_filetype::classify_bytes(Path::new(path), bytes);
        (member, classification)
    }

    #[test]
    fn missing_handler_is_invalid_not_fatal() {
        let registry = HandlerRegistry::new();
        let (member, classification) = member_and_classification("doc.pdf", b"%PDF-1.4");
        let outcome = registry.dispatch(&member, &classification);
        assert_eq!(outcome.status, Status::Invalid);
        assert!(outcome.unhandled);
        assert!(outcome.diagnostics[0].contains("no handler"));
    }

    #[test]
    fn handler_error_becomes_warning() {
        let mut registry = HandlerRegistry::new();
        registry.register(FileKind::Pdf, AlwaysUnavailable);
        let (member, classification) = member_and_classification("doc.pdf", b"%PDF-1.4");
        let outcome = registry.dispatch(&member, &classification);
        assert_eq!(outcome.status, Status::Warning);
        assert!(outcome.diagnostics[0].contains("decoder missing"));
    }

    #[test]
    fn re_registration_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register(FileKind::Pdf, AlwaysUnavailable);
        registry.register(FileKind::Pdf, AlwaysValid);
        let (member, classification) = member_and_classification("doc.pdf", b"%PDF-1.4");
        assert_eq!(registry.dispatch(&member, &classification).status, Status::Valid);
    }

    #[test]
    fn extension_confidence_recorded_as_diagnostic() {
        let mut registry = HandlerRegistry::new();
        registry.register(FileKind::PostscriptTex, AlwaysValid);
        let (member, classification) = member_and_classification("macros.tex", b"\\relax");
        let outcome = registry.dispatch(&member, &classification);
        assert_eq!(outcome.status, Status::Valid);
        assert!(outcome.diagnostics.iter().any(|d| d.contains("extension only")));
    }

    #[test]
    fn default_set_covers_every_dispatchable_kind() {
        let registry = HandlerRegistry::with_default_handlers(2);
        for kind in [FileKind::Archive, FileKind::Pdf, FileKind::PostscriptTex, FileKind::Image, FileKind::Xml] {
            assert!(registry.has_handler(kind), "missing handler for {kind}");
        }
        assert!(!registry.has_handler(FileKind::Unknown));
    }

    #[test]
    fn unknown_member_surfaces_in_diagnostics() {
        let registry = HandlerRegistry::with_default_handlers(2);
        let (member, classification) = member_and_classification("mystery.bin", &[0x00, 0x01, 0x02]);
        assert_eq!(classification.tag, FileTag::Unknown);
        let outcome = registry.dispatch(&member, &classification);
        assert_eq!(outcome.status, Status::Invalid);
        assert!(outcome.unhandled);
    }
}
