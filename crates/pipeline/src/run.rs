//! Per-archive processing: extract, classify, dispatch, hash, upsert.

use crate::cancel::CancelToken;
use crate::error::{ErrorKind, Result};
use arxcat_archive::Extractor;
use arxcat_filetype::classify;
use arxcat_naming::SubmissionName;
use arxcat_registry::{Catalog, IdentityScreen, SourceRef, Upsert};
use arxcat_validate::{HandlerRegistry, ValidationOutcome};
use exn::ResultExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::instrument;

/// Tunables for one pipeline instance.
#[derive(Clone, Copy, Debug)]
pub struct PipelineOptions {
    /// Members validated concurrently; bounds peak memory since each
    /// in-flight member holds its decompressed bytes.
    pub concurrency: usize,
    /// Archive nesting depth accepted by the archive handler.
    pub max_depth: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { concurrency: 8, max_depth: 2 }
    }
}

/// What happened to one archive: how many members were scheduled, how the
/// upserts resolved, and the members that never reached validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub archive: String,
    pub members: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    /// Members that failed extraction (bad path, truncated entry) and
    /// therefore have no registry entry, one line each.
    pub member_failures: Vec<String>,
}

/// The validation pipeline: shared handler table, shared catalog, shared
/// duplicate screen, bounded worker pool.
///
/// One instance serves a whole batch; archives are processed one at a
/// time while their members fan out across blocking workers.
pub struct Pipeline {
    handlers: Arc<HandlerRegistry>,
    catalog: Arc<Catalog>,
    screen: Arc<IdentityScreen>,
    semaphore: Arc<Semaphore>,
    options: PipelineOptions,
}

impl Pipeline {
    /// A pipeline with the default handler set.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, options: PipelineOptions) -> Self {
        Self::with_handlers(HandlerRegistry::with_default_handlers(options.max_depth), catalog, options)
    }

    /// A pipeline with a caller-assembled handler table.
    #[must_use]
    pub fn with_handlers(handlers: HandlerRegistry, catalog: Arc<Catalog>, options: PipelineOptions) -> Self {
        Self {
            handlers: Arc::new(handlers),
            catalog,
            screen: Arc::new(IdentityScreen::new()),
            semaphore: Arc::new(Semaphore::new(options.concurrency.max(1))),
            options,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Process one archive end to end.
    ///
    /// Members are validated and hashed concurrently up to the configured
    /// limit; the catalog serializes the upserts. A member that fails
    /// extraction is recorded in the summary and skipped; only a
    /// container that cannot be opened at all fails the archive.
    /// Cancellation stops scheduling between members, drains in-flight
    /// work, and then surfaces as [`ErrorKind::Cancelled`].
    #[instrument(skip(self, bytes, cancel), fields(archive = name, size = bytes.len()))]
    pub async fn process_archive(&self, name: &str, bytes: &[u8], cancel: &CancelToken) -> Result<ArchiveSummary> {
        let mut extractor =
            Extractor::open_named(name, bytes).map_err(|err| err.raise(ErrorKind::Archive(name.to_string())))?;
        let members = extractor.members().map_err(|err| err.raise(ErrorKind::Archive(name.to_string())))?;

        let mut summary = ArchiveSummary { archive: name.to_string(), ..ArchiveSummary::default() };
        let mut workers: JoinSet<Result<Upsert>> = JoinSet::new();
        for member in members {
            if cancel.is_cancelled() {
                break;
            }
            let member = match member {
                Ok(member) => member,
                Err(error) => {
                    tracing::warn!(%error, "skipping unextractable member");
                    summary.member_failures.push(format!("{name}: {error}"));
                    continue;
                },
            };
            // The permit bounds how many decompressed members are alive.
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => exn::bail!(ErrorKind::Worker),
            };
            let handlers = Arc::clone(&self.handlers);
            let catalog = Arc::clone(&self.catalog);
            let screen = Arc::clone(&self.screen);
            let archive = name.to_string();
            summary.members += 1;
            workers.spawn_blocking(move || {
                let _permit = permit;
                validate_member(&handlers, &catalog, &screen, &archive, member)
            });
        }

        let cancelled = cancel.is_cancelled();
        while let Some(joined) = workers.join_next().await {
            match joined.or_raise(|| ErrorKind::Worker)?? {
                Upsert::Inserted => summary.inserted += 1,
                Upsert::Updated => summary.updated += 1,
                Upsert::Unchanged => summary.unchanged += 1,
                Upsert::Conflict => summary.conflicts += 1,
            }
        }
        if cancelled {
            exn::bail!(ErrorKind::Cancelled);
        }
        tracing::info!(
            members = summary.members,
            inserted = summary.inserted,
            conflicts = summary.conflicts,
            "archive processed"
        );
        Ok(summary)
    }
}

fn validate_member(
    handlers: &HandlerRegistry,
    catalog: &Catalog,
    screen: &IdentityScreen,
    archive: &str,
    member: arxcat_archive::ArchiveMember,
) -> Result<Upsert> {
    let classification = classify(&member);
    let outcome = corroborate_naming(handlers.dispatch(&member, &classification), &member.path);
    let identity = screen.identify(&member.bytes);
    catalog
        .upsert(identity, SourceRef::new(archive, member.path), outcome)
        .map_err(|err| err.raise(ErrorKind::Registry))
}

/// Cross-check a top-level member's filename against the submission naming
/// conventions. Mismatches are diagnostics, never failures; a match also
/// contributes the canonical abstract URL.
fn corroborate_naming(outcome: ValidationOutcome, path: &std::path::Path) -> ValidationOutcome {
    if path.components().count() != 1 {
        return outcome;
    }
    match SubmissionName::parse(path) {
        Some(name) => outcome.meta("submission", name.to_string()).meta("url", name.url()),
        None => {
            outcome.diagnostic(format!("filename `{}` does not match submission naming conventions", path.display()))
        },
    }
}
