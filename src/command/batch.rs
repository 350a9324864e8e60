//! Manifest-driven retrieval and validation from the source bucket.

use crate::command::{cancel_on_ctrl_c, conclude, load_catalog};
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use arxcat_fetch::SourceBucket;
use arxcat_naming::Manifest;
use arxcat_pipeline::error::ErrorKind as PipelineErrorKind;
use arxcat_pipeline::{ArchiveSource, BatchEvent, Pipeline, run_batch};
use arxcat_registry::Report;
use async_trait::async_trait;
use futures::{StreamExt, pin_mut};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

pub async fn run(
    config: Config,
    names: Vec<String>,
    limit: Option<usize>,
    report_path: Option<&Path>,
) -> Result<ExitCode> {
    let (key_id, key_secret) = config.credentials()?;
    let bucket = SourceBucket::with_bucket(&config.bucket, &config.region, key_id, key_secret);
    let keys = select_keys(&bucket, names, limit).await?;
    tracing::info!(archives = keys.len(), "batch selected");

    let catalog = load_catalog(&config)?;
    let pipeline = Pipeline::new(Arc::clone(&catalog), config.pipeline_options());
    let source = BucketSource { bucket };
    let cancel = cancel_on_ctrl_c();

    let mut final_report = None;
    // Failures witnessed so far, so a cancelled run can still report them.
    let mut seen_failures = Vec::new();
    let mut cancelled = false;
    {
        let events = run_batch(&pipeline, &source, keys, &cancel);
        pin_mut!(events);
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(error) if matches!(&*error, PipelineErrorKind::Cancelled) => {
                    eprintln!("cancelled, reporting completed work");
                    cancelled = true;
                    break;
                },
                Err(error) => return Err(error.raise(ErrorKind::Pipeline)),
            };
            match event {
                BatchEvent::Started { archives } => println!("processing {archives} archives"),
                BatchEvent::ArchiveStarted { archive } => println!("processing {archive}"),
                BatchEvent::ArchiveFinished(summary) => {
                    println!(
                        "{}: {} members, {} new, {} updated, {} conflicts",
                        summary.archive, summary.members, summary.inserted, summary.updated, summary.conflicts
                    );
                    seen_failures.extend(summary.member_failures);
                },
                BatchEvent::ArchiveFailed { archive, error } => {
                    eprintln!("warning: {archive}: {error}");
                    seen_failures.push(format!("{archive}: {error}"));
                },
                BatchEvent::Complete(report) => final_report = Some(*report),
            }
        }
    }
    let report = match (final_report, cancelled) {
        (Some(report), _) => report,
        (None, true) => {
            let entries = catalog.entries().map_err(|err| err.raise(ErrorKind::Pipeline))?;
            let conflicts = catalog.conflicts().map_err(|err| err.raise(ErrorKind::Pipeline))?;
            let mut report = Report::aggregate(&entries, conflicts);
            report.archive_failures = seen_failures;
            report
        },
        // The stream always ends with a report unless it ended in an error above.
        (None, false) => exn::bail!(ErrorKind::Pipeline),
    };
    conclude(&config, &catalog, report, report_path)
}

/// Explicit names are trusted as-is under the bucket's `src/` prefix; an
/// empty selection means every archive the manifest lists, in order.
async fn select_keys(bucket: &SourceBucket, names: Vec<String>, limit: Option<usize>) -> Result<Vec<String>> {
    let mut keys = if names.is_empty() {
        let bytes = bucket.fetch_manifest().await.map_err(|err| err.raise(ErrorKind::Manifest))?;
        let manifest = Manifest::parse(&bytes).map_err(|err| err.raise(ErrorKind::Manifest))?;
        manifest.entries().map(|entry| entry.filename.clone()).collect()
    } else {
        names.into_iter().map(|name| format!("src/{name}")).collect::<Vec<_>>()
    };
    if let Some(limit) = limit {
        keys.truncate(limit);
    }
    Ok(keys)
}

struct BucketSource {
    bucket: SourceBucket,
}

#[async_trait]
impl ArchiveSource for BucketSource {
    async fn fetch(&self, key: &str) -> arxcat_pipeline::error::Result<Vec<u8>> {
        self.bucket.fetch_archive(key).await.map_err(|err| {
            let message = err.to_string();
            err.raise(PipelineErrorKind::Retrieval(message))
        })
    }
}
