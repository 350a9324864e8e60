//! Batch orchestration over a retrieval collaborator.

use crate::cancel::CancelToken;
use crate::error::{ErrorKind, Result};
use crate::run::{ArchiveSummary, Pipeline};
use arxcat_registry::Report;
use async_stream::stream;
use async_trait::async_trait;
use futures::Stream;

/// Supplier of archive bytes by object key. Backed by the source bucket in
/// production and by in-memory fixtures in tests.
// TODO: When `dyn async trait` stabilizes, migrate to native 2024 Edition async traits.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Fetch the full byte payload for `key`. Failures should carry
    /// [`ErrorKind::Retrieval`] so the batch can record them and move on.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl ArchiveSource for std::collections::HashMap<String, Vec<u8>> {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        match self.get(key) {
            Some(bytes) => Ok(bytes.clone()),
            None => exn::bail!(ErrorKind::Retrieval(format!("no such key `{key}`"))),
        }
    }
}

/// Progress events emitted while a batch runs.
pub enum BatchEvent {
    Started { archives: usize },
    ArchiveStarted { archive: String },
    ArchiveFinished(ArchiveSummary),
    /// The archive could not be fetched or opened; the batch continues.
    ArchiveFailed { archive: String, error: String },
    /// Terminal event: the aggregated report over every entry, conflict and
    /// archive failure of the batch.
    Complete(Box<Report>),
}

/// Run the pipeline over every key in order, yielding progress as it goes.
///
/// One archive failing to fetch or open is recorded in the final report and
/// never aborts the batch; only cancellation and catalog errors end the
/// stream early.
pub fn run_batch<'a, S>(
    pipeline: &'a Pipeline,
    source: &'a S,
    keys: Vec<String>,
    cancel: &'a CancelToken,
) -> impl Stream<Item = Result<BatchEvent>> + 'a
where
    S: ArchiveSource,
{
    stream! {
        yield Ok(BatchEvent::Started { archives: keys.len() });
        let mut archive_failures = Vec::new();
        for key in keys {
            if cancel.is_cancelled() {
                yield Err(exn::Exn::from(ErrorKind::Cancelled));
                return;
            }
            yield Ok(BatchEvent::ArchiveStarted { archive: key.clone() });
            let bytes = match source.fetch(&key).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::warn!(archive = %key, %error, "archive fetch failed");
                    archive_failures.push(format!("{key}: {error}"));
                    yield Ok(BatchEvent::ArchiveFailed { archive: key, error: error.to_string() });
                    continue;
                },
            };
            match pipeline.process_archive(&key, &bytes, cancel).await {
                Ok(summary) => {
                    archive_failures.extend(summary.member_failures.iter().cloned());
                    yield Ok(BatchEvent::ArchiveFinished(summary));
                },
                Err(error) if matches!(&*error, ErrorKind::Archive(_)) => {
                    archive_failures.push(format!("{key}: {error}"));
                    yield Ok(BatchEvent::ArchiveFailed { archive: key, error: error.to_string() });
                },
                Err(error) => {
                    yield Err(error);
                    return;
                },
            }
        }
        match finish(pipeline, archive_failures) {
            Ok(report) => yield Ok(BatchEvent::Complete(Box::new(report))),
            Err(error) => yield Err(error),
        }
    }
}

fn finish(pipeline: &Pipeline, archive_failures: Vec<String>) -> Result<Report> {
    let catalog = pipeline.catalog();
    let entries = catalog.entries().map_err(|err| err.raise(ErrorKind::Registry))?;
    let conflicts = catalog.conflicts().map_err(|err| err.raise(ErrorKind::Registry))?;
    let mut report = Report::aggregate(&entries, conflicts);
    report.archive_failures = archive_failures;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::PipelineOptions;
    use arxcat_registry::Catalog;
    use futures::{StreamExt, pin_mut};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn tar_with(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn pdf() -> Vec<u8> {
        b"%PDF-1.4\n1 0 obj << /Type /Page >> endobj\n%%EOF\n".to_vec()
    }

    async fn collect(pipeline: &Pipeline, source: &HashMap<String, Vec<u8>>, keys: &[&str]) -> Vec<BatchEvent> {
        let cancel = CancelToken::new();
        let keys = keys.iter().map(|k| k.to_string()).collect();
        let events = run_batch(pipeline, source, keys, &cancel);
        pin_mut!(events);
        let mut collected = Vec::new();
        while let Some(event) = events.next().await {
            collected.push(event.unwrap());
        }
        collected
    }

    #[tokio::test]
    async fn batch_aggregates_across_archives() {
        let source: HashMap<String, Vec<u8>> = [
            ("arXiv_src_9912_001.tar".to_string(), tar_with(&[("9912.00001.pdf", &pdf())])),
            ("arXiv_src_9912_002.tar".to_string(), tar_with(&[("9912.00002.pdf", b"garbage")])),
        ]
        .into();
        let pipeline = Pipeline::new(Arc::new(Catalog::new()), PipelineOptions::default());

        let events = collect(&pipeline, &source, &["arXiv_src_9912_001.tar", "arXiv_src_9912_002.tar"]).await;
        let Some(BatchEvent::Complete(report)) = events.last() else {
            panic!("stream must end with a report");
        };
        assert_eq!(report.valid, 1);
        assert_eq!(report.invalid, 1);
        assert!(report.archive_failures.is_empty());
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn missing_archive_recorded_and_batch_continues() {
        let source: HashMap<String, Vec<u8>> =
            [("arXiv_src_9912_001.tar".to_string(), tar_with(&[("9912.00001.pdf", &pdf())]))].into();
        let pipeline = Pipeline::new(Arc::new(Catalog::new()), PipelineOptions::default());

        let events = collect(&pipeline, &source, &["arXiv_src_9911_009.tar", "arXiv_src_9912_001.tar"]).await;
        assert!(events.iter().any(|e| matches!(e, BatchEvent::ArchiveFailed { archive, .. } if archive == "arXiv_src_9911_009.tar")));
        let Some(BatchEvent::Complete(report)) = events.last() else {
            panic!("stream must end with a report");
        };
        assert_eq!(report.valid, 1);
        assert_eq!(report.archive_failures.len(), 1);
    }

    #[tokio::test]
    async fn unopenable_archive_recorded_and_batch_continues() {
        let source: HashMap<String, Vec<u8>> =
            [("arXiv_src_9912_001.tar".to_string(), b"not a container".to_vec())].into();
        let pipeline = Pipeline::new(Arc::new(Catalog::new()), PipelineOptions::default());

        let events = collect(&pipeline, &source, &["arXiv_src_9912_001.tar"]).await;
        let Some(BatchEvent::Complete(report)) = events.last() else {
            panic!("stream must end with a report");
        };
        assert_eq!(report.archive_failures.len(), 1);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn cancellation_ends_the_stream_with_an_error() {
        let source: HashMap<String, Vec<u8>> = HashMap::new();
        let pipeline = Pipeline::new(Arc::new(Catalog::new()), PipelineOptions::default());
        let cancel = CancelToken::new();
        cancel.cancel();

        let events = run_batch(&pipeline, &source, vec!["arXiv_src_9912_001.tar".to_string()], &cancel);
        pin_mut!(events);
        assert!(matches!(events.next().await, Some(Ok(BatchEvent::Started { archives: 1 }))));
        let Some(Err(error)) = events.next().await else {
            panic!("cancellation must surface as an error");
        };
        assert!(matches!(&*error, ErrorKind::Cancelled));
        assert!(events.next().await.is_none());
    }
}
