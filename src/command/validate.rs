//! Validate local archive files.

use crate::command::{cancel_on_ctrl_c, conclude, load_catalog};
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use arxcat_pipeline::error::ErrorKind as PipelineErrorKind;
use arxcat_pipeline::Pipeline;
use arxcat_registry::Report;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

pub async fn run(config: Config, archives: Vec<PathBuf>, report_path: Option<&Path>) -> Result<ExitCode> {
    let catalog = load_catalog(&config)?;
    let pipeline = Pipeline::new(Arc::clone(&catalog), config.pipeline_options());
    let cancel = cancel_on_ctrl_c();

    let mut archive_failures = Vec::new();
    for path in &archives {
        let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::Io(path.clone()))?;
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => path.display().to_string(),
        };
        match pipeline.process_archive(&name, &bytes, &cancel).await {
            Ok(summary) => {
                println!(
                    "{name}: {} members, {} new, {} updated, {} conflicts",
                    summary.members, summary.inserted, summary.updated, summary.conflicts
                );
                archive_failures.extend(summary.member_failures);
            },
            Err(error) if matches!(&*error, PipelineErrorKind::Archive(_)) => {
                eprintln!("warning: {error}");
                archive_failures.push(format!("{name}: {error}"));
            },
            // Completed work is still reported and persisted.
            Err(error) if matches!(&*error, PipelineErrorKind::Cancelled) => {
                eprintln!("cancelled, reporting completed work");
                break;
            },
            Err(error) => return Err(error.raise(ErrorKind::Pipeline)),
        }
    }

    let entries = catalog.entries().map_err(|err| err.raise(ErrorKind::Pipeline))?;
    let conflicts = catalog.conflicts().map_err(|err| err.raise(ErrorKind::Pipeline))?;
    let mut report = Report::aggregate(&entries, conflicts);
    report.archive_failures.extend(archive_failures);
    conclude(&config, &catalog, report, report_path)
}
