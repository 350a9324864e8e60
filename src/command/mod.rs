//! Subcommand entry points.

mod batch;
mod fetch;
mod validate;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use arxcat_registry::{Catalog, Report, load_entries, save_entries};
use exn::ResultExt;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Validate { archives, run } => {
            let report = run.report.clone();
            validate::run(config.with_overrides(&run), archives, report.as_deref()).await
        },
        Command::Batch { archives, limit, run } => {
            let report = run.report.clone();
            batch::run(config.with_overrides(&run), archives, limit, report.as_deref()).await
        },
        Command::Fetch { name, output } => fetch::run(&config, &name, output).await.map(|()| ExitCode::SUCCESS),
    }
}

/// A cancellation token tripped by the first interrupt signal. In-flight
/// members finish and the completed work is still reported.
fn cancel_on_ctrl_c() -> arxcat_pipeline::CancelToken {
    let cancel = arxcat_pipeline::CancelToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight work");
            signal.cancel();
        }
    });
    cancel
}

/// Open the catalog, seeded from the configured registry file when present.
fn load_catalog(config: &Config) -> Result<Arc<Catalog>> {
    let catalog = match &config.registry {
        Some(path) => {
            let entries = load_entries(path).map_err(|err| err.raise(ErrorKind::Registry(path.clone())))?;
            tracing::info!(path = %path.display(), entries = entries.len(), "registry loaded");
            Catalog::from_entries(entries)
        },
        None => Catalog::new(),
    };
    Ok(Arc::new(catalog))
}

/// Persist the catalog, write the report if asked to, print the summary,
/// and turn the report into the process exit code.
fn conclude(config: &Config, catalog: &Catalog, report: Report, report_path: Option<&Path>) -> Result<ExitCode> {
    let entries = catalog.entries().map_err(|err| err.raise(ErrorKind::Pipeline))?;
    if let Some(path) = &config.registry {
        save_entries(path, &entries).map_err(|err| err.raise(ErrorKind::Registry(path.clone())))?;
        tracing::info!(path = %path.display(), entries = entries.len(), "registry saved");
    }
    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
        std::fs::write(path, json).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    }
    print_summary(&report);
    Ok(if report.has_failures() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_summary(report: &Report) {
    println!("valid: {}  invalid: {}  warning: {}", report.valid, report.invalid, report.warning);
    for conflict in &report.conflicts {
        println!(
            "conflict: {} from {} contradicts stored {} entry",
            conflict.identity,
            conflict.incoming_source.archive,
            conflict.existing.outcome.status
        );
    }
    for path in &report.unhandled {
        println!("unhandled: {}", path.display());
    }
    for failure in &report.archive_failures {
        println!("archive failure: {failure}");
    }
}
