//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "arxcat", version, about = "Validate and catalog bulk scholarly submission archives")]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to the platform config
    /// directory).
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate local bulk archives and update the registry.
    Validate {
        /// Archive files to process.
        #[arg(required = true, value_name = "ARCHIVE")]
        archives: Vec<PathBuf>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Fetch archives from the source bucket by manifest and validate them.
    Batch {
        /// Bulk archive names to process (e.g. `arXiv_src_9912_001.tar`).
        /// When omitted, every archive listed in the manifest is processed.
        #[arg(value_name = "NAME")]
        archives: Vec<String>,
        /// Stop after this many archives.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Download the manifest or one bulk archive to a local file.
    Fetch {
        /// `manifest`, or a bulk archive name like `arXiv_src_9912_001.tar`.
        #[arg(value_name = "NAME")]
        name: String,
        /// Destination path (defaults to the object's basename).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Flags shared by the validating subcommands. Each overrides the
/// corresponding configuration key.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Members validated concurrently per archive.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Maximum accepted archive nesting depth.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
    /// Registry JSON file to load before and save after the run.
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,
    /// Write the diagnostics report as JSON to this file.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_validate_with_overrides() {
        let cli = Cli::parse_from(["arxcat", "validate", "a.tar", "--concurrency", "2", "--report", "out.json"]);
        let Command::Validate { archives, run } = cli.command else {
            panic!("expected validate subcommand");
        };
        assert_eq!(archives, vec![PathBuf::from("a.tar")]);
        assert_eq!(run.concurrency, Some(2));
        assert_eq!(run.report, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn cli_requires_archives_for_validate() {
        assert!(Cli::try_parse_from(["arxcat", "validate"]).is_err());
    }

    #[test]
    fn cli_parses_batch_without_names() {
        let cli = Cli::parse_from(["arxcat", "batch", "--limit", "3"]);
        let Command::Batch { archives, limit, .. } = cli.command else {
            panic!("expected batch subcommand");
        };
        assert!(archives.is_empty());
        assert_eq!(limit, Some(3));
    }
}
