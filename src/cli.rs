//! Command-line interface module for dirflat.
//!
//! This module is the caller of the organizer. It handles:
//! - Argument parsing
//! - Validation of the source and output directories
//! - Creating the output directory when it is missing
//! - Rendering organizer events and the final summary
//! - Writing the optional JSON report

use crate::config::{AppConfig, ConfigError};
use crate::extension_filter::ExtensionFilter;
use crate::organizer::{DirectoryOrganizer, EventSink, OrganizeEvent, RunResult};
use crate::output::OutputFormatter;
use crate::report::{ReportError, RunReport};
use clap::Parser;
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Copy matching files from a directory tree into one flat folder,
/// naming each copy after the folder it came from.
#[derive(Parser, Debug, Clone)]
#[command(name = "dirflat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flatten a directory tree, renaming files after their parent folder", long_about = None)]
pub struct CliArgs {
    /// Directory tree to scan
    pub source: PathBuf,

    /// Directory the copies are written to (created if missing)
    pub output: PathBuf,

    /// Extensions to copy, separated by colons (e.g. .txt:.pdf:.docx)
    #[arg(short, long, value_name = "SPEC")]
    pub ext: Option<String>,

    /// Show what would be copied without copying anything
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Only print failures and the summary
    #[arg(short, long)]
    pub quiet: bool,
}

/// Errors reported to the user before, or after, the organize pass.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Please specify a source folder.")]
    MissingSource,

    #[error("The source folder does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Please specify an output folder.")]
    MissingOutput,

    #[error("Could not create output folder {}: {source}", path.display())]
    OutputCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Runs one organize (or dry-run) pass as described by `args`.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirflat::cli::{run_cli, CliArgs};
///
/// let args = CliArgs::parse_from(["dirflat", "books", "flat", "--ext", ".txt:.pdf"]);
/// match run_cli(&args) {
///     Ok(result) => println!("{} files copied", result.processed),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &CliArgs) -> Result<RunResult, CliError> {
    validate_inputs(&args.source, &args.output)?;

    let config = AppConfig::load(args.config.as_deref())?;
    let exclusions = config.compile_filters()?;
    let spec = args
        .ext
        .clone()
        .unwrap_or_else(|| config.organize.extensions.clone());
    let filter = ExtensionFilter::parse(&spec);

    if args.dry_run {
        if !args.output.is_dir() {
            OutputFormatter::dry_run_notice(&format!(
                "Output folder would be created: {}",
                args.output.display()
            ));
        }
    } else if ensure_output_dir(&args.output)? {
        OutputFormatter::info(&OutputFormatter::timestamped(&format!(
            "Created output folder: {}",
            args.output.display()
        )));
    }

    OutputFormatter::header("=== Process Started ===");
    OutputFormatter::plain(&format!("Source Folder: {}", args.source.display()));
    OutputFormatter::plain(&format!("Output Folder: {}", args.output.display()));
    OutputFormatter::plain(&format!("File Extensions: {}", filter));

    let organizer = DirectoryOrganizer::new(filter).with_exclusions(exclusions);
    let spinner = OutputFormatter::create_spinner("Processing files...");
    let mut sink = ConsoleSink {
        spinner: &spinner,
        quiet: args.quiet,
    };

    let result = if args.dry_run {
        organizer.plan(&args.source, &args.output, &mut sink)
    } else {
        organizer.organize(&args.source, &args.output, &mut sink)
    };
    spinner.finish_and_clear();

    print_outcome(&result);

    if let Some(report_path) = &args.report {
        let report = RunReport::new(
            &args.source,
            &args.output,
            organizer.filter().to_string(),
            &result,
        );
        report.save(report_path)?;
        OutputFormatter::info(&format!("Report written to {}", report_path.display()));
    }

    Ok(result)
}

/// Checks the preconditions the organizer relies on.
///
/// The source must be given and be an existing directory; the output must be given.
pub fn validate_inputs(source: &Path, output: &Path) -> Result<(), CliError> {
    if source.as_os_str().is_empty() {
        return Err(CliError::MissingSource);
    }
    if !source.is_dir() {
        return Err(CliError::SourceNotFound(source.to_path_buf()));
    }
    if output.as_os_str().is_empty() {
        return Err(CliError::MissingOutput);
    }
    Ok(())
}

/// Creates the output directory (and its parents) if it does not exist.
///
/// Returns true if the directory was created.
pub fn ensure_output_dir(output: &Path) -> Result<bool, CliError> {
    if output.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(output).map_err(|source| CliError::OutputCreation {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(true)
}

fn print_outcome(result: &RunResult) {
    OutputFormatter::summary_table(result);

    let seconds = OutputFormatter::format_seconds(result.duration_secs());
    if result.is_empty() {
        OutputFormatter::info("No matching files found.");
    } else if result.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "{} files would be copied. No files were modified.",
            result.processed
        ));
    } else {
        OutputFormatter::success(&format!(
            "Process finished. {} files processed in {} seconds.",
            result.processed, seconds
        ));
    }

    if result.failures() > 0 {
        OutputFormatter::warning(&format!(
            "{} item(s) could not be processed. Please review errors above.",
            result.failures()
        ));
    }

    if result.metadata_warnings > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) were copied without their original timestamps.",
            result.metadata_warnings
        ));
    }
}

/// Prints organizer events as timestamped console lines.
struct ConsoleSink<'a> {
    spinner: &'a ProgressBar,
    quiet: bool,
}

impl EventSink for ConsoleSink<'_> {
    fn on_event(&mut self, event: &OrganizeEvent) {
        let line = OutputFormatter::timestamped(&event.to_string());
        if event.is_failure() {
            self.spinner.suspend(|| OutputFormatter::error(&line));
            return;
        }
        if event.is_warning() {
            self.spinner.suspend(|| OutputFormatter::warning(&line));
            return;
        }
        if self.quiet {
            return;
        }
        match event {
            OrganizeEvent::Copied { .. } => self.spinner.suspend(|| OutputFormatter::success(&line)),
            OrganizeEvent::Planned { .. } => {
                self.spinner.suspend(|| OutputFormatter::dry_run_notice(&line))
            }
            _ => self.spinner.suspend(|| OutputFormatter::info(&line)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_args() {
        let args = CliArgs::try_parse_from([
            "dirflat",
            "src",
            "out",
            "--ext",
            ".txt:.pdf",
            "--dry-run",
            "-q",
        ])
        .unwrap();

        assert_eq!(args.source, PathBuf::from("src"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.ext.as_deref(), Some(".txt:.pdf"));
        assert!(args.dry_run);
        assert!(args.quiet);
        assert!(args.config.is_none());
        assert!(args.report.is_none());
    }

    #[test]
    fn test_parse_args_requires_output() {
        assert!(CliArgs::try_parse_from(["dirflat", "src"]).is_err());
    }

    #[test]
    fn test_validate_inputs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        assert!(matches!(
            validate_inputs(Path::new(""), dir),
            Err(CliError::MissingSource)
        ));
        assert!(matches!(
            validate_inputs(&dir.join("missing"), dir),
            Err(CliError::SourceNotFound(_))
        ));
        assert!(matches!(
            validate_inputs(dir, Path::new("")),
            Err(CliError::MissingOutput)
        ));
        assert!(validate_inputs(dir, &dir.join("not-yet")).is_ok());
    }

    #[test]
    fn test_ensure_output_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.path().join("a/b/out");

        assert!(ensure_output_dir(&output).unwrap());
        assert!(output.is_dir());
        assert!(!ensure_output_dir(&output).unwrap());
    }

    #[test]
    fn test_ensure_output_dir_fails_under_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            ensure_output_dir(&file.join("out")),
            Err(CliError::OutputCreation { .. })
        ));
    }
}
