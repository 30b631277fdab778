//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! timestamped log lines, the progress spinner, and the end-of-run summary.

use crate::organizer::RunResult;
use chrono::{DateTime, Local};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - A spinner for runs of unknown length
/// - The run summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirflat::output::OutputFormatter;
    /// OutputFormatter::success("Copied 3 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prefixes a message with the current local time, e.g. `[14:03:07] Copied: ...`.
    pub fn timestamped(message: &str) -> String {
        Self::timestamped_at(Local::now(), message)
    }

    fn timestamped_at(now: DateTime<Local>, message: &str) -> String {
        format!("[{}] {}", now.format("%H:%M:%S"), message)
    }

    /// Creates a spinner for a run whose length is not known up front.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirflat::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner("Processing files...");
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Formats a duration the way summaries show it: seconds with two decimals.
    pub fn format_seconds(seconds: f64) -> String {
        format!("{:.2}", seconds)
    }

    /// Prints the end-of-run summary table.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirflat::organizer::RunResult;
    /// use dirflat::output::OutputFormatter;
    ///
    /// OutputFormatter::summary_table(&RunResult::default());
    /// ```
    pub fn summary_table(result: &RunResult) {
        Self::header("=== Process Summary ===");

        let processed_label = if result.dry_run {
            "Files planned"
        } else {
            "Files processed"
        };
        let rows = [
            (processed_label, result.processed.to_string().green().bold()),
            ("Failures", Self::count_colored(result.failures())),
            ("Timestamps lost", Self::count_colored(result.metadata_warnings)),
            ("Excluded", result.excluded.to_string().normal()),
            (
                "Time",
                format!("{} seconds", Self::format_seconds(result.duration_secs())).normal(),
            ),
            (
                "Completed",
                Local::now().format("%Y-%m-%d %H:%M:%S").to_string().normal(),
            ),
        ];

        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        println!("{}", "-".repeat(width + 24));
        for (label, value) in &rows {
            println!("{:<width$} | {}", label, value, width = width);
        }
        println!("{}", "-".repeat(width + 24));
    }

    fn count_colored(count: usize) -> ColoredString {
        if count == 0 {
            count.to_string().normal()
        } else {
            count.to_string().red().bold()
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
