//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! the sort spinner, and formatted tables. This module abstracts away output details,
//! making it easy to change formatting globally.

use crate::activity::{LogEntry, LogLevel};
use crate::ledger::{MoveAction, UndoReport};
use crate::routes::RouteTable;
use crate::sorter::SortSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Activity log lines, colored by level
/// - A spinner for background sort runs
/// - Summary, history and route tables
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use quasar::output::OutputFormatter;
    /// OutputFormatter::success("Undo complete");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use quasar::output::OutputFormatter;
    /// OutputFormatter::error("Failed to load ledger");
    /// ```
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

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Renders one activity log line. Warnings are yellow.
    pub fn format_log_entry(entry: &LogEntry) -> String {
        let line = entry.to_string();
        match entry.level {
            LogLevel::Info => line,
            LogLevel::Warn => line.yellow().to_string(),
        }
    }

    /// Prints one activity log line.
    pub fn log_entry(entry: &LogEntry) {
        println!("{}", Self::format_log_entry(entry));
    }

    /// Creates a ticking spinner for a sort running in the background.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use quasar::output::OutputFormatter;
    /// let pb = OutputFormatter::create_spinner("Sorting...");
    /// pb.println("Moved a.pdf");
    /// pb.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Prints the per-outcome counts of a sort run.
    pub fn sort_summary(summary: &SortSummary, dry_run: bool) {
        Self::header(if dry_run { "DRY RUN SUMMARY" } else { "SUMMARY" });

        let (moved, deleted) = if dry_run {
            ("Would move", "Would delete")
        } else {
            ("Moved", "Deleted")
        };
        let rows = [
            (moved, summary.moved),
            (deleted, summary.deleted),
            ("Already in place", summary.skipped),
            ("No destination", summary.unresolved),
            ("Failed", summary.failed),
        ];
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        for (label, count) in rows {
            let count = count.to_string();
            let count = match label {
                "Failed" | "No destination" if count != "0" => count.red(),
                _ => count.green(),
            };
            println!("{:<width$} | {}", label, count, width = width);
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {}",
            "Total".bold(),
            summary.visited().to_string().green().bold(),
            width = width
        );

        if summary.unreadable_sources > 0 {
            Self::warning(&format!(
                "{} inflow director{} could not be read",
                summary.unreadable_sources,
                if summary.unreadable_sources == 1 { "y" } else { "ies" }
            ));
        }
    }

    /// Prints the undo ledger, newest first.
    pub fn history(actions: &[MoveAction]) {
        if actions.is_empty() {
            Self::info("No moves recorded.");
            return;
        }

        Self::header("HISTORY");
        for action in actions.iter().rev() {
            println!(
                "{:>4}  {}  {} {} {}",
                action.id.to_string().bold(),
                action.timestamp.format("%Y-%m-%d %H:%M:%S"),
                action.source_path.display(),
                "→".cyan(),
                action.destination_path.display()
            );
            println!("      {}", action.reason.dimmed());
        }
    }

    /// Prints the outcome of an undo-all.
    pub fn undo_report(report: &UndoReport) {
        Self::success(&format!("Restored: {}", report.restored.len()));

        if !report.skipped.is_empty() {
            Self::warning(&format!("Missing: {}", report.skipped.len()));
            for (path, reason) in &report.skipped {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed.is_empty() {
            Self::error(&format!("Failed: {}", report.failed.len()));
            for (path, reason) in &report.failed {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }

    /// Prints inflow directories, routes and the fallback.
    pub fn routes(inflow_dirs: &[impl AsRef<Path>], routes: &RouteTable, fallback: Option<&Path>) {
        Self::header("INFLOW");
        if inflow_dirs.is_empty() {
            Self::plain("  (none)");
        }
        for dir in inflow_dirs {
            Self::plain(&format!("  {}", Self::describe_dir(dir.as_ref())));
        }

        Self::header("ROUTES");
        if routes.is_empty() {
            Self::plain("  (none)");
        }
        let width = routes.iter().map(|route| route.key.len()).max().unwrap_or(0);
        for route in routes.iter() {
            println!(
                "  {:<width$} → {}",
                route.key,
                Self::describe_dir(&route.destination),
                width = width
            );
        }

        Self::header("FALLBACK");
        match fallback {
            Some(dir) => Self::plain(&format!("  {}", Self::describe_dir(dir))),
            None => Self::plain("  (none)"),
        }
    }

    fn describe_dir(dir: &Path) -> String {
        if dir.is_dir() {
            dir.display().to_string()
        } else {
            format!("{} {}", dir.display(), "(missing)".red())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityLog;

    #[test]
    fn test_info_entries_are_unstyled() {
        let mut log = ActivityLog::new();
        log.info("Moved a.pdf to /docs (extension match (.pdf))");

        let line = OutputFormatter::format_log_entry(&log.entries()[0]);

        assert_eq!(line, log.entries()[0].to_string());
    }

    #[test]
    fn test_warn_entries_keep_message() {
        let mut log = ActivityLog::new();
        log.warn("Error moving a.pdf: denied");

        let line = OutputFormatter::format_log_entry(&log.entries()[0]);

        assert!(line.contains("Error moving a.pdf: denied"));
    }
}
