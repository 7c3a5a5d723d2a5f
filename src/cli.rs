//! Command-line interface module for quasar.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing (clap derive)
//! - Loading and persisting settings and the undo ledger
//! - Running a sort in the background while streaming its activity log
//! - Selective and bulk undo

use crate::activity::LogEntry;
use crate::config::{ConfigError, Settings};
use crate::extract::DocumentTextExtractor;
use crate::ledger::{LedgerError, UndoLedger};
use crate::oracle::AppDirectoryOracle;
use crate::output::OutputFormatter;
use crate::session::Session;
use crate::sorter::{SortError, Sorter};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sorts files from inflow directories into outflow directories.
#[derive(Debug, Parser)]
#[command(name = "quasar", version, about)]
pub struct Cli {
    /// Settings file to use instead of the per-user default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit debug diagnostics on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sort every inflow directory once.
    Sort {
        /// Report what would happen without moving or deleting anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage inflow directories.
    Inflow {
        #[command(subcommand)]
        action: InflowCommand,
    },
    /// Manage extension and keyword routes.
    Route {
        #[command(subcommand)]
        action: RouteCommand,
    },
    /// Manage the fallback directory for unmatched files.
    Fallback {
        #[command(subcommand)]
        action: FallbackCommand,
    },
    /// List recorded moves, newest first.
    History,
    /// Reverse a recorded move, or all of them.
    Undo {
        /// Id of the move to reverse (see `history`).
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<u64>,
        /// Reverse every recorded move, newest first.
        #[arg(long)]
        all: bool,
    },
    /// Show or reset the settings file.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum InflowCommand {
    List,
    Add { dir: PathBuf },
    Remove { dir: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum RouteCommand {
    List,
    /// Route files with extension or keyword KEY to DIR.
    Set { key: String, dir: PathBuf },
    Remove { key: String },
}

#[derive(Debug, Subcommand)]
pub enum FallbackCommand {
    Set { dir: PathBuf },
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings as TOML.
    Show,
    /// Replace the settings with defaults derived from standard folders.
    Reset,
}

/// Errors surfaced to the user by a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error("no inflow directories configured; add one with `quasar inflow add <DIR>`")]
    NoInflowDirs,
    #[error("no recorded move with id {0}")]
    UnknownMove(u64),
    #[error("move {0} could not be undone; it is kept in the history")]
    UndoFailed(u64),
    #[error("{0} is not an inflow directory")]
    UnknownInflow(String),
    #[error("no route for key {0:?}")]
    UnknownRoute(String),
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use quasar::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["quasar", "sort", "--dry-run"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), CliError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let ledger_path = Settings::ledger_path(&config_path);
    let mut settings = Settings::load_or_default(&config_path);

    match cli.command {
        Command::Sort { dry_run } => {
            sort(&settings, &ledger_path, dry_run)?;
            // First run persists the derived defaults.
            settings.save(&config_path)?;
        }
        Command::Inflow { action } => {
            if update_inflow(&mut settings, action)? {
                settings.save(&config_path)?;
            }
        }
        Command::Route { action } => {
            if update_routes(&mut settings, action)? {
                settings.save(&config_path)?;
            }
        }
        Command::Fallback { action } => {
            match action {
                FallbackCommand::Set { dir } => {
                    warn_if_missing(&dir);
                    OutputFormatter::success(&format!("Fallback set to {}", dir.display()));
                    settings.set_fallback(Some(dir));
                }
                FallbackCommand::Clear => {
                    settings.set_fallback(None);
                    OutputFormatter::success("Fallback cleared");
                }
            }
            settings.save(&config_path)?;
        }
        Command::History => {
            let ledger = UndoLedger::load(&ledger_path)?;
            OutputFormatter::history(ledger.actions());
        }
        Command::Undo { id, all } => match id {
            Some(id) if !all => undo_one(&ledger_path, id)?,
            _ => undo_all(&ledger_path)?,
        },
        Command::Config { action } => match action {
            ConfigCommand::Show => {
                OutputFormatter::info(&format!("# {}", config_path.display()));
                OutputFormatter::plain(&settings.to_toml()?);
            }
            ConfigCommand::Reset => {
                settings = Settings::derived();
                settings.save(&config_path)?;
                OutputFormatter::success(&format!(
                    "Settings reset to defaults in {}",
                    config_path.display()
                ));
            }
        },
    }

    Ok(())
}

/// Runs one sort on a background worker, printing its log as it grows.
fn sort(settings: &Settings, ledger_path: &Path, dry_run: bool) -> Result<(), CliError> {
    if settings.inflow_dirs.is_empty() {
        return Err(CliError::NoInflowDirs);
    }

    let job = settings.sort_job(dry_run);
    let session = Session::with_ledger(UndoLedger::load(ledger_path)?);
    let sorter = Sorter::new(
        Box::new(DocumentTextExtractor::default()),
        Box::new(AppDirectoryOracle::platform_default()),
    );

    if dry_run {
        OutputFormatter::dry_run_notice("No files will be moved or deleted.");
    }

    let handle = sorter.spawn(job, session)?;
    let pb = OutputFormatter::create_spinner("Sorting...");
    let print = |entries: Vec<LogEntry>| {
        for entry in &entries {
            pb.println(OutputFormatter::format_log_entry(entry));
        }
    };

    while !handle.is_finished() {
        print(handle.poll_log());
        thread::sleep(POLL_INTERVAL);
    }
    let outcome = handle.join()?;
    print(outcome.unread_log);
    pb.finish_and_clear();

    if !dry_run {
        outcome.session.ledger.save(ledger_path)?;
    }

    OutputFormatter::sort_summary(&outcome.summary, dry_run);
    if !dry_run && outcome.summary.moved > 0 {
        OutputFormatter::info("Use 'quasar history' and 'quasar undo' to revert moves.");
    }

    Ok(())
}

fn undo_one(ledger_path: &Path, id: u64) -> Result<(), CliError> {
    let mut session = Session::with_ledger(UndoLedger::load(ledger_path)?);
    if session.ledger.get(id).is_none() {
        return Err(CliError::UnknownMove(id));
    }

    let restored = session.undo(id);
    print_log(&session);
    session.ledger.save(ledger_path)?;

    if restored {
        Ok(())
    } else {
        Err(CliError::UndoFailed(id))
    }
}

fn undo_all(ledger_path: &Path) -> Result<(), CliError> {
    let mut session = Session::with_ledger(UndoLedger::load(ledger_path)?);
    if session.ledger.is_empty() {
        OutputFormatter::info("Nothing to undo.");
        return Ok(());
    }

    let report = session.undo_all();
    print_log(&session);
    session.ledger.save(ledger_path)?;
    OutputFormatter::undo_report(&report);

    if !report.is_complete_success() {
        OutputFormatter::warning("Entries that could not be restored are kept in the history.");
    }
    Ok(())
}

fn print_log(session: &Session) {
    for entry in session.log.entries() {
        OutputFormatter::log_entry(entry);
    }
}

/// Applies an inflow command. Returns whether settings changed.
fn update_inflow(settings: &mut Settings, action: InflowCommand) -> Result<bool, CliError> {
    match action {
        InflowCommand::List => {
            OutputFormatter::routes(
                &settings.inflow_dirs,
                &settings.outflow_dirs,
                settings.any_extension_dir.as_deref(),
            );
            Ok(false)
        }
        InflowCommand::Add { dir } => {
            warn_if_missing(&dir);
            if settings.add_inflow(&dir) {
                OutputFormatter::success(&format!("Added inflow {}", dir.display()));
                Ok(true)
            } else {
                OutputFormatter::info(&format!("{} is already an inflow", dir.display()));
                Ok(false)
            }
        }
        InflowCommand::Remove { dir } => {
            if settings.remove_inflow(&dir) {
                OutputFormatter::success(&format!("Removed inflow {}", dir.display()));
                Ok(true)
            } else {
                Err(CliError::UnknownInflow(dir.display().to_string()))
            }
        }
    }
}

/// Applies a route command. Returns whether settings changed.
fn update_routes(settings: &mut Settings, action: RouteCommand) -> Result<bool, CliError> {
    match action {
        RouteCommand::List => {
            OutputFormatter::routes(
                &settings.inflow_dirs,
                &settings.outflow_dirs,
                settings.any_extension_dir.as_deref(),
            );
            Ok(false)
        }
        RouteCommand::Set { key, dir } => {
            warn_if_missing(&dir);
            match settings.set_route(&key, &dir)? {
                Some(previous) => OutputFormatter::success(&format!(
                    "Route {} now goes to {} (was {})",
                    key,
                    dir.display(),
                    previous.display()
                )),
                None => {
                    OutputFormatter::success(&format!("Route {} goes to {}", key, dir.display()))
                }
            }
            Ok(true)
        }
        RouteCommand::Remove { key } => match settings.remove_route(&key) {
            Some(_) => {
                OutputFormatter::success(&format!("Removed route {}", key));
                Ok(true)
            }
            None => Err(CliError::UnknownRoute(key)),
        },
    }
}

fn warn_if_missing(dir: &Path) {
    if !dir.is_dir() {
        OutputFormatter::warning(&format!(
            "{} does not exist; it is ignored until it is created",
            dir.display()
        ));
    }
}
