//! The sort run.
//!
//! A run walks each inflow directory's direct children once, in order, and
//! pushes every file through installer resolution, classification and the
//! move executor. Subdirectories of an inflow directory are never entered.
//! Files are processed strictly one after another; each file's outcome is
//! final for the run and never retried.
//!
//! [`Sorter::spawn`] runs the same loop on a background thread and returns a
//! [`SortHandle`] the front-end polls for log entries and completion.

use crate::activity::{ActivityLog, LogEntry};
use crate::classifier::Classifier;
use crate::extract::TextExtractor;
use crate::file_kind::{file_name_of, stem_of};
use crate::filter::CompiledFilters;
use crate::installer::{InstallerAction, InstallerResolver};
use crate::mover::MoveExecutor;
use crate::oracle::AppOracle;
use crate::routes::RouteTable;
use crate::session::Session;
use crate::similarity::SimilarityIndex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

/// Everything a run needs from configuration.
#[derive(Debug, Clone, Default)]
pub struct SortJob {
    pub inflow_dirs: Vec<PathBuf>,
    pub routes: RouteTable,
    pub fallback: Option<PathBuf>,
    pub filters: CompiledFilters,
    /// Classify and report without touching the filesystem or the ledger.
    pub dry_run: bool,
}

/// Per-run counts of file outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSummary {
    /// Files moved (or, in a dry run, that would be moved).
    pub moved: usize,
    /// Redundant installers deleted (or that would be deleted).
    pub deleted: usize,
    /// Files already sitting in their chosen destination.
    pub skipped: usize,
    /// Files with no destination at all.
    pub unresolved: usize,
    /// Files whose move or deletion failed.
    pub failed: usize,
    /// Inflow directories that could not be read.
    pub unreadable_sources: usize,
}

impl SortSummary {
    /// Number of files visited.
    pub fn visited(&self) -> usize {
        self.moved + self.deleted + self.skipped + self.unresolved + self.failed
    }
}

/// Errors from the background worker itself, never from individual files.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    #[error("failed to start sort worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("sort worker panicked")]
    WorkerPanicked,
}

/// Drives installer resolution, classification and moves.
pub struct Sorter {
    classifier: Classifier,
    installers: InstallerResolver,
}

impl Sorter {
    pub fn new(extractor: Box<dyn TextExtractor>, oracle: Box<dyn AppOracle>) -> Self {
        Self {
            classifier: Classifier::new(extractor),
            installers: InstallerResolver::new(oracle),
        }
    }

    /// Runs one sort over `job`, recording outcomes in `session`.
    pub fn run(&self, job: &SortJob, session: &mut Session) -> SortSummary {
        let mut summary = SortSummary::default();
        let mut processed: HashSet<PathBuf> = HashSet::new();
        let mut index = SimilarityIndex::new();

        for inflow in &job.inflow_dirs {
            let Some(files) = Self::direct_files(inflow, &mut session.log) else {
                summary.unreadable_sources += 1;
                continue;
            };

            for file in files {
                if !job.filters.should_include(&file) {
                    tracing::debug!("Ignoring {}", file.display());
                    continue;
                }
                if !processed.insert(Self::identity(&file)) {
                    continue;
                }
                // A file moved into a later inflow must not be picked up again.
                if let Some(moved_to) =
                    self.process_file(&file, job, session, &mut index, &mut summary)
                {
                    processed.insert(Self::identity(&moved_to));
                }
            }
        }

        tracing::info!(
            moved = summary.moved,
            deleted = summary.deleted,
            unresolved = summary.unresolved,
            failed = summary.failed,
            "Sort run finished"
        );
        summary
    }

    /// Runs [`Sorter::run`] on a background thread.
    ///
    /// The session moves into the worker and comes back from
    /// [`SortHandle::join`].
    pub fn spawn(self, job: SortJob, mut session: Session) -> Result<SortHandle, SortError> {
        let log_rx = session.log.subscribe();
        let worker = thread::Builder::new()
            .name("quasar-sort".to_string())
            .spawn(move || {
                let summary = self.run(&job, &mut session);
                (session, summary)
            })?;

        Ok(SortHandle { worker, log_rx })
    }

    /// Canonical path, so a file reachable through two paths is visited once.
    fn identity(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Regular files directly inside `dir`, sorted by name. `None` when the
    /// directory is missing or unreadable.
    fn direct_files(dir: &Path, log: &mut ActivityLog) -> Option<Vec<PathBuf>> {
        if !dir.is_dir() {
            log.warn(format!("Inflow directory does not exist: {}", dir.display()));
            return None;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log.warn(format!("Error reading inflow directory {}: {}", dir.display(), e));
                return None;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Some(files)
    }

    /// Handles one file. Returns where it was moved to, if it was moved.
    fn process_file(
        &self,
        file: &Path,
        job: &SortJob,
        session: &mut Session,
        index: &mut SimilarityIndex,
        summary: &mut SortSummary,
    ) -> Option<PathBuf> {
        let name = file_name_of(file);

        if let InstallerAction::Delete { app_name } = self.installers.resolve_executable(file) {
            if job.dry_run {
                session.log.info(format!(
                    "Would delete installer {} because {} is already installed",
                    name, app_name
                ));
                summary.deleted += 1;
            } else if MoveExecutor::delete_installer(file, &app_name, &mut session.log).is_ok() {
                summary.deleted += 1;
            } else {
                summary.failed += 1;
            }
            return None;
        }

        let decision = self.classifier.classify(
            file,
            &job.routes,
            job.fallback.as_deref(),
            index,
            &mut session.log,
        );
        let Some(decision) = decision else {
            session.log.warn(format!(
                "No destination for {}: no rule matched and no fallback directory is available",
                name
            ));
            summary.unresolved += 1;
            return None;
        };

        if file.parent() == Some(decision.destination.as_path()) {
            session.log.info(format!(
                "{} is already in {}; left in place",
                name,
                decision.destination.display()
            ));
            summary.skipped += 1;
            return None;
        }

        let reason = decision.reason.to_string();
        if job.dry_run {
            session.log.info(format!(
                "Would move {} to {} ({})",
                name,
                decision.destination.display(),
                reason
            ));
            summary.moved += 1;
            return None;
        }

        match MoveExecutor::execute_move(file, &decision.destination, &reason, session) {
            Ok(action) => {
                index.record(&decision.destination, &stem_of(file));
                summary.moved += 1;
                Some(action.destination_path)
            }
            Err(_) => {
                summary.failed += 1;
                None
            }
        }
    }
}

/// Result of a completed background run.
#[derive(Debug)]
pub struct SortOutcome {
    /// The session, with this run's log entries and moves added.
    pub session: Session,
    pub summary: SortSummary,
    /// Log entries appended since the last [`SortHandle::poll_log`].
    pub unread_log: Vec<LogEntry>,
}

/// Handle to a sort running on a background thread.
#[derive(Debug)]
pub struct SortHandle {
    worker: JoinHandle<(Session, SortSummary)>,
    log_rx: Receiver<LogEntry>,
}

impl SortHandle {
    /// Whether the run has completed.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Log entries appended since the previous poll. Never blocks.
    pub fn poll_log(&self) -> Vec<LogEntry> {
        self.log_rx.try_iter().collect()
    }

    /// Waits for the run to complete and returns the session.
    pub fn join(self) -> Result<SortOutcome, SortError> {
        let (session, summary) = self.worker.join().map_err(|_| SortError::WorkerPanicked)?;
        let unread_log = self.log_rx.try_iter().collect();
        Ok(SortOutcome {
            session,
            summary,
            unread_log,
        })
    }
}
