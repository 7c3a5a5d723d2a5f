/// Undo ledger for reverting moves.
///
/// The ledger keeps structured [`MoveAction`] records in the order the moves
/// happened. Undoing moves a file from its recorded destination back to its
/// recorded source; nothing is ever re-derived from log text.
use crate::activity::ActivityLog;
use crate::file_kind::file_name_of;
use crate::mover::relocate;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One completed relocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveAction {
    /// Ledger-assigned identifier, unique for the lifetime of the ledger.
    pub id: u64,
    /// Where the file was before the move.
    pub source_path: PathBuf,
    /// Where the file was moved to.
    pub destination_path: PathBuf,
    pub timestamp: DateTime<Local>,
    /// Why the file was routed to its destination.
    pub reason: String,
}

/// Errors while persisting or loading the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read ledger {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write ledger {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid ledger format in {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Outcome of an "undo all".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UndoReport {
    /// Ids of restored actions, in the order they were undone.
    pub restored: Vec<u64>,
    /// Actions whose file was no longer at its destination.
    pub skipped: Vec<(PathBuf, String)>,
    /// Actions whose restore failed for another reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns the total number of actions processed.
    pub fn total_processed(&self) -> usize {
        self.restored.len() + self.skipped.len() + self.failed.len()
    }

    /// Returns true if every action was restored.
    pub fn is_complete_success(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

enum RestoreFailure {
    /// The file is not at the recorded destination any more.
    Missing(String),
    Failed(String),
}

/// Ordered, reversible history of moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoLedger {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    actions: Vec<MoveAction>,
}

impl UndoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed move and returns the stored action.
    pub fn record(&mut self, source: &Path, destination: &Path, reason: &str) -> MoveAction {
        self.next_id += 1;
        let action = MoveAction {
            id: self.next_id,
            source_path: source.to_path_buf(),
            destination_path: destination.to_path_buf(),
            timestamp: Local::now(),
            reason: reason.to_string(),
        };
        self.actions.push(action.clone());
        action
    }

    /// Actions in chronological order (oldest first).
    pub fn actions(&self) -> &[MoveAction] {
        &self.actions
    }

    pub fn get(&self, id: u64) -> Option<&MoveAction> {
        self.actions.iter().find(|action| action.id == id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Forgets an action without touching the filesystem.
    pub fn discard(&mut self, id: u64) -> Option<MoveAction> {
        let index = self.actions.iter().position(|action| action.id == id)?;
        Some(self.actions.remove(index))
    }

    /// Reverses one move.
    ///
    /// On success the action leaves the ledger. If the file is no longer at
    /// `action.destination_path`, the undo fails, the failure is logged and
    /// the action stays in the ledger.
    pub fn undo(&mut self, action: &MoveAction, log: &mut ActivityLog) -> bool {
        self.undo_logged(action, log).is_ok()
    }

    /// Reverses the move recorded under `id`.
    pub fn undo_by_id(&mut self, id: u64, log: &mut ActivityLog) -> bool {
        match self.get(id).cloned() {
            Some(action) => self.undo(&action, log),
            None => {
                log.warn(format!("Undo failed: no recorded move with id {}", id));
                false
            }
        }
    }

    /// Reverses every recorded move, newest first.
    ///
    /// Failures do not stop the sequence. Failed actions stay in the ledger.
    pub fn undo_all(&mut self, log: &mut ActivityLog) -> UndoReport {
        let pending: Vec<MoveAction> = self.actions.iter().rev().cloned().collect();
        let mut report = UndoReport::default();

        for action in pending {
            match self.undo_logged(&action, log) {
                Ok(()) => report.restored.push(action.id),
                Err(RestoreFailure::Missing(reason)) => {
                    report.skipped.push((action.destination_path, reason))
                }
                Err(RestoreFailure::Failed(reason)) => {
                    report.failed.push((action.destination_path, reason))
                }
            }
        }

        report
    }

    fn undo_logged(
        &mut self,
        action: &MoveAction,
        log: &mut ActivityLog,
    ) -> Result<(), RestoreFailure> {
        let name = file_name_of(&action.destination_path);

        match Self::restore_file(action) {
            Ok(()) => {
                self.actions.retain(|recorded| recorded.id != action.id);
                log.info(format!(
                    "Undo: moved {} back to {}",
                    name,
                    action.source_path.display()
                ));
                Ok(())
            }
            Err(RestoreFailure::Missing(reason)) => {
                log.warn(format!("Undo failed for {}: {}", name, reason));
                Err(RestoreFailure::Missing(reason))
            }
            Err(RestoreFailure::Failed(reason)) => {
                log.warn(format!("Error undoing move of {}: {}", name, reason));
                Err(RestoreFailure::Failed(reason))
            }
        }
    }

    /// Restores a single file to its original location.
    ///
    /// An entry already occupying the original location is backed up with
    /// a timestamp suffix first.
    fn restore_file(action: &MoveAction) -> Result<(), RestoreFailure> {
        if !action.destination_path.exists() {
            return Err(RestoreFailure::Missing(format!(
                "file is no longer at {}",
                action.destination_path.display()
            )));
        }

        let backup_path = if action.source_path.exists() {
            let backup_path = Self::generate_backup_path(&action.source_path);
            fs::rename(&action.source_path, &backup_path).map_err(|e| {
                RestoreFailure::Failed(format!("could not back up conflicting file: {}", e))
            })?;
            Some(backup_path)
        } else {
            None
        };

        let Err(e) = relocate(&action.destination_path, &action.source_path) else {
            return Ok(());
        };

        // Put the conflicting file back where it was.
        if let Some(backup_path) = backup_path
            && let Err(rollback) = fs::rename(&backup_path, &action.source_path)
        {
            return Err(RestoreFailure::Failed(format!(
                "failed to restore file: {}; conflicting file left at {}: {}",
                e,
                backup_path.display(),
                rollback
            )));
        }
        Err(RestoreFailure::Failed(format!("failed to restore file: {}", e)))
    }

    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S");
        let backup_name = format!("{}.bak.{}", file_name_of(original_path), timestamp);

        match original_path.parent() {
            Some(parent) => parent.join(backup_name),
            None => PathBuf::from(backup_name),
        }
    }

    /// Loads a ledger saved with [`UndoLedger::save`]. A missing file is an
    /// empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path).map_err(|e| LedgerError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| LedgerError::Format {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes the ledger as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let write_error = |e| LedgerError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| LedgerError::Format {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Moves `name` from `base` into `base/dest` and records it.
    fn moved(ledger: &mut UndoLedger, base: &Path, name: &str) -> MoveAction {
        let source = base.join(name);
        let dest_dir = base.join("dest");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&source, name).unwrap();
        let destination = dest_dir.join(name);
        fs::rename(&source, &destination).unwrap();
        ledger.record(&source, &destination, "test")
    }

    #[test]
    fn test_ids_increase() {
        let mut ledger = UndoLedger::new();
        let a = ledger.record(Path::new("/a"), Path::new("/x/a"), "r");
        let b = ledger.record(Path::new("/b"), Path::new("/x/b"), "r");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(ledger.get(2), Some(&b));
    }

    #[test]
    fn test_undo_restores_and_removes_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        let action = moved(&mut ledger, temp_dir.path(), "test.txt");

        assert!(ledger.undo(&action, &mut log));
        assert!(action.source_path.exists());
        assert!(!action.destination_path.exists());
        assert!(ledger.is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_second_undo_is_logged_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        let action = moved(&mut ledger, temp_dir.path(), "test.txt");

        assert!(ledger.undo(&action, &mut log));
        assert!(!ledger.undo(&action, &mut log));
        assert!(action.source_path.exists());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_undo_missing_file_keeps_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        let action = moved(&mut ledger, temp_dir.path(), "test.txt");
        fs::remove_file(&action.destination_path).unwrap();

        assert!(!ledger.undo_by_id(action.id, &mut log));
        assert_eq!(ledger.len(), 1);
        assert!(log.entries()[0].message.starts_with("Undo failed"));
    }

    #[test]
    fn test_undo_unknown_id() {
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        assert!(!ledger.undo_by_id(42, &mut log));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_all_is_lifo_and_continues_past_failures() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        let a = moved(&mut ledger, temp_dir.path(), "a.txt");
        let b = moved(&mut ledger, temp_dir.path(), "b.txt");
        let c = moved(&mut ledger, temp_dir.path(), "c.txt");
        fs::remove_file(&b.destination_path).unwrap();

        let report = ledger.undo_all(&mut log);

        assert_eq!(report.restored, vec![c.id, a.id]);
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.is_complete_success());
        assert_eq!(report.total_processed(), 3);
        assert!(a.source_path.exists());
        assert!(c.source_path.exists());
        assert_eq!(ledger.actions(), &[b]);
    }

    #[test]
    fn test_undo_with_file_name_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        let action = moved(&mut ledger, temp_dir.path(), "test.txt");
        fs::write(&action.source_path, "new content").unwrap();

        assert!(ledger.undo(&action, &mut log));

        assert_eq!(fs::read_to_string(&action.source_path).unwrap(), "test.txt");
        let backups = fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_failed_restore_puts_conflicting_file_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let moved_dir = temp_dir.path().join("photos");
        let source = moved_dir.join("inner").join("a.jpg");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "newer").unwrap();
        // A directory cannot be renamed into itself, so the restore fails
        // after the conflicting file was set aside.
        let mut ledger = UndoLedger::new();
        let mut log = ActivityLog::new();
        let action = ledger.record(&source, &moved_dir, "test");

        assert!(!ledger.undo(&action, &mut log));

        assert_eq!(fs::read_to_string(&source).unwrap(), "newer");
        let backups = fs::read_dir(source.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .count();
        assert_eq!(backups, 0);
        assert_eq!(ledger.actions(), &[action]);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("state").join("ledger.json");
        let mut ledger = UndoLedger::new();
        ledger.record(Path::new("/in/a.pdf"), Path::new("/docs/a.pdf"), "extension match");
        ledger.save(&path).unwrap();

        let mut loaded = UndoLedger::load(&path).unwrap();
        assert_eq!(loaded, ledger);
        // ids keep increasing after a reload
        assert_eq!(loaded.record(Path::new("/b"), Path::new("/c"), "r").id, 2);
    }

    #[test]
    fn test_load_missing_is_empty_and_corrupt_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(UndoLedger::load(&temp_dir.path().join("none.json")).unwrap().is_empty());

        let corrupt = temp_dir.path().join("ledger.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(UndoLedger::load(&corrupt), Err(LedgerError::Format { .. })));
    }
}
