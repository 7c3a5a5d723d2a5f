/// Physical relocation of files into outflow directories.
///
/// Every call into [`MoveExecutor`] leaves exactly one entry in the session's
/// activity log. A successful move also leaves exactly one [`MoveAction`] in
/// the undo ledger; a failed move leaves none. Redundant installers are
/// deleted instead, which is logged but never recorded for undo.
use crate::activity::ActivityLog;
use crate::file_kind::file_name_of;
use crate::ledger::MoveAction;
use crate::session::Session;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while moving or deleting a file.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// The file to move is gone or is not a regular file.
    #[error("source file {} does not exist", .path.display())]
    SourceMissing { path: PathBuf },
    /// The destination directory is gone.
    #[error("destination directory {} does not exist", .path.display())]
    DestinationMissing { path: PathBuf },
    /// The source path has no file name to carry over.
    #[error("{} has no file name component", .path.display())]
    NoFileName { path: PathBuf },
    /// The rename (or copy fallback) failed.
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Deleting a redundant installer failed.
    #[error("failed to delete {}: {source}", .path.display())]
    Delete { path: PathBuf, source: io::Error },
}

/// Result type for move operations.
pub type MoveResult<T> = Result<T, MoveError>;

/// Moves `from` to `to`, overwriting an existing file at `to`.
///
/// Falls back to copy-then-remove when the two paths live on different
/// filesystems. The fallback is not atomic.
pub fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(e),
    }
}

/// Copies `from` to `to` and removes `from`. If the source cannot be removed
/// the copy is deleted, so the file never ends up in both places.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    fs::remove_file(from).inspect_err(|_| {
        let _ = fs::remove_file(to);
    })
}

/// Performs moves and installer deletions for a sort run.
pub struct MoveExecutor;

impl MoveExecutor {
    /// Moves `source` into `destination_dir` and records the move.
    ///
    /// The destination path is `destination_dir/<file name of source>`. A
    /// same-named file already at the destination is overwritten.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quasar::mover::MoveExecutor;
    /// use quasar::session::Session;
    /// use std::path::Path;
    ///
    /// let mut session = Session::new();
    /// let result = MoveExecutor::execute_move(
    ///     Path::new("/home/me/Downloads/invoice.pdf"),
    ///     Path::new("/home/me/Documents"),
    ///     "extension match (.pdf)",
    ///     &mut session,
    /// );
    ///
    /// match result {
    ///     Ok(action) => println!("Moved to {}", action.destination_path.display()),
    ///     Err(e) => eprintln!("Move failed: {}", e),
    /// }
    /// ```
    pub fn execute_move(
        source: &Path,
        destination_dir: &Path,
        reason: &str,
        session: &mut Session,
    ) -> MoveResult<MoveAction> {
        let name = file_name_of(source);

        match Self::relocate_into(source, destination_dir) {
            Ok(destination) => {
                let action = session.ledger.record(source, &destination, reason);
                session.log.info(format!(
                    "Moved {} to {} ({})",
                    name,
                    destination_dir.display(),
                    reason
                ));
                Ok(action)
            }
            Err(e) => {
                session.log.warn(format!("Error moving {}: {}", name, e));
                Err(e)
            }
        }
    }

    fn relocate_into(source: &Path, destination_dir: &Path) -> MoveResult<PathBuf> {
        if !source.is_file() {
            return Err(MoveError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        if !destination_dir.is_dir() {
            return Err(MoveError::DestinationMissing {
                path: destination_dir.to_path_buf(),
            });
        }

        let file_name = source.file_name().ok_or_else(|| MoveError::NoFileName {
            path: source.to_path_buf(),
        })?;
        let destination = destination_dir.join(file_name);

        relocate(source, &destination).map_err(|e| MoveError::Relocate {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        Ok(destination)
    }

    /// Deletes a redundant installer. Deletion is permanent and has no undo.
    pub fn delete_installer(path: &Path, app_name: &str, log: &mut ActivityLog) -> MoveResult<()> {
        let name = file_name_of(path);

        match fs::remove_file(path) {
            Ok(()) => {
                log.info(format!(
                    "Deleted installer {} because {} is already installed (cannot be undone)",
                    name, app_name
                ));
                Ok(())
            }
            Err(e) => {
                let error = MoveError::Delete {
                    path: path.to_path_buf(),
                    source: e,
                };
                log.warn(format!("Error deleting installer {}: {}", name, error));
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_then_remove_moves_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("a.txt");
        let to = temp_dir.path().join("b.txt");
        fs::write(&from, "content").unwrap();

        copy_then_remove(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "content");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_then_remove_deletes_copy_when_source_stays() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let from = locked.join("a.txt");
        let to = temp_dir.path().join("a.txt");
        fs::write(&from, "content").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind a privileged user.
        if fs::write(locked.join("writable"), "").is_ok() {
            return;
        }
        let result = copy_then_remove(&from, &to);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(result.is_err());
        assert!(from.exists());
        assert!(!to.exists());
    }

    #[test]
    fn test_move_records_action_and_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("test.txt");
        let dest_dir = temp_dir.path().join("documents");
        fs::create_dir(&dest_dir).unwrap();
        fs::write(&source, "test content").unwrap();

        let mut session = Session::new();
        let action = MoveExecutor::execute_move(&source, &dest_dir, "extension match", &mut session)
            .expect("Failed to move file");

        assert!(!source.exists());
        assert!(dest_dir.join("test.txt").exists());
        assert_eq!(action.source_path, source);
        assert_eq!(action.destination_path, dest_dir.join("test.txt"));
        assert_eq!(session.ledger.len(), 1);
        assert_eq!(session.log.len(), 1);
    }

    #[test]
    fn test_missing_destination_fails_without_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("test.txt");
        fs::write(&source, "test content").unwrap();

        let mut session = Session::new();
        let result = MoveExecutor::execute_move(
            &source,
            &temp_dir.path().join("missing"),
            "extension match",
            &mut session,
        );

        assert!(matches!(result, Err(MoveError::DestinationMissing { .. })));
        assert!(source.exists());
        assert!(session.ledger.is_empty());
        assert_eq!(session.log.len(), 1);
    }

    #[test]
    fn test_missing_source_fails_without_action() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut session = Session::new();
        let result = MoveExecutor::execute_move(
            &temp_dir.path().join("ghost.txt"),
            temp_dir.path(),
            "extension match",
            &mut session,
        );

        assert!(matches!(result, Err(MoveError::SourceMissing { .. })));
        assert!(session.ledger.is_empty());
        assert_eq!(session.log.len(), 1);
    }

    #[test]
    fn test_same_name_at_destination_is_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes.txt");
        let dest_dir = temp_dir.path().join("documents");
        fs::create_dir(&dest_dir).unwrap();
        fs::write(&source, "new").unwrap();
        fs::write(dest_dir.join("notes.txt"), "old").unwrap();

        let mut session = Session::new();
        MoveExecutor::execute_move(&source, &dest_dir, "extension match", &mut session).unwrap();

        assert_eq!(fs::read_to_string(dest_dir.join("notes.txt")).unwrap(), "new");
    }

    #[test]
    fn test_delete_installer_logs_without_ledger() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let installer = temp_dir.path().join("setup_app.exe");
        fs::write(&installer, "MZ").unwrap();

        let mut session = Session::new();
        MoveExecutor::delete_installer(&installer, "app", &mut session.log).unwrap();

        assert!(!installer.exists());
        assert!(session.ledger.is_empty());
        assert_eq!(session.log.len(), 1);
        assert!(session.log.entries()[0].message.contains("cannot be undone"));
    }

    #[test]
    fn test_delete_missing_installer_is_logged_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut log = ActivityLog::new();

        let result = MoveExecutor::delete_installer(&temp_dir.path().join("gone.exe"), "gone", &mut log);

        assert!(matches!(result, Err(MoveError::Delete { .. })));
        assert_eq!(log.len(), 1);
    }
}
