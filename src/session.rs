//! Session state shared by a front-end and the sort worker.
//!
//! A [`Session`] owns the activity log and the undo ledger. It is passed
//! explicitly to whatever mutates it; a running sort takes ownership and
//! hands it back when the run completes.

use crate::activity::ActivityLog;
use crate::ledger::{MoveAction, UndoLedger, UndoReport};

#[derive(Debug, Default)]
pub struct Session {
    pub log: ActivityLog,
    pub ledger: UndoLedger,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session on top of a previously saved ledger.
    pub fn with_ledger(ledger: UndoLedger) -> Self {
        Self {
            log: ActivityLog::new(),
            ledger,
        }
    }

    /// Undoes the move recorded under `id`.
    pub fn undo(&mut self, id: u64) -> bool {
        self.ledger.undo_by_id(id, &mut self.log)
    }

    /// Undoes a specific recorded move.
    pub fn undo_action(&mut self, action: &MoveAction) -> bool {
        self.ledger.undo(action, &mut self.log)
    }

    /// Undoes every recorded move, newest first.
    pub fn undo_all(&mut self) -> UndoReport {
        let report = self.ledger.undo_all(&mut self.log);
        self.log.info(format!(
            "Undo all finished: {} restored, {} missing, {} failed",
            report.restored.len(),
            report.skipped.len(),
            report.failed.len()
        ));
        report
    }
}
