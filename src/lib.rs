//! quasar - sorts files from inflow directories into outflow directories
//!
//! Each file found directly inside an inflow directory is routed by
//! extension, by keyword (in its name or its extracted text), by similarity
//! to files already at a destination, or to a fallback directory. Installers
//! for applications that are already present are deleted instead. Every
//! move is recorded in an undo ledger and can be reversed individually or
//! all at once.

pub mod activity;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod extract;
pub mod file_kind;
pub mod filter;
pub mod installer;
pub mod ledger;
pub mod mover;
pub mod oracle;
pub mod output;
pub mod routes;
pub mod session;
pub mod similarity;
pub mod sorter;

pub use activity::{ActivityLog, LogEntry, LogLevel};
pub use classifier::{Classifier, Decision, Reason};
pub use config::{ConfigError, Settings};
pub use extract::{DocumentTextExtractor, TextExtractor};
pub use file_kind::FileKind;
pub use filter::{CompiledFilters, FilterRules};
pub use installer::{InstallerAction, InstallerResolver};
pub use ledger::{MoveAction, UndoLedger, UndoReport};
pub use mover::{MoveError, MoveExecutor};
pub use oracle::{AppDirectoryOracle, AppOracle};
pub use routes::{OutflowRoute, RouteTable};
pub use session::Session;
pub use sorter::{SortHandle, SortJob, SortOutcome, SortSummary, Sorter};

pub use cli::{Cli, run_cli};
