//! Persisted settings.
//!
//! Settings are stored as TOML:
//!
//! ```toml
//! inflow_dirs = ["/home/me/Downloads"]
//! any_extension_dir = "/home/me/Applications"
//!
//! [outflow_dirs]
//! pdf = "/home/me/Documents"
//! invoice = "/home/me/Documents/Invoices"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! extensions = ["crdownload", "part", "tmp"]
//! ```
//!
//! The order of `[outflow_dirs]` entries is the order routes are tried in.
//! A missing settings file yields defaults derived from the user's standard
//! folders; a malformed one is reported and replaced by those defaults.

use crate::file_kind::FileKind;
use crate::filter::{CompiledFilters, FilterError, FilterRules};
use crate::routes::{RouteError, RouteTable};
use crate::sorter::SortJob;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "quasar";
const CONFIG_FILE: &str = "config.toml";
const LEDGER_FILE: &str = "ledger.json";

/// Errors that can occur while loading or saving settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No per-user configuration directory on this platform.
    #[error("could not determine a configuration directory for this user")]
    NoConfigDir,
    #[error("failed to read settings from {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid settings in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write settings to {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// User-editable sorting configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directories scanned on each run, in order.
    #[serde(default)]
    pub inflow_dirs: Vec<PathBuf>,

    /// Where files go when no rule matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_extension_dir: Option<PathBuf>,

    /// Extension and keyword routes, in registration order.
    #[serde(default)]
    pub outflow_dirs: RouteTable,

    /// Which inflow files a run ignores.
    #[serde(default)]
    pub filters: FilterRules,
}

impl Settings {
    /// `<config dir>/quasar/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read (including
    /// when it does not exist) and [`ConfigError::Parse`] when it is not
    /// valid settings TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads settings from `path`, falling back to [`Settings::derived`].
    ///
    /// Never fails: a missing file is the normal first-run case and a broken
    /// one is logged as a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No settings at {}; deriving defaults", path.display());
            return Self::derived();
        }

        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{}; using default settings", e);
                Self::derived()
            }
        }
    }

    /// Defaults based on the current user's standard folders.
    pub fn derived() -> Self {
        let groups = [
            (FileKind::Image, dirs::picture_dir()),
            (FileKind::Document, dirs::document_dir()),
            (FileKind::Music, dirs::audio_dir()),
        ];
        let fallback = dirs::home_dir().map(|home| home.join("Applications"));
        Self::derive_from(&groups, fallback)
    }

    /// Registers every extension of each group whose folder exists.
    ///
    /// The fallback is kept even if it does not exist yet; a missing
    /// fallback directory is simply never used.
    pub fn derive_from(groups: &[(FileKind, Option<PathBuf>)], fallback: Option<PathBuf>) -> Self {
        let mut outflow_dirs = RouteTable::new();
        for (kind, dir) in groups {
            let Some(dir) = dir.as_ref().filter(|dir| dir.is_dir()) else {
                continue;
            };
            for extension in kind.extensions() {
                // Extensions are non-empty constants, so this cannot fail.
                let _ = outflow_dirs.insert(extension, dir.clone());
            }
        }

        Self {
            inflow_dirs: Vec::new(),
            any_extension_dir: fallback,
            outflow_dirs,
            filters: FilterRules::default(),
        }
    }

    /// Renders settings as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes settings to `path` as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Adds an inflow directory. Returns `false` if it was already listed.
    pub fn add_inflow(&mut self, dir: impl Into<PathBuf>) -> bool {
        let dir = dir.into();
        if self.inflow_dirs.contains(&dir) {
            return false;
        }
        self.inflow_dirs.push(dir);
        true
    }

    /// Removes an inflow directory. Returns `false` if it was not listed.
    pub fn remove_inflow(&mut self, dir: &Path) -> bool {
        let before = self.inflow_dirs.len();
        self.inflow_dirs.retain(|existing| existing != dir);
        self.inflow_dirs.len() != before
    }

    /// Adds or replaces a route, returning the replaced destination.
    pub fn set_route(
        &mut self,
        key: &str,
        destination: impl Into<PathBuf>,
    ) -> Result<Option<PathBuf>, ConfigError> {
        Ok(self.outflow_dirs.insert(key, destination)?)
    }

    pub fn remove_route(&mut self, key: &str) -> Option<PathBuf> {
        self.outflow_dirs.remove(key).map(|route| route.destination)
    }

    pub fn set_fallback(&mut self, dir: Option<PathBuf>) {
        self.any_extension_dir = dir;
    }

    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        Ok(self.filters.compile()?)
    }

    /// Builds a sort job from the current settings.
    ///
    /// Filters that fail to compile are reported and replaced by the default
    /// filters.
    pub fn sort_job(&self, dry_run: bool) -> SortJob {
        let filters = self.compile_filters().unwrap_or_else(|e| {
            tracing::warn!("{}; using default filters", e);
            FilterRules::default().compile().unwrap_or_default()
        });

        SortJob {
            inflow_dirs: self.inflow_dirs.clone(),
            routes: self.outflow_dirs.clone(),
            fallback: self.any_extension_dir.clone(),
            filters,
            dry_run,
        }
    }

    /// The ledger file that lives next to the settings file at `config_path`.
    pub fn ledger_path(config_path: &Path) -> PathBuf {
        config_path
            .parent()
            .map(|dir| dir.join(LEDGER_FILE))
            .unwrap_or_else(|| PathBuf::from(LEDGER_FILE))
    }
}
