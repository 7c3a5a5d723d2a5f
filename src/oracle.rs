//! Installed-application lookup.
//!
//! The resolver only needs a yes/no answer for a candidate application name.
//! [`AppDirectoryOracle`] answers it by scanning the platform's application
//! directories a few levels deep for an entry whose name contains the
//! candidate.

use std::path::PathBuf;
use walkdir::WalkDir;

/// How deep below each root the directory oracle looks.
pub const DEFAULT_SCAN_DEPTH: usize = 4;

/// Names shorter than this are too ambiguous to look up.
const MIN_NAME_LEN: usize = 3;

/// Answers whether an application is already installed.
pub trait AppOracle: Send + Sync {
    fn is_installed(&self, app_name: &str) -> bool;
}

/// Scans application directories for a matching entry name.
#[derive(Debug, Clone)]
pub struct AppDirectoryOracle {
    roots: Vec<PathBuf>,
    max_depth: usize,
}

impl AppDirectoryOracle {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            max_depth: DEFAULT_SCAN_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Application directories of the current platform.
    pub fn platform_default() -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();

        if cfg!(target_os = "windows") {
            for var in ["ProgramFiles", "ProgramFiles(x86)"] {
                if let Ok(dir) = std::env::var(var) {
                    roots.push(PathBuf::from(dir));
                }
            }
            if let Some(local) = dirs::data_local_dir() {
                roots.push(local.join("Programs"));
            }
        } else if cfg!(target_os = "macos") {
            roots.push(PathBuf::from("/Applications"));
            if let Some(home) = dirs::home_dir() {
                roots.push(home.join("Applications"));
            }
        } else {
            roots.push(PathBuf::from("/usr/share/applications"));
            roots.push(PathBuf::from("/opt"));
            if let Some(data) = dirs::data_dir() {
                roots.push(data.join("applications"));
            }
        }

        Self::new(roots)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Lowercase alphanumerics only, so "Visual Studio Code" and
/// "visual-studio-code.desktop" compare equal.
fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl AppOracle for AppDirectoryOracle {
    fn is_installed(&self, app_name: &str) -> bool {
        let needle = squash(app_name);
        if needle.len() < MIN_NAME_LEN {
            return false;
        }

        self.roots.iter().filter(|root| root.is_dir()).any(|root| {
            WalkDir::new(root)
                .min_depth(1)
                .max_depth(self.max_depth)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .any(|entry| squash(&entry.file_name().to_string_lossy()).contains(&needle))
        })
    }
}
