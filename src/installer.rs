//! Redundant installer detection.
//!
//! Installer packages for applications that are already installed are
//! deleted instead of sorted. The candidate application name comes from the
//! file stem with installer noise removed, so `setup_app.exe` and
//! `App-Installer-2.4.1-x64.msi` both ask the oracle about "app".

use crate::file_kind::{FileKind, extension_of, stem_of};
use crate::oracle::AppOracle;
use std::path::Path;

const NOISE_TOKENS: &[&str] = &[
    "setup", "install", "installer", "x64", "x86", "win64", "win32", "amd64", "arm64", "64bit",
    "32bit", "windows", "win", "latest", "full",
];

/// What to do with an inflow file before ordinary classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerAction {
    /// The application is installed; the installer is redundant.
    Delete { app_name: String },
    /// Not a redundant installer; classify as usual.
    Keep,
}

fn is_version_token(token: &str) -> bool {
    let digits = token.strip_prefix('v').unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Derives the application name an installer file most likely belongs to.
///
/// ```
/// use quasar::installer::candidate_app_name;
/// use std::path::Path;
///
/// assert_eq!(candidate_app_name(Path::new("setup_app.exe")), "app");
/// assert_eq!(candidate_app_name(Path::new("vlc-3.0.20-win64.exe")), "vlc");
/// assert_eq!(candidate_app_name(Path::new("Setup.exe")), "setup");
/// ```
pub fn candidate_app_name(path: &Path) -> String {
    let stem = stem_of(path).to_lowercase();
    let tokens: Vec<&str> = stem
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| !NOISE_TOKENS.contains(token) && !is_version_token(token))
        .collect();

    if tokens.is_empty() {
        stem.clone()
    } else {
        tokens.join(" ")
    }
}

/// Checks installer files against the installed-application oracle.
pub struct InstallerResolver {
    oracle: Box<dyn AppOracle>,
}

impl InstallerResolver {
    pub fn new(oracle: Box<dyn AppOracle>) -> Self {
        Self { oracle }
    }

    /// Decides whether `path` is a redundant installer.
    ///
    /// Files whose extension is not an installer extension are always kept.
    pub fn resolve_executable(&self, path: &Path) -> InstallerAction {
        let is_installer = extension_of(path)
            .map(|ext| FileKind::from_extension(&ext) == FileKind::Installer)
            .unwrap_or(false);
        if !is_installer {
            return InstallerAction::Keep;
        }

        let app_name = candidate_app_name(path);
        if self.oracle.is_installed(&app_name) {
            tracing::debug!("{} belongs to installed application {}", path.display(), app_name);
            InstallerAction::Delete { app_name }
        } else {
            InstallerAction::Keep
        }
    }
}
