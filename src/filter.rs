//! Ignore rules for inflow directories.
//!
//! Some files sitting in an inflow directory must never be relocated:
//! downloads still in progress, editor swap files, hidden metadata. These
//! rules are evaluated before a file enters the sorting pipeline. Supported
//! strategies:
//! - Hidden file toggle
//! - Exact filename matching
//! - File extension matching
//! - Glob pattern matching
//! - Regex pattern matching
//! - Include patterns that override everything above
//!
//! ```toml
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = ["desktop.ini", "Thumbs.db"]
//! extensions = ["crdownload", "part", "tmp"]
//! patterns = ["~$*"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Errors raised while compiling ignore rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// Invalid glob pattern provided.
    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Ignore rules as stored in the settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether hidden files (starting with ".") are sorted. Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides exclude rules.
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: false,
            exclude: ExcludeRules {
                extensions: ["crdownload", "part", "tmp"]
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
                ..Default::default()
            },
            include: IncludeRules::default(),
        }
    }
}

/// Rules for leaving files in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to skip (e.g., "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to skip, matched against the file name and the full path.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions to skip (case-insensitive, no dot).
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for forcing files into the run, overriding exclude rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterRules {
    /// Compile rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, FilterError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled ignore rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// Filters that let every file through.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, FilterError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| FilterError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, FilterError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| FilterError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Returns whether a file in an inflow directory is picked up for sorting.
    ///
    /// An include pattern overrides every exclusion. Otherwise the file is
    /// left alone when it is hidden (unless hidden files are enabled), or
    /// when its name or extension is listed, or when a glob or regex matches.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if Self::matches_any(&self.include_patterns, file_path, &file_name) {
            return true;
        }

        !(self.is_hidden(&file_name)
            || self.is_listed(file_path, &file_name)
            || self.matches_exclude_pattern(file_path, &file_name))
    }

    fn is_hidden(&self, file_name: &str) -> bool {
        !self.enable_hidden_files && file_name.starts_with('.')
    }

    /// Exact file name or extension (case-insensitive) on the exclude list.
    fn is_listed(&self, file_path: &Path, file_name: &str) -> bool {
        self.exclude_filenames.contains(file_name)
            || file_path.extension().is_some_and(|ext| {
                self.exclude_extensions
                    .contains(&ext.to_string_lossy().to_lowercase())
            })
    }

    /// Globs match the name or the full path; regexes match the name only.
    fn matches_exclude_pattern(&self, file_path: &Path, file_name: &str) -> bool {
        Self::matches_any(&self.exclude_patterns, file_path, file_name)
            || self
                .exclude_regexes
                .iter()
                .any(|regex| regex.is_match(file_name))
    }

    fn matches_any(patterns: &[Pattern], file_path: &Path, file_name: &str) -> bool {
        patterns
            .iter()
            .any(|pattern| pattern.matches(file_name) || pattern.matches_path(file_path))
    }
}
