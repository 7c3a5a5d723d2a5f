//! Filename similarity.
//!
//! The score is the Ratcliff/Obershelp "gestalt" ratio: twice the number of
//! characters in matching blocks divided by the combined length, computed on
//! lowercased input. Identical names score 1.0, disjoint names 0.0.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Similarity ratio of `a` and `b` in `0.0..=1.0`, case-insensitive.
///
/// ```
/// use quasar::similarity::ratio;
///
/// assert_eq!(ratio("Report", "report"), 1.0);
/// assert!(ratio("invoice_march", "invoice_april") < 0.8);
/// assert!(ratio("holiday_2023_01", "holiday_2023_02") > 0.9);
/// ```
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Longest common substring as `(start_in_a, start_in_b, len)`; earliest wins ties.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            let len = current[j + 1];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}

/// Closest existing name found in a destination directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarName {
    pub name: String,
    pub score: f64,
}

/// Per-run cache of the extension-stripped entry names of destination
/// directories.
///
/// Each directory is listed at most once per run. Files moved in during the
/// run are added with [`SimilarityIndex::record`] so later candidates can
/// match them without a re-listing. Listing failures are not cached.
#[derive(Debug, Default)]
pub struct SimilarityIndex {
    stems: HashMap<PathBuf, Vec<String>>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the entry of `dir` whose stem is closest to `stem`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if `dir` cannot be listed.
    pub fn closest(&mut self, dir: &Path, stem: &str) -> io::Result<Option<SimilarName>> {
        let stems = self.stems_of(dir)?;
        let mut best: Option<SimilarName> = None;
        for existing in stems {
            let score = ratio(stem, existing);
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(SimilarName {
                    name: existing.clone(),
                    score,
                });
            }
        }
        Ok(best)
    }

    /// Registers a stem that now exists in `dir`.
    pub fn record(&mut self, dir: &Path, stem: &str) {
        if let Some(stems) = self.stems.get_mut(dir) {
            stems.push(stem.to_string());
        }
    }

    fn stems_of(&mut self, dir: &Path) -> io::Result<&Vec<String>> {
        if !self.stems.contains_key(dir) {
            let listed = fs::read_dir(dir)?
                .flatten()
                .map(|entry| crate::file_kind::stem_of(&entry.path()))
                .collect();
            self.stems.insert(dir.to_path_buf(), listed);
        }
        self.stems
            .get(dir)
            .ok_or_else(|| io::Error::other("similarity cache lost a listing"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("same", "same"), 1.0);
    }

    #[test]
    fn test_ratio_matches_gestalt_definition() {
        // "abcd" vs "bcde": one block "bcd" of 3 chars → 2*3/8
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
        // blocks "ab" and "d" → 2*3/8
        assert!((ratio("abxd", "abyd") - 0.75).abs() < 1e-9);
        assert_eq!(ratio("abcde", "abcdf"), 0.8);
    }

    #[test]
    fn test_ratio_is_case_insensitive() {
        assert_eq!(ratio("TaxReturn", "taxreturn"), 1.0);
    }

    #[test]
    fn test_index_lists_once_and_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("budget_2023.xlsx"), "x").unwrap();

        let mut index = SimilarityIndex::new();
        let hit = index.closest(dir, "budget_2024").unwrap().unwrap();
        assert_eq!(hit.name, "budget_2023");
        assert!(hit.score > 0.9);

        // New files on disk are not seen until recorded.
        fs::write(dir.join("zebra.txt"), "x").unwrap();
        let hit = index.closest(dir, "zebra").unwrap().unwrap();
        assert_eq!(hit.name, "budget_2023");

        index.record(dir, "zebra");
        let hit = index.closest(dir, "zebra").unwrap().unwrap();
        assert_eq!(hit.name, "zebra");
        assert_eq!(hit.score, 1.0);
    }

    #[test]
    fn test_index_reports_listing_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("gone");

        let mut index = SimilarityIndex::new();
        assert!(index.closest(&missing, "anything").is_err());
    }

    #[test]
    fn test_empty_directory_has_no_match() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut index = SimilarityIndex::new();
        assert_eq!(index.closest(temp_dir.path(), "stem").unwrap(), None);
    }
}
