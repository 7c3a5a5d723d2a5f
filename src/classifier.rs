//! Destination selection for a single file.
//!
//! Rules are evaluated in a fixed order and the first one that produces a
//! destination wins:
//!
//! 1. the file's extension is a route key
//! 2. a route key appears in the file name
//! 3. a route key appears in the extracted text (images and documents only)
//! 4. a destination already holds a file with a very similar name
//! 5. the fallback directory
//!
//! Within each step routes are tried in registration order. Routes whose
//! directory does not exist are treated as if they were not configured.

use crate::activity::ActivityLog;
use crate::extract::TextExtractor;
use crate::file_kind::{FileKind, extension_of, file_name_of, stem_of};
use crate::routes::{OutflowRoute, RouteTable};
use crate::similarity::SimilarityIndex;
use std::fmt;
use std::path::{Path, PathBuf};

/// Minimum similarity for a name-based match.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Why a destination was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    ExtensionMatch { extension: String },
    KeywordInFilename { keyword: String },
    KeywordInContent { keyword: String },
    SimilarTo { name: String, score: f64 },
    Fallback,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::ExtensionMatch { extension } => write!(f, "extension match (.{})", extension),
            Reason::KeywordInFilename { keyword } => {
                write!(f, "keyword \"{}\" in filename", keyword)
            }
            Reason::KeywordInContent { keyword } => {
                write!(f, "keyword \"{}\" in content", keyword)
            }
            Reason::SimilarTo { name, .. } => write!(f, "similar to existing file {}", name),
            Reason::Fallback => write!(f, "no rule matched; fallback used"),
        }
    }
}

/// A chosen destination directory and the rule that chose it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub destination: PathBuf,
    pub reason: Reason,
}

/// The classification engine.
pub struct Classifier {
    extractor: Box<dyn TextExtractor>,
}

fn first_available<'a>(
    routes: &'a RouteTable,
    mut matches: impl FnMut(&OutflowRoute) -> bool,
) -> Option<&'a OutflowRoute> {
    routes
        .iter()
        .find(|route| route.is_available() && matches(route))
}

impl Classifier {
    pub fn new(extractor: Box<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// Chooses a destination for `file`, or `None` when nothing applies and
    /// no usable fallback is configured.
    ///
    /// Directory listing failures during similarity matching are written to
    /// `log`; the next directory is tried.
    pub fn classify(
        &self,
        file: &Path,
        routes: &RouteTable,
        fallback: Option<&Path>,
        index: &mut SimilarityIndex,
        log: &mut ActivityLog,
    ) -> Option<Decision> {
        Self::by_extension(file, routes)
            .or_else(|| Self::by_filename(file, routes))
            .or_else(|| self.by_content(file, routes))
            .or_else(|| Self::by_similarity(file, routes, index, log))
            .or_else(|| Self::by_fallback(fallback))
    }

    fn by_extension(file: &Path, routes: &RouteTable) -> Option<Decision> {
        let extension = extension_of(file)?;
        let route = routes.get(&extension).filter(|route| route.is_available())?;
        Some(Decision {
            destination: route.destination.clone(),
            reason: Reason::ExtensionMatch { extension },
        })
    }

    fn by_filename(file: &Path, routes: &RouteTable) -> Option<Decision> {
        let name = file_name_of(file).to_lowercase();
        let route = first_available(routes, |route| name.contains(&route.key))?;
        Some(Decision {
            destination: route.destination.clone(),
            reason: Reason::KeywordInFilename {
                keyword: route.key.clone(),
            },
        })
    }

    fn by_content(&self, file: &Path, routes: &RouteTable) -> Option<Decision> {
        if !FileKind::detect(file).is_extractable() {
            return None;
        }
        let text = self.extractor.extract_text(file).to_lowercase();
        if text.is_empty() {
            return None;
        }

        let route = first_available(routes, |route| text.contains(&route.key))?;
        Some(Decision {
            destination: route.destination.clone(),
            reason: Reason::KeywordInContent {
                keyword: route.key.clone(),
            },
        })
    }

    fn by_similarity(
        file: &Path,
        routes: &RouteTable,
        index: &mut SimilarityIndex,
        log: &mut ActivityLog,
    ) -> Option<Decision> {
        let stem = stem_of(file);
        if stem.is_empty() {
            return None;
        }

        for dir in routes.destinations() {
            if !dir.is_dir() {
                continue;
            }
            match index.closest(dir, &stem) {
                Ok(Some(hit)) if hit.score >= SIMILARITY_THRESHOLD => {
                    return Some(Decision {
                        destination: dir.to_path_buf(),
                        reason: Reason::SimilarTo {
                            name: hit.name,
                            score: hit.score,
                        },
                    });
                }
                Ok(_) => {}
                Err(e) => log.warn(format!(
                    "Error accessing {} for similarity matching: {}",
                    dir.display(),
                    e
                )),
            }
        }
        None
    }

    fn by_fallback(fallback: Option<&Path>) -> Option<Decision> {
        let dir = fallback.filter(|dir| dir.is_dir())?;
        Some(Decision {
            destination: dir.to_path_buf(),
            reason: Reason::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::NoExtraction;
    use std::fs;
    use tempfile::TempDir;

    struct StaticText(&'static str);

    impl TextExtractor for StaticText {
        fn extract_text(&self, _path: &Path) -> String {
            self.0.to_string()
        }
    }

    struct Fixture {
        temp_dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp_dir: TempDir::new().expect("Failed to create temp directory"),
            }
        }

        fn dir(&self, name: &str) -> PathBuf {
            let path = self.temp_dir.path().join(name);
            fs::create_dir_all(&path).unwrap();
            path
        }

        fn file(&self, name: &str) -> PathBuf {
            let path = self.dir("inflow").join(name);
            fs::write(&path, "content").unwrap();
            path
        }
    }

    fn classify_with(
        extractor: impl TextExtractor + 'static,
        file: &Path,
        routes: &RouteTable,
        fallback: Option<&Path>,
    ) -> Option<Decision> {
        let mut index = SimilarityIndex::new();
        let mut log = ActivityLog::new();
        Classifier::new(Box::new(extractor)).classify(file, routes, fallback, &mut index, &mut log)
    }

    #[test]
    fn test_extension_beats_keyword() {
        let fx = Fixture::new();
        let docs = fx.dir("docs");
        let invoices = fx.dir("invoices");
        let mut routes = RouteTable::new();
        routes.insert("invoice", &invoices).unwrap();
        routes.insert("pdf", &docs).unwrap();

        let decision = classify_with(NoExtraction, &fx.file("invoice.pdf"), &routes, None).unwrap();

        assert_eq!(decision.destination, docs);
        assert_eq!(
            decision.reason,
            Reason::ExtensionMatch {
                extension: "pdf".to_string()
            }
        );
    }

    #[test]
    fn test_missing_extension_destination_falls_through() {
        let fx = Fixture::new();
        let invoices = fx.dir("invoices");
        let mut routes = RouteTable::new();
        routes.insert("pdf", fx.temp_dir.path().join("not-there")).unwrap();
        routes.insert("invoice", &invoices).unwrap();

        let decision = classify_with(NoExtraction, &fx.file("invoice.pdf"), &routes, None).unwrap();

        assert_eq!(decision.destination, invoices);
        assert_eq!(decision.reason.to_string(), "keyword \"invoice\" in filename");
    }

    #[test]
    fn test_filename_keyword_is_case_insensitive_and_ordered() {
        let fx = Fixture::new();
        let tax = fx.dir("tax");
        let bills = fx.dir("bills");
        let mut routes = RouteTable::new();
        routes.insert("tax", &tax).unwrap();
        routes.insert("bill", &bills).unwrap();

        let decision =
            classify_with(NoExtraction, &fx.file("TAX_Bill_2024.xyz"), &routes, None).unwrap();

        assert_eq!(decision.destination, tax);
    }

    #[test]
    fn test_content_keyword_for_documents() {
        let fx = Fixture::new();
        let receipts = fx.dir("receipts");
        let mut routes = RouteTable::new();
        routes.insert("receipt", &receipts).unwrap();

        let decision = classify_with(
            StaticText("Your RECEIPT for order 1234"),
            &fx.file("scan_0001.png"),
            &routes,
            None,
        )
        .unwrap();

        assert_eq!(decision.destination, receipts);
        assert!(matches!(decision.reason, Reason::KeywordInContent { .. }));
    }

    #[test]
    fn test_content_ignored_for_non_extractable_kinds() {
        let fx = Fixture::new();
        let receipts = fx.dir("receipts");
        let mut routes = RouteTable::new();
        routes.insert("receipt", &receipts).unwrap();

        let decision = classify_with(StaticText("receipt"), &fx.file("track01.mp3"), &routes, None);

        assert_eq!(decision, None);
    }

    #[test]
    fn test_similarity_match() {
        let fx = Fixture::new();
        let photos = fx.dir("photos");
        fs::write(photos.join("holiday_2023_01.jpg"), "x").unwrap();
        let mut routes = RouteTable::new();
        routes.insert("jpg", &photos).unwrap();

        let decision =
            classify_with(NoExtraction, &fx.file("holiday_2023_02.heic"), &routes, None).unwrap();

        assert_eq!(decision.destination, photos);
        assert_eq!(
            decision.reason.to_string(),
            "similar to existing file holiday_2023_01"
        );
    }

    #[test]
    fn test_similarity_at_threshold_matches() {
        let fx = Fixture::new();
        let photos = fx.dir("photos");
        fs::write(photos.join("abcde.jpg"), "x").unwrap();
        let mut routes = RouteTable::new();
        routes.insert("jpg", &photos).unwrap();

        // "abcde" vs "abcdf" shares four of five characters: 2*4/10.
        let decision = classify_with(NoExtraction, &fx.file("abcdf.xyz"), &routes, None).unwrap();

        assert_eq!(decision.destination, photos);
        assert_eq!(
            decision.reason,
            Reason::SimilarTo {
                name: "abcde".to_string(),
                score: SIMILARITY_THRESHOLD,
            }
        );
    }

    #[test]
    fn test_similarity_below_threshold_never_matches() {
        let fx = Fixture::new();
        let photos = fx.dir("photos");
        fs::write(photos.join("invoice_march.jpg"), "x").unwrap();
        let mut routes = RouteTable::new();
        routes.insert("jpg", &photos).unwrap();

        let decision = classify_with(NoExtraction, &fx.file("invoice_april.xyz"), &routes, None);

        assert_eq!(decision, None);
    }

    #[test]
    fn test_fallback() {
        let fx = Fixture::new();
        let misc = fx.dir("misc");
        let routes = RouteTable::new();

        let decision =
            classify_with(NoExtraction, &fx.file("mystery.xyz"), &routes, Some(misc.as_path())).unwrap();

        assert_eq!(decision.destination, misc);
        assert_eq!(decision.reason.to_string(), "no rule matched; fallback used");
    }

    #[test]
    fn test_missing_fallback_is_no_destination() {
        let fx = Fixture::new();
        let missing = fx.temp_dir.path().join("misc");

        let decision = classify_with(
            NoExtraction,
            &fx.file("mystery.xyz"),
            &RouteTable::new(),
            Some(missing.as_path()),
        );

        assert_eq!(decision, None);
    }
}
