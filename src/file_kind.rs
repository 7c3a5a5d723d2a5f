//! File kinds that matter to the sorting pipeline.
//!
//! A file's kind decides two things: whether content extraction is worth
//! attempting during classification, and whether the file is an installer
//! package that should be checked against installed applications first.
//! Kinds also carry the extension groups used to derive default routes.
//!
//! # Examples
//!
//! ```
//! use quasar::file_kind::FileKind;
//!
//! assert_eq!(FileKind::from_extension("PNG"), FileKind::Image);
//! assert_eq!(FileKind::from_extension("msi"), FileKind::Installer);
//! assert!(FileKind::Document.is_extractable());
//! assert!(!FileKind::Music.is_extractable());
//! ```

use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "xls", "xlsx", "ppt", "pptx"];
const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg"];
const INSTALLER_EXTENSIONS: &[&str] = &["exe", "msi", "dmg", "pkg", "deb", "rpm", "appimage"];

/// Broad kind of a file found in an inflow directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Raster images (OCR candidates).
    Image,
    /// Office documents, PDFs and plain text.
    Document,
    /// Audio files.
    Music,
    /// Installer packages (executables, disk images, distro packages).
    Installer,
    /// Anything else.
    Other,
}

impl FileKind {
    /// Kinds that own a default extension group.
    pub const ROUTABLE: [FileKind; 3] = [FileKind::Image, FileKind::Document, FileKind::Music];

    /// Returns the extension group for this kind.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Image => IMAGE_EXTENSIONS,
            FileKind::Document => DOCUMENT_EXTENSIONS,
            FileKind::Music => MUSIC_EXTENSIONS,
            FileKind::Installer => INSTALLER_EXTENSIONS,
            FileKind::Other => &[],
        }
    }

    /// Returns a short human-readable name.
    pub fn group_name(&self) -> &'static str {
        match self {
            FileKind::Image => "images",
            FileKind::Document => "documents",
            FileKind::Music => "music",
            FileKind::Installer => "installers",
            FileKind::Other => "other",
        }
    }

    /// Maps a file extension (case-insensitive, with or without dot) to a kind.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_lowercase();
        [
            FileKind::Image,
            FileKind::Document,
            FileKind::Music,
            FileKind::Installer,
        ]
        .into_iter()
        .find(|kind| kind.extensions().contains(&ext.as_str()))
        .unwrap_or(FileKind::Other)
    }

    /// Detects the kind of a file on disk.
    ///
    /// The extension decides first. Files with an unknown or missing
    /// extension are sniffed by content with `infer`, so a scanned PDF saved
    /// without its suffix is still treated as a document.
    pub fn detect(path: &Path) -> Self {
        let by_extension = extension_of(path)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(FileKind::Other);
        if by_extension != FileKind::Other {
            return by_extension;
        }

        match infer::get_from_path(path) {
            Ok(Some(kind)) => Self::from_sniffed(kind.matcher_type(), kind.mime_type()),
            _ => FileKind::Other,
        }
    }

    fn from_sniffed(matcher: infer::MatcherType, mime: &str) -> Self {
        // infer files PDFs under its archive matchers
        if mime == "application/pdf" {
            return FileKind::Document;
        }
        match matcher {
            infer::MatcherType::Image => FileKind::Image,
            infer::MatcherType::Doc | infer::MatcherType::Book => FileKind::Document,
            infer::MatcherType::Audio => FileKind::Music,
            _ => FileKind::Other,
        }
    }

    /// Whether text extraction is meaningful for this kind.
    pub fn is_extractable(&self) -> bool {
        matches!(self, FileKind::Image | FileKind::Document)
    }
}

/// Returns the lowercase extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Returns the file name of `path` as a lossy string.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Returns the file name of `path` with its final extension stripped.
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
