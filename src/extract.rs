//! Text extraction for content-keyword classification.
//!
//! Extraction never fails from the caller's point of view: any error is
//! logged as a diagnostic and reported as empty text, so classification
//! falls through to the next rule.

use crate::file_kind::{FileKind, extension_of};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Source of text for a file's content.
pub trait TextExtractor: Send + Sync {
    /// Returns the text found in `path`, or an empty string when none is
    /// available.
    fn extract_text(&self, path: &Path) -> String;
}

/// Extractor that never finds any text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtraction;

impl TextExtractor for NoExtraction {
    fn extract_text(&self, _path: &Path) -> String {
        String::new()
    }
}

/// Default extractor: PDF text layer via `pdf-extract`, plain text read
/// directly, images through an external OCR command (tesseract by default).
#[derive(Debug, Clone)]
pub struct DocumentTextExtractor {
    ocr_command: Option<PathBuf>,
}

impl Default for DocumentTextExtractor {
    fn default() -> Self {
        Self {
            ocr_command: Some(PathBuf::from("tesseract")),
        }
    }
}

impl DocumentTextExtractor {
    /// Uses `command` for OCR; `None` disables OCR entirely.
    pub fn with_ocr_command(command: Option<PathBuf>) -> Self {
        Self {
            ocr_command: command,
        }
    }

    fn pdf_text(path: &Path) -> Result<String, String> {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        // pdf-extract can panic on malformed fonts
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("PDF parser panicked".to_string()),
        }
    }

    fn ocr_text(&self, path: &Path) -> Result<String, String> {
        let Some(command) = &self.ocr_command else {
            return Ok(String::new());
        };
        let output = Command::new(command)
            .arg(path)
            .arg("stdout")
            .output()
            .map_err(|e| format!("could not run {}: {}", command.display(), e))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}",
                command.display(),
                output.status
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for DocumentTextExtractor {
    fn extract_text(&self, path: &Path) -> String {
        let result = match (FileKind::detect(path), extension_of(path).as_deref()) {
            (FileKind::Image, _) => self.ocr_text(path),
            (FileKind::Document, Some("txt")) => fs::read_to_string(path).map_err(|e| e.to_string()),
            (FileKind::Document, Some("pdf")) => Self::pdf_text(path),
            // extensionless files sniffed as PDF
            (FileKind::Document, None) => Self::pdf_text(path),
            _ => Ok(String::new()),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("Text extraction failed for {}: {}", path.display(), e);
            String::new()
        })
    }
}
