//! PDF reading and loading operations.
//!
//! Loading is synchronous; callers on the async runtime wrap it in
//! `tokio::task::spawn_blocking`.

use lopdf::Document;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Reasons a PDF could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Nothing exists at the path.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is a directory.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The file could not be inspected.
    #[error("Cannot access file: {}\n  Reason: {source}", .path.display())]
    Inaccessible {
        /// Path that was inspected.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The file is encrypted.
    #[error("PDF is encrypted and cannot be processed: {}", .0.display())]
    Encrypted(PathBuf),

    /// lopdf rejected the file.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", .path.display())]
    Invalid {
        /// Path to the PDF.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The document parsed but contains no pages.
    #[error("PDF has no pages: {}", .0.display())]
    NoPages(PathBuf),
}

impl ReadError {
    /// Whether the failure means the document does not exist.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotAFile(_))
    }
}

/// A loaded PDF document with its file statistics.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// PDF reader with configurable loading behavior.
#[derive(Debug, Clone, Copy)]
pub struct PdfReader {
    /// Reject documents without pages.
    verify: bool,
}

impl PdfReader {
    /// Create a reader that rejects documents without pages.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a reader that accepts page-less documents.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Check that `path` names an existing regular file.
    pub fn check_path_exists(path: &Path) -> Result<(), ReadError> {
        let exists = path.try_exists().map_err(|source| ReadError::Inaccessible {
            path: path.to_path_buf(),
            source,
        })?;
        if !exists {
            return Err(ReadError::NotFound(path.to_path_buf()));
        }

        if path.is_dir() {
            return Err(ReadError::NotAFile(path.to_path_buf()));
        }

        Ok(())
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, is not a valid PDF, is
    /// encrypted, or (when verifying) has no pages.
    pub fn load(&self, path: &Path) -> Result<LoadedPdf, ReadError> {
        Self::check_path_exists(path)?;

        let start = Instant::now();
        let document = Document::load(path).map_err(|e| {
            let message = e.to_string();
            if message.contains("encrypt") || message.contains("password") {
                ReadError::Encrypted(path.to_path_buf())
            } else {
                ReadError::Invalid {
                    path: path.to_path_buf(),
                    reason: message,
                }
            }
        })?;

        let page_count = document.get_pages().len();
        if self.verify && page_count == 0 {
            return Err(ReadError::NoPages(path.to_path_buf()));
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            load_time: start.elapsed(),
            file_size,
        })
    }

    /// Load several documents in order, stopping at the first failure.
    pub fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<LoadedPdf>, ReadError> {
        paths.iter().map(|path| self.load(path)).collect()
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
