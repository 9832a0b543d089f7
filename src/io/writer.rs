//! PDF writing and saving operations.
//!
//! Writes are atomic by default: the document is written to a sibling
//! temporary file which is then renamed over the destination, so a failed
//! compile never leaves a truncated output behind.

use lopdf::Document;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::CompressionLevel;
use crate::utils::format_file_size;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file, then rename.
    pub atomic: bool,

    /// Compression applied before writing.
    pub compression: CompressionLevel,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compression: CompressionLevel::Standard,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// A written but not yet published output file.
#[derive(Debug)]
pub struct StagedWrite {
    staged: PathBuf,
    target: PathBuf,
    start: Instant,
    committed: bool,
}

impl StagedWrite {
    /// Move the file into place.
    pub fn commit(mut self) -> io::Result<WriteStatistics> {
        if self.staged != self.target {
            std::fs::rename(&self.staged, &self.target)?;
        }
        self.committed = true;

        let file_size = std::fs::metadata(&self.target).map(|m| m.len()).unwrap_or(0);
        tracing::debug!(
            output = %self.target.display(),
            size = %format_file_size(file_size),
            "PDF written"
        );

        Ok(WriteStatistics {
            write_time: self.start.elapsed(),
            file_size,
            output_path: self.target.clone(),
        })
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.staged);
        }
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Save a PDF and return statistics about the operation.
    ///
    /// Missing parent directories are created. The document is compressed
    /// and renumbered in place according to the configured compression.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be created, written or renamed.
    pub fn save(&self, doc: &mut Document, path: &Path) -> io::Result<WriteStatistics> {
        self.stage(doc, path)?.commit()
    }

    /// Write a PDF without publishing it at `path` yet.
    ///
    /// The returned [`StagedWrite`] publishes on [`StagedWrite::commit`] and
    /// removes what it wrote when dropped uncommitted. Without atomic writes
    /// the file is written in place, so dropping it removes `path`.
    pub fn stage(&self, doc: &mut Document, path: &Path) -> io::Result<StagedWrite> {
        let start = Instant::now();

        match self.options.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => doc.compress(),
            CompressionLevel::Maximum => {
                doc.prune_objects();
                doc.compress();
            }
        }
        doc.renumber_objects();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let staged = StagedWrite {
            staged: if self.options.atomic {
                path.with_extension("pdf.tmp")
            } else {
                path.to_path_buf()
            },
            target: path.to_path_buf(),
            start,
            committed: false,
        };

        // On failure the drop of `staged` cleans up the partial file.
        self.write_to(doc, &staged.staged)?;
        Ok(staged)
    }

    fn write_to(&self, doc: &mut Document, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, file);
        doc.save_to(&mut writer).map_err(io::Error::other)?;
        writer.flush()
    }
}
