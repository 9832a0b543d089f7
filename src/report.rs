//! Saved session reports.
//!
//! A report is a portable snapshot of the collection order and the compile
//! options. It is plain JSON so it can be kept next to the documents it
//! lists and loaded back into any session.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::collection::CollectionStore;
use crate::collection::store::validate_identifier;
use crate::compile::{CompileOptions, CoverPlacement};
use crate::error::ReportError;

/// Report layout version written by this build.
pub const CURRENT_REPORT_VERSION: u32 = 1;

/// Serialized collection plus compile options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Layout version; reports written before versioning read as 0.
    #[serde(default)]
    pub version: u32,

    /// Document identifiers in compile order.
    #[serde(default)]
    pub pdfs: Vec<String>,

    /// Insert cover pages when compiling.
    #[serde(default)]
    pub use_cover_pages: bool,

    /// Cover file or page range, as in [`CompileOptions::cover_pages`].
    #[serde(default)]
    pub cover_pages: String,

    /// Where covers go; `once` when missing.
    #[serde(default)]
    pub cover_placement: CoverPlacement,
}

/// How a loaded report combines with the current collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Keep the current entries and append the report's.
    #[default]
    Merge,
    /// Start from an empty collection.
    Replace,
}

/// What a load changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Identifiers appended, in order.
    pub added: Vec<String>,
    /// Identifiers already present and left alone.
    pub skipped: Vec<String>,
}

impl Report {
    /// Project a collection order and options into a report.
    pub fn capture(pdfs: Vec<String>, options: &CompileOptions) -> Self {
        Self {
            version: CURRENT_REPORT_VERSION,
            pdfs,
            use_cover_pages: options.use_cover_pages,
            cover_pages: options.cover_pages.clone(),
            cover_placement: options.cover_placement,
        }
    }

    /// Compile options carried by the report.
    ///
    /// The output name is per-compile and never stored.
    pub fn options(&self) -> CompileOptions {
        CompileOptions {
            use_cover_pages: self.use_cover_pages,
            cover_pages: self.cover_pages.clone(),
            cover_placement: self.cover_placement,
            output_name: None,
        }
    }

    /// Check that the report can be applied.
    ///
    /// # Errors
    ///
    /// - [`ReportError::UnsupportedVersion`] for reports from a newer build
    /// - [`ReportError::InvalidIdentifier`] for an empty entry in `pdfs`
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.version > CURRENT_REPORT_VERSION {
            return Err(ReportError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_REPORT_VERSION,
            });
        }

        if let Some(position) = self
            .pdfs
            .iter()
            .position(|id| validate_identifier(id).is_err())
        {
            return Err(ReportError::InvalidIdentifier { position });
        }

        Ok(())
    }

    /// Add the report's documents to `store`.
    ///
    /// Validation happens before the store is touched; duplicates are
    /// skipped and listed in the summary.
    pub async fn apply(
        &self,
        store: &CollectionStore,
        mode: LoadMode,
    ) -> Result<LoadSummary, ReportError> {
        self.validate()?;
        let (added, skipped) = store
            .extend_skipping_duplicates(&self.pdfs, mode == LoadMode::Replace)
            .await;
        Ok(LoadSummary { added, skipped })
    }

    /// Parse and validate a report from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let report: Self = serde_json::from_str(json)?;
        report.validate()?;
        Ok(report)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report to `path`, creating parent directories.
    pub async fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        let io_error = |source: std::io::Error| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, json).await.map_err(io_error)?;

        tracing::debug!(path = %path.display(), pdfs = self.pdfs.len(), "Report written");
        Ok(())
    }

    /// Read and validate a report from `path`.
    pub async fn read_from(path: &Path) -> Result<Self, ReportError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ReportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&json)
    }
}
