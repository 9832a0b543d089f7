//! Documents known to a session.
//!
//! A document is identified by a name or path string. Relative identifiers
//! resolve against the library root; absolute ones are used as-is. This
//! module provides:
//! - [`DocumentResolver`] for identifier to path resolution
//! - [`MetadataProvider`] and its filesystem implementation
//! - [`LibraryScanner`] for discovering available documents

pub mod library;
pub mod resolver;

pub use library::LibraryScanner;
pub use resolver::DocumentResolver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::io::PdfReader;
use crate::io::reader::ReadError;

/// Metadata for a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Number of pages.
    pub page_count: usize,

    /// File size in bytes.
    pub size_bytes: u64,

    /// Creation time, when the filesystem records one.
    pub created_at: Option<DateTime<Utc>>,

    /// Last modification time.
    pub modified_at: Option<DateTime<Utc>>,
}

/// Source of document metadata.
///
/// Implementations are synchronous; async callers run them on the blocking
/// pool.
pub trait MetadataProvider: Send + Sync {
    /// Look up metadata for `identifier`.
    fn metadata(&self, identifier: &str) -> Result<DocumentMetadata, ReadError>;
}

/// Metadata provider backed by the filesystem and lopdf.
#[derive(Debug, Clone)]
pub struct FsMetadataProvider {
    resolver: DocumentResolver,
    reader: PdfReader,
}

impl FsMetadataProvider {
    /// Create a provider resolving identifiers with `resolver`.
    pub fn new(resolver: DocumentResolver) -> Self {
        Self {
            resolver,
            reader: PdfReader::without_verification(),
        }
    }
}

impl MetadataProvider for FsMetadataProvider {
    fn metadata(&self, identifier: &str) -> Result<DocumentMetadata, ReadError> {
        let path = self
            .resolver
            .resolve(identifier)
            .ok_or_else(|| ReadError::NotFound(PathBuf::from(identifier)))?;
        let loaded = self.reader.load(&path)?;

        let fs_meta = std::fs::metadata(&path).map_err(|source| ReadError::Inaccessible {
            path: path.clone(),
            source,
        })?;

        Ok(DocumentMetadata {
            page_count: loaded.page_count,
            size_bytes: fs_meta.len(),
            created_at: fs_meta.created().ok().map(DateTime::<Utc>::from),
            modified_at: fs_meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}
