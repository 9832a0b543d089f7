//! Error types for pdfstack.
//!
//! Errors are grouped by the layer that raises them:
//!
//! - **Collection errors**: duplicate, unknown or out-of-range documents
//! - **Compile errors**: empty collections, unresolvable documents, engine
//!   failures and timeouts
//! - **Report errors**: unreadable or unsupported saved reports
//! - **Configuration errors**: invalid server or CLI settings
//!
//! [`Error`] wraps all of them and maps each kind to a process exit code.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for pdfstack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the collection store.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// The document is already part of the collection.
    #[error("Document already in collection: {0}")]
    Duplicate(String),

    /// The document is not known to the collection.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A reorder index does not address an element of the collection.
    #[error("Index {index} is out of range for a collection of {len} document(s)")]
    Index {
        /// Offending index.
        index: usize,
        /// Collection length at the time of the call.
        len: usize,
    },

    /// The identifier is empty or whitespace only.
    #[error("Invalid document name: {0:?}")]
    InvalidIdentifier(String),

    /// The metadata provider failed for a known document.
    #[error("Failed to read metadata for {identifier}\n  Reason: {reason}")]
    Metadata {
        /// Document identifier.
        identifier: String,
        /// Provider failure.
        reason: String,
    },
}

/// Failures raised while compiling a collection.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Nothing to compile.
    #[error("No PDF files to compile")]
    EmptyCollection,

    /// An identifier does not resolve to a readable file.
    #[error("Cannot resolve document {identifier} (looked for {})", .path.display())]
    Unresolved {
        /// Identifier from the collection.
        identifier: String,
        /// Path the identifier resolved to.
        path: PathBuf,
    },

    /// The compile options cannot be applied.
    #[error("Invalid compile options: {message}")]
    InvalidOptions {
        /// Description of the problem.
        message: String,
    },

    /// The merge engine reported a failure.
    #[error("Merge engine failed: {reason}")]
    Engine {
        /// Engine message.
        reason: String,
    },

    /// The merge engine did not finish within the configured bound.
    #[error("Compilation timed out after {}s", .after.as_secs_f64())]
    Timeout {
        /// Configured bound.
        after: Duration,
    },
}

/// Failures raised while reading or applying a saved report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report was written by a newer version of pdfstack.
    #[error("Unsupported report version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version found in the report.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },

    /// The report lists an identifier that can never be added.
    #[error("Report contains an invalid document name at position {position}")]
    InvalidIdentifier {
        /// Zero-based position within `pdfs`.
        position: usize,
    },

    /// The report file could not be read or written.
    #[error("Failed to access report file: {}\n  Reason: {source}", .path.display())]
    Io {
        /// Report path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The report is not valid JSON for the expected layout.
    #[error("Malformed report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Collection store failure.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Compilation failure.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Report failure.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Collection(CollectionError::NotFound(_)) => 2,
            Self::Collection(_) => 1,
            Self::Compile(CompileError::EmptyCollection) => 1,
            Self::Compile(CompileError::Unresolved { .. }) => 2,
            Self::Compile(CompileError::InvalidOptions { .. }) => 1,
            Self::Compile(CompileError::Engine { .. }) => 6,
            Self::Compile(CompileError::Timeout { .. }) => 7,
            Self::Report(ReportError::Io { .. }) => 2,
            Self::Report(_) => 3,
            Self::InvalidConfig { .. } => 1,
            Self::Io(_) => 5,
        }
    }
}

impl CompileError {
    /// Create an Engine error.
    pub fn engine(reason: impl Into<String>) -> Self {
        Self::Engine {
            reason: reason.into(),
        }
    }

    /// Create an InvalidOptions error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }
}
