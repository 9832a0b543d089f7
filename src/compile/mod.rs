//! Compilation facade.
//!
//! Turns a snapshot of the collection plus [`CompileOptions`] into a
//! [`MergeJob`], runs it on the blocking pool under a timeout, and reports
//! the outcome. The facade never touches the collection itself; callers pass
//! it an owned snapshot taken under the store's read lock.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstack::compile::{CompileOptions, Compiler, LopdfEngine};
//! use pdfstack::document::DocumentResolver;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let compiler = Compiler::new(
//!     Arc::new(LopdfEngine::default()),
//!     DocumentResolver::new("library"),
//!     "out",
//!     Duration::from_secs(60),
//! );
//! let snapshot = vec!["a.pdf".to_string(), "b.pdf".to_string()];
//! let outcome = compiler.compile(&snapshot, &CompileOptions::default()).await?;
//! println!("Wrote {} pages to {}", outcome.total_pages, outcome.output.display());
//! # Ok(())
//! # }
//! ```

pub mod cover;
pub mod engine;
pub mod naming;

pub use engine::{
    CompletionGate, CoverSource, EngineError, LopdfEngine, MergeEngine, MergeJob, MergeSummary,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PageRange;
use crate::document::DocumentResolver;
use crate::document::resolver::is_confined;
use crate::error::CompileError;
use crate::io::PdfReader;

/// Where cover pages are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverPlacement {
    /// One cover ahead of the whole output.
    #[default]
    Once,
    /// A cover ahead of every document.
    PerDocument,
}

/// Options controlling a compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Insert cover pages.
    #[serde(default)]
    pub use_cover_pages: bool,

    /// Free-form cover spec, see [`CoverSpec`].
    #[serde(default)]
    pub cover_pages: String,

    /// Where covers go.
    #[serde(default)]
    pub cover_placement: CoverPlacement,

    /// Output file name; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

/// Parsed form of [`CompileOptions::cover_pages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSpec {
    /// Nothing specified.
    None,
    /// Identifier of a PDF to use as the cover.
    File(String),
    /// Pages of the first document to keep.
    Pages(PageRange),
}

impl CoverSpec {
    /// Parse a cover spec.
    ///
    /// Blank means none, anything ending in `.pdf` names a cover document,
    /// everything else must be a page range such as `1-2,5`.
    pub fn parse(spec: &str) -> Result<Self, CompileError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Self::None);
        }

        if spec.to_lowercase().ends_with(".pdf") {
            return Ok(Self::File(spec.to_string()));
        }

        PageRange::parse(spec)
            .map(Self::Pages)
            .map_err(|e| CompileError::invalid_options(format!("Invalid cover pages {spec:?}: {e}")))
    }
}

/// Result of a successful compile.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Written file.
    pub output: PathBuf,

    /// Identifiers compiled, in order.
    pub files: Vec<String>,

    /// Number of documents merged.
    pub files_merged: usize,

    /// Pages in the output, covers included.
    pub total_pages: usize,

    /// Cover pages inserted.
    pub cover_pages_inserted: usize,

    /// Output size in bytes.
    pub output_size: u64,

    /// Wall time of the compile.
    pub elapsed: Duration,
}

/// Compiles collection snapshots through a merge engine.
#[derive(Clone)]
pub struct Compiler {
    engine: Arc<dyn MergeEngine>,
    resolver: DocumentResolver,
    output_dir: PathBuf,
    timeout: Duration,
}

impl Compiler {
    /// Create a compiler.
    pub fn new(
        engine: Arc<dyn MergeEngine>,
        resolver: DocumentResolver,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            resolver,
            output_dir: output_dir.into(),
            timeout,
        }
    }

    /// Compile `snapshot` in order.
    ///
    /// # Errors
    ///
    /// - [`CompileError::EmptyCollection`] for an empty snapshot
    /// - [`CompileError::InvalidOptions`] for a bad cover spec or output name
    /// - [`CompileError::Unresolved`] if a document or cover file is missing
    /// - [`CompileError::Engine`] if the engine fails
    /// - [`CompileError::Timeout`] if the engine exceeds the timeout; the
    ///   abandoned job is cancelled and leaves no output behind
    pub async fn compile(
        &self,
        snapshot: &[String],
        options: &CompileOptions,
    ) -> Result<CompileOutcome, CompileError> {
        let job = self.plan(snapshot, options)?;
        let output = job.output.clone();
        tracing::info!(
            files = snapshot.len(),
            output = %output.display(),
            cover = options.use_cover_pages,
            "Compiling collection"
        );

        let start = Instant::now();
        let gate = job.gate.clone();
        let engine = Arc::clone(&self.engine);
        let mut task = tokio::task::spawn_blocking(move || engine.merge(&job));

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) if gate.cancel() => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    output = %output.display(),
                    "Merge engine timed out"
                );
                return Err(CompileError::Timeout {
                    after: self.timeout,
                });
            }
            // The engine is already publishing; its result stands.
            Err(_) => task.await,
        };

        let summary = joined
            .map_err(|join_error| CompileError::engine(format!("Merge task failed: {join_error}")))?
            .map_err(|e| CompileError::engine(e.to_string()))?;

        let elapsed = start.elapsed();
        tracing::info!(
            pages = summary.total_pages,
            output = %summary.output.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Compile finished"
        );

        Ok(CompileOutcome {
            output: summary.output,
            files: snapshot.to_vec(),
            files_merged: summary.files_merged,
            total_pages: summary.total_pages,
            cover_pages_inserted: summary.cover_pages_inserted,
            output_size: summary.output_size,
            elapsed,
        })
    }

    /// Resolve a snapshot and options into an engine job.
    fn plan(&self, snapshot: &[String], options: &CompileOptions) -> Result<MergeJob, CompileError> {
        if snapshot.is_empty() {
            return Err(CompileError::EmptyCollection);
        }

        let spec = CoverSpec::parse(&options.cover_pages)?;

        let inputs = snapshot
            .iter()
            .map(|identifier| self.resolve_existing(identifier))
            .collect::<Result<Vec<_>, _>>()?;

        let cover = match (&spec, options.use_cover_pages) {
            (_, false) => CoverSource::None,
            (CoverSpec::File(identifier), true) => {
                if !is_confined(identifier) {
                    return Err(CompileError::invalid_options(format!(
                        "Cover file {identifier:?} is outside the library"
                    )));
                }
                CoverSource::File(self.resolve_existing(identifier)?)
            }
            (_, true) => CoverSource::TitlePage(cover::DEFAULT_COVER_TITLE.to_string()),
        };

        let first_document_pages = match spec {
            CoverSpec::Pages(range) => Some(range),
            _ => None,
        };

        let file_name = match &options.output_name {
            Some(name) => naming::output_file_name(name)?,
            None => format!("{}.pdf", naming::generate_output_name()),
        };

        Ok(MergeJob {
            inputs,
            cover,
            placement: options.cover_placement,
            first_document_pages,
            output: self.output_dir.join(file_name),
            gate: CompletionGate::new(),
        })
    }

    fn resolve_existing(&self, identifier: &str) -> Result<PathBuf, CompileError> {
        let unresolved = |path: PathBuf| CompileError::Unresolved {
            identifier: identifier.to_string(),
            path,
        };

        let path = self
            .resolver
            .resolve(identifier)
            .ok_or_else(|| unresolved(PathBuf::from(identifier)))?;
        PdfReader::check_path_exists(&path).map_err(|_| unresolved(path.clone()))?;
        Ok(path)
    }
}
