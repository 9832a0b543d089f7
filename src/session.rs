//! Per-session state.
//!
//! A [`Session`] owns the collection store, the current compile options and
//! the compiler. It is shared by handle (`Arc<Session>`) between request
//! handlers; there is no process-wide collection.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::collection::CollectionStore;
use crate::compile::{CompileOptions, CompileOutcome, Compiler, LopdfEngine, MergeEngine};
use crate::config::Config;
use crate::document::{
    DocumentMetadata, DocumentResolver, FsMetadataProvider, LibraryScanner, MetadataProvider,
};
use crate::error::{CompileError, Error, ReportError, Result};
use crate::report::{LoadMode, LoadSummary, Report};

/// Metadata lookups in flight at once for [`Session::describe_collection`].
const METADATA_CONCURRENCY: usize = 8;

/// One entry of [`Session::describe_collection`].
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetails {
    /// Document identifier.
    pub name: String,
    /// Metadata, when the lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    /// Why the lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collection, options and compiler for one client session.
pub struct Session {
    store: CollectionStore,
    options: RwLock<CompileOptions>,
    compiler: Compiler,
    scanner: Option<LibraryScanner>,
}

impl Session {
    /// Assemble a session from its parts.
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        compiler: Compiler,
        scanner: Option<LibraryScanner>,
    ) -> Self {
        Self {
            store: CollectionStore::new(provider),
            options: RwLock::new(CompileOptions::default()),
            compiler,
            scanner,
        }
    }

    /// Build a session backed by the filesystem and the lopdf engine.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_engine(config, Arc::new(LopdfEngine::new(config.compression)))
    }

    /// Like [`Session::from_config`] with a custom merge engine.
    pub fn with_engine(config: &Config, engine: Arc<dyn MergeEngine>) -> Result<Self> {
        let resolver = DocumentResolver::new(&config.library_dir);
        let scanner = LibraryScanner::new(&config.library_dir, &config.include)
            .map_err(|e| Error::invalid_config(format!("Invalid include pattern: {e}")))?
            .excluding(&config.output_dir);
        let compiler = Compiler::new(
            engine,
            resolver.clone(),
            &config.output_dir,
            config.compile_timeout,
        );

        Ok(Self::new(
            Arc::new(FsMetadataProvider::new(resolver)),
            compiler,
            Some(scanner),
        ))
    }

    /// The collection store.
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Current compile options.
    pub async fn options(&self) -> CompileOptions {
        self.options.read().await.clone()
    }

    /// Replace the compile options.
    pub async fn set_options(&self, options: CompileOptions) {
        *self.options.write().await = options;
    }

    /// Compile the current collection.
    ///
    /// The order is snapshotted first, so mutations made while the engine
    /// runs do not affect this compile.
    pub async fn compile(&self, options: &CompileOptions) -> std::result::Result<CompileOutcome, CompileError> {
        let snapshot = self.store.list().await;
        self.compiler.compile(&snapshot, options).await
    }

    /// Compile with the stored options.
    pub async fn compile_current(&self) -> std::result::Result<CompileOutcome, CompileError> {
        let options = self.options().await;
        self.compile(&options).await
    }

    /// Capture the collection and options as a report.
    pub async fn save_report(&self) -> Report {
        let pdfs = self.store.list().await;
        let options = self.options.read().await;
        Report::capture(pdfs, &options)
    }

    /// Apply a report to this session.
    ///
    /// Duplicates are skipped and listed in the summary. The report is
    /// validated before anything changes.
    pub async fn load_report(
        &self,
        report: &Report,
        mode: LoadMode,
    ) -> std::result::Result<LoadSummary, ReportError> {
        let summary = report.apply(&self.store, mode).await?;

        let mut options = self.options.write().await;
        let output_name = options.output_name.take();
        *options = CompileOptions {
            output_name,
            ..report.options()
        };

        tracing::info!(
            ?mode,
            added = summary.added.len(),
            skipped = summary.skipped.len(),
            "Report loaded"
        );
        Ok(summary)
    }

    /// Rescan the library and return the available identifiers.
    pub async fn refresh_library(&self) -> Result<Vec<String>> {
        if let Some(scanner) = &self.scanner {
            let scanner = scanner.clone();
            let found = tokio::task::spawn_blocking(move || scanner.scan())
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))?;
            tracing::info!(documents = found.len(), "Library scanned");
            self.store.register_available(found).await;
        }
        Ok(self.store.available().await)
    }

    /// Metadata for every document in the collection, in order.
    ///
    /// Lookups run concurrently; a failing document carries its error
    /// instead of failing the whole call.
    pub async fn describe_collection(&self) -> Vec<DocumentDetails> {
        let names = self.store.list().await;
        stream::iter(names)
            .map(|name| async move {
                match self.store.metadata(&name).await {
                    Ok(metadata) => DocumentDetails {
                        name,
                        metadata: Some(metadata),
                        error: None,
                    },
                    Err(e) => DocumentDetails {
                        name,
                        metadata: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .buffered(METADATA_CONCURRENCY)
            .collect()
            .await
    }
}
