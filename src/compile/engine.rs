//! Merge engines.
//!
//! The compile facade hands a fully resolved [`MergeJob`] to a
//! [`MergeEngine`]. Engines are synchronous and run on the blocking pool.
//! [`LopdfEngine`] is the bundled implementation.

use lopdf::{Document, Object, ObjectId};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::compile::CoverPlacement;
use crate::compile::cover::title_page;
use crate::config::{CompressionLevel, PageRange};
use crate::io::reader::ReadError;
use crate::io::{PdfReader, PdfWriter, WriteOptions};

/// Where the cover page(s) come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    /// No cover.
    None,
    /// A generated page carrying this title.
    TitlePage(String),
    /// Every page of an existing PDF.
    File(PathBuf),
}

/// A fully resolved merge request.
#[derive(Debug, Clone)]
pub struct MergeJob {
    /// Input files in output order.
    pub inputs: Vec<PathBuf>,

    /// Cover to insert.
    pub cover: CoverSource,

    /// Where covers go.
    pub placement: CoverPlacement,

    /// Pages of the first input to keep; all pages when `None`.
    pub first_document_pages: Option<PageRange>,

    /// Destination file.
    pub output: PathBuf,

    /// Permission to publish the output.
    pub gate: CompletionGate,
}

/// Decides whether a merge may publish its output.
///
/// The caller cancels the gate when it stops waiting for the job. Engines
/// publish only through [`CompletionGate::commit`], so a job cancelled before
/// that point leaves nothing at the output path, and one that already
/// committed is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CompletionGate {
    state: Arc<Mutex<GateState>>,
}

#[derive(Debug, Default, PartialEq, Eq)]
enum GateState {
    #[default]
    Open,
    Committed,
    Cancelled,
}

impl CompletionGate {
    /// An open gate.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the caller gave up on the job.
    pub fn is_cancelled(&self) -> bool {
        *self.state() == GateState::Cancelled
    }

    /// Cancel the job unless it already committed.
    ///
    /// Returns `false` when the job won the race; its result stands.
    pub fn cancel(&self) -> bool {
        let mut state = self.state();
        if *state == GateState::Committed {
            return false;
        }
        *state = GateState::Cancelled;
        true
    }

    /// Run `publish` unless the job was cancelled.
    ///
    /// The gate stays locked while `publish` runs, so a concurrent
    /// [`CompletionGate::cancel`] observes either nothing or the commit.
    pub fn commit<T>(&self, publish: impl FnOnce() -> T) -> Option<T> {
        let mut state = self.state();
        if *state == GateState::Cancelled {
            return None;
        }
        *state = GateState::Committed;
        Some(publish())
    }
}

/// What a successful merge produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    /// Written file.
    pub output: PathBuf,

    /// Number of input documents merged.
    pub files_merged: usize,

    /// Pages in the output, covers included.
    pub total_pages: usize,

    /// Cover pages inserted.
    pub cover_pages_inserted: usize,

    /// Output size in bytes.
    pub output_size: u64,
}

/// Merge engine failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An input or cover could not be loaded.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// lopdf failed while building or merging.
    #[error("PDF processing failed: {0}")]
    Pdf(#[from] lopdf::Error),

    /// The page selection kept nothing.
    #[error("Page selection keeps no pages of a {total_pages}-page document")]
    EmptySelection {
        /// Pages in the first document.
        total_pages: usize,
    },

    /// The page tree has an unexpected shape.
    #[error("Malformed page tree: {0}")]
    Structure(String),

    /// The job was cancelled before its output was published.
    #[error("Merge cancelled before the output was written")]
    Cancelled,

    /// The output could not be written.
    #[error("Failed to write output file: {}\n  Reason: {source}", .path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Produces one output file from an ordered list of inputs.
pub trait MergeEngine: Send + Sync {
    /// Run `job` to completion.
    fn merge(&self, job: &MergeJob) -> Result<MergeSummary, EngineError>;
}

/// Merge engine built on lopdf.
#[derive(Debug, Clone, Default)]
pub struct LopdfEngine {
    reader: PdfReader,
    writer: PdfWriter,
}

impl LopdfEngine {
    /// Create an engine writing with the given compression.
    pub fn new(compression: CompressionLevel) -> Self {
        Self {
            reader: PdfReader::new(),
            writer: PdfWriter::with_options(WriteOptions {
                compression,
                ..WriteOptions::default()
            }),
        }
    }
}

impl MergeEngine for LopdfEngine {
    fn merge(&self, job: &MergeJob) -> Result<MergeSummary, EngineError> {
        if job.gate.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let mut documents: Vec<Document> = self
            .reader
            .load_all(&job.inputs)?
            .into_iter()
            .map(|loaded| loaded.document)
            .collect();

        if let (Some(range), Some(first)) = (&job.first_document_pages, documents.first_mut()) {
            select_pages(first, range)?;
        }

        let cover = match &job.cover {
            CoverSource::None => None,
            CoverSource::TitlePage(title) => Some(title_page(title)?),
            CoverSource::File(path) => Some(self.reader.load(path)?.document),
        };

        let files_merged = documents.len();
        let mut cover_pages_inserted = 0;
        let sequence = match cover {
            None => documents,
            Some(cover) => {
                let cover_len = cover.get_pages().len();
                match job.placement {
                    CoverPlacement::Once => {
                        cover_pages_inserted = cover_len;
                        std::iter::once(cover).chain(documents).collect()
                    }
                    CoverPlacement::PerDocument => {
                        cover_pages_inserted = cover_len * documents.len();
                        documents
                            .into_iter()
                            .flat_map(|doc| [cover.clone(), doc])
                            .collect()
                    }
                }
            }
        };

        let mut merged = concatenate(sequence)?;
        let total_pages = merged.get_pages().len();
        tracing::debug!(
            files_merged,
            total_pages,
            cover_pages_inserted,
            output = %job.output.display(),
            "Writing merged document"
        );

        let write_error = |source: io::Error| EngineError::Write {
            path: job.output.clone(),
            source,
        };
        let staged = self
            .writer
            .stage(&mut merged, &job.output)
            .map_err(write_error)?;
        let stats = job
            .gate
            .commit(|| staged.commit())
            .ok_or(EngineError::Cancelled)?
            .map_err(write_error)?;

        Ok(MergeSummary {
            output: stats.output_path,
            files_merged,
            total_pages,
            cover_pages_inserted,
            output_size: stats.file_size,
        })
    }
}

/// Keep only the pages of `doc` selected by `range`.
fn select_pages(doc: &mut Document, range: &PageRange) -> Result<(), EngineError> {
    let total_pages = doc.get_pages().len();
    let keep = range.to_pages(total_pages as u32);
    if keep.is_empty() {
        return Err(EngineError::EmptySelection { total_pages });
    }

    let drop: Vec<u32> = (1..=total_pages as u32)
        .filter(|page| !range.contains(*page))
        .collect();
    if drop.is_empty() {
        return Ok(());
    }

    doc.delete_pages(&drop);
    doc.prune_objects();

    let remaining = doc.get_pages().len();
    if remaining != keep.len() {
        return Err(EngineError::Structure(format!(
            "expected {} pages after selection, found {remaining}",
            keep.len()
        )));
    }

    Ok(())
}

/// Append the page trees of all documents onto the first one.
fn concatenate(documents: Vec<Document>) -> Result<Document, EngineError> {
    let mut documents = documents.into_iter();
    let mut merged = documents
        .next()
        .ok_or_else(|| EngineError::Structure("nothing to merge".to_string()))?;
    let mut max_id = merged.max_id;

    for mut doc in documents {
        // Shift IDs past everything already merged
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        merged.objects.extend(doc.objects);
        add_pages_to_tree(&mut merged, &page_ids)?;
    }

    merged.max_id = max_id;
    Ok(merged)
}

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on page tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Add pages to the root page tree node of `merged`.
fn add_pages_to_tree(merged: &mut Document, page_ids: &[ObjectId]) -> Result<(), EngineError> {
    let pages_id = merged
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| EngineError::Structure(format!("Failed to get pages reference: {e}")))?;

    for &page_id in page_ids {
        adopt_page(merged, page_id, pages_id)?;
    }

    let Object::Dictionary(dict) = merged
        .get_object_mut(pages_id)
        .map_err(|e| EngineError::Structure(format!("Failed to get pages object: {e}")))?
    else {
        return Err(EngineError::Structure(
            "Pages object is not a dictionary".to_string(),
        ));
    };

    match dict.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.extend(page_ids.iter().map(|&id| Object::Reference(id))),
        _ => {
            return Err(EngineError::Structure(
                "Pages dictionary missing Kids array".to_string(),
            ));
        }
    }

    let current_count = dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

    Ok(())
}

/// Re-parent a page under `new_parent`, copying down the attributes it
/// used to inherit from its old ancestors.
fn adopt_page(doc: &mut Document, page_id: ObjectId, new_parent: ObjectId) -> Result<(), EngineError> {
    let mut inherited = Vec::new();
    {
        let page = doc.get_object(page_id).and_then(Object::as_dict)?;
        let mut missing: Vec<&[u8]> = INHERITABLE
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

        for _ in 0..MAX_TREE_DEPTH {
            let Some(parent_id) = parent else { break };
            if missing.is_empty() {
                break;
            }

            let node = doc.get_object(parent_id).and_then(Object::as_dict)?;
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }

    let page = doc.get_object_mut(page_id).and_then(Object::as_dict_mut)?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    page.set("Parent", Object::Reference(new_parent));

    Ok(())
}
