//! PDF input/output operations.
//!
//! Reading is used by the metadata provider and the merge engine; writing
//! is used by the merge engine to place compiled output on disk.

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, StagedWrite, WriteOptions, WriteStatistics};
