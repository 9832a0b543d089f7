//! pdfstack - manage an ordered stack of PDF documents and compile it into
//! a single file.
//!
//! The library holds the core: a [`collection::CollectionStore`] for the
//! ordered selection, a [`compile::Compiler`] facade in front of a pluggable
//! [`compile::MergeEngine`], [`report::Report`] persistence, and a
//! [`session::Session`] tying them together. The [`server`] module exposes a
//! session over HTTP.

pub mod cli;
pub mod collection;
pub mod compile;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod report;
pub mod server;
pub mod session;
pub(crate) mod utils;

pub use error::{Error, Result};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
