//! The ordered collection of documents selected for compilation.

pub mod store;

pub use store::CollectionStore;
