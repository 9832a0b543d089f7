//! Identifier to path resolution.
//!
//! Identifiers are relative paths below the library root. Anything that
//! could leave the root (absolute paths, drive prefixes, `..`) is refused.

use std::path::{Component, Path, PathBuf};

/// Resolves document identifiers against a library root.
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    root: PathBuf,
}

impl DocumentResolver {
    /// Create a resolver rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Library root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an identifier refers to, or `None` if it would escape the root.
    pub fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        is_confined(identifier).then(|| self.root.join(identifier))
    }
}

/// Whether `identifier` stays below whatever root it is joined to.
pub fn is_confined(identifier: &str) -> bool {
    Path::new(identifier)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
