//! Library discovery.
//!
//! Walks the library root and reports every file whose relative path
//! matches one of the include patterns. Identifiers use `/` separators on
//! every platform.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Scans a directory tree for documents.
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    root: PathBuf,
    matcher: GlobSet,
    excluded: Vec<PathBuf>,
}

impl LibraryScanner {
    /// Create a scanner for `root` matching case-insensitive `patterns`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new<P>(root: impl Into<PathBuf>, patterns: P) -> Result<Self, globset::Error>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(
                GlobBuilder::new(pattern.as_ref())
                    .case_insensitive(true)
                    .build()?,
            );
        }

        Ok(Self {
            root: root.into(),
            matcher: builder.build()?,
            excluded: Vec::new(),
        })
    }

    /// Skip everything below `dir`, such as the compile output directory.
    ///
    /// Excluding the root itself has no effect.
    pub fn excluding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    /// Identifiers of all matching files, sorted.
    ///
    /// Unreadable entries are logged and skipped.
    pub fn scan(&self) -> Vec<String> {
        let mut found = Vec::new();
        let excluded: Vec<PathBuf> = self
            .excluded
            .iter()
            .filter_map(|dir| dir.canonicalize().ok())
            .collect();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .path()
                        .canonicalize()
                        .is_ok_and(|dir| excluded.contains(&dir))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable library entry: {err}");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            if self.matcher.is_match(relative) {
                let identifier = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                found.push(identifier);
            }
        }

        found.sort();
        tracing::debug!(root = %self.root.display(), count = found.len(), "Library scanned");
        found
    }
}
