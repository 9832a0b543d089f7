//! Collection store.
//!
//! Owns the ordered list of selected identifiers and the set of identifiers
//! known to the session. Every mutation takes the write lock for its whole
//! check-and-modify sequence, so concurrent requests can never produce a
//! duplicate or a partially shifted list.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::document::resolver::is_confined;
use crate::document::{DocumentMetadata, MetadataProvider};
use crate::error::CollectionError;

type Result<T> = std::result::Result<T, CollectionError>;

#[derive(Debug, Default)]
struct StoreState {
    /// Compile order.
    selected: Vec<String>,
    /// Identifiers found by the last library scan.
    scanned: BTreeSet<String>,
    /// Identifiers ever added during this session.
    added: BTreeSet<String>,
}

impl StoreState {
    fn is_known(&self, identifier: &str) -> bool {
        self.scanned.contains(identifier)
            || self.added.contains(identifier)
            || self.selected.iter().any(|id| id == identifier)
    }
}

/// Ordered, duplicate-free list of document identifiers.
pub struct CollectionStore {
    state: RwLock<StoreState>,
    provider: Arc<dyn MetadataProvider>,
}

impl CollectionStore {
    /// Create an empty store that looks up metadata through `provider`.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            provider,
        }
    }

    /// Append `identifier` to the collection.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidIdentifier`] for an empty name
    /// - [`CollectionError::Duplicate`] if it is already selected
    pub async fn add(&self, identifier: &str) -> Result<Vec<String>> {
        validate_identifier(identifier)?;

        let mut state = self.state.write().await;
        if state.selected.iter().any(|id| id == identifier) {
            return Err(CollectionError::Duplicate(identifier.to_string()));
        }

        state.selected.push(identifier.to_string());
        state.added.insert(identifier.to_string());
        tracing::debug!(identifier, len = state.selected.len(), "Document added");

        Ok(state.selected.clone())
    }

    /// Remove `identifier`, preserving the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::NotFound`] if it is not selected.
    pub async fn remove(&self, identifier: &str) -> Result<Vec<String>> {
        let mut state = self.state.write().await;
        let position = state
            .selected
            .iter()
            .position(|id| id == identifier)
            .ok_or_else(|| CollectionError::NotFound(identifier.to_string()))?;

        state.selected.remove(position);
        tracing::debug!(identifier, len = state.selected.len(), "Document removed");

        Ok(state.selected.clone())
    }

    /// Move the element at `old_index` to `new_index`.
    ///
    /// Intervening elements shift by one; this is not a swap. Both indices
    /// are checked before anything moves.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Index`] naming the first invalid index.
    pub async fn reorder(&self, old_index: usize, new_index: usize) -> Result<Vec<String>> {
        let mut state = self.state.write().await;
        let len = state.selected.len();

        for index in [old_index, new_index] {
            if index >= len {
                return Err(CollectionError::Index { index, len });
            }
        }

        if old_index != new_index {
            let moved = state.selected.remove(old_index);
            state.selected.insert(new_index, moved);
            tracing::debug!(old_index, new_index, "Collection reordered");
        }

        Ok(state.selected.clone())
    }

    /// Current order.
    pub async fn list(&self) -> Vec<String> {
        self.state.read().await.selected.clone()
    }

    /// Whether `identifier` is selected.
    pub async fn contains(&self, identifier: &str) -> bool {
        self.state
            .read()
            .await
            .selected
            .iter()
            .any(|id| id == identifier)
    }

    /// Number of selected documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.selected.len()
    }

    /// Whether nothing is selected.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.selected.is_empty()
    }

    /// Deselect everything. Known identifiers stay known.
    pub async fn clear(&self) {
        self.state.write().await.selected.clear();
    }

    /// Append every identifier not already selected, in order.
    ///
    /// Returns `(added, skipped)`. Runs under a single write lock so the
    /// batch is applied as a unit.
    pub(crate) async fn extend_skipping_duplicates(
        &self,
        identifiers: &[String],
        replace: bool,
    ) -> (Vec<String>, Vec<String>) {
        let mut state = self.state.write().await;
        if replace {
            state.selected.clear();
        }

        let mut added = Vec::new();
        let mut skipped = Vec::new();
        for identifier in identifiers {
            if state.selected.contains(identifier) {
                skipped.push(identifier.clone());
            } else {
                state.selected.push(identifier.clone());
                state.added.insert(identifier.clone());
                added.push(identifier.clone());
            }
        }

        (added, skipped)
    }

    /// All identifiers known to the session, sorted.
    pub async fn available(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .scanned
            .union(&state.added)
            .cloned()
            .chain(state.selected.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Replace the scanned part of the known identifiers.
    pub async fn register_available<I>(&self, identifiers: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.state.write().await;
        state.scanned = identifiers.into_iter().collect();
    }

    /// Metadata for a known document.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::NotFound`] if the identifier is unknown or the
    ///   file behind it no longer exists
    /// - [`CollectionError::Metadata`] for any other provider failure
    pub async fn metadata(&self, identifier: &str) -> Result<DocumentMetadata> {
        if !self.state.read().await.is_known(identifier) {
            return Err(CollectionError::NotFound(identifier.to_string()));
        }

        let provider = Arc::clone(&self.provider);
        let owned = identifier.to_string();
        let result = tokio::task::spawn_blocking(move || provider.metadata(&owned))
            .await
            .map_err(|e| CollectionError::Metadata {
                identifier: identifier.to_string(),
                reason: format!("Metadata task failed: {e}"),
            })?;

        result.map_err(|err| {
            if err.is_missing() {
                CollectionError::NotFound(identifier.to_string())
            } else {
                CollectionError::Metadata {
                    identifier: identifier.to_string(),
                    reason: err.to_string(),
                }
            }
        })
    }
}

/// Reject identifiers that can never name a library document.
///
/// Empty names and names that would resolve outside the library root are
/// invalid.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() || !is_confined(identifier) {
        return Err(CollectionError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}
