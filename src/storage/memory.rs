//! In-memory snapshot store
//!
//! Holds every history behind a single `RwLock`, so a commit becomes visible
//! to readers in one step.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::errors::StorageResult;
use super::store::{validate_batch, CommitBatch, SnapshotStore};
use crate::temporal::{TemporalSnapshot, TemporalStructure};

/// Volatile store, suitable for tests and embedding.
#[derive(Debug)]
pub struct MemoryStore<S: TemporalStructure> {
    histories: RwLock<HashMap<S::Id, Vec<TemporalSnapshot<S>>>>,
}

impl<S: TemporalStructure> MemoryStore<S> {
    pub fn new() -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored snapshots across all identifiers.
    pub fn snapshot_count(&self) -> usize {
        self.histories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl<S: TemporalStructure> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SnapshotStore<S> for MemoryStore<S>
where
    S: TemporalStructure + Send + Sync,
{
    fn load(&self, id: &S::Id) -> StorageResult<Vec<TemporalSnapshot<S>>> {
        let histories = self.histories.read().unwrap_or_else(PoisonError::into_inner);
        Ok(histories.get(id).cloned().unwrap_or_default())
    }

    fn commit(&self, batch: CommitBatch<S>) -> StorageResult<()> {
        let mut histories = self.histories.write().unwrap_or_else(PoisonError::into_inner);

        let existing = histories.get(batch.id()).map(Vec::as_slice).unwrap_or(&[]);
        validate_batch(existing, &batch)?;

        if batch.is_empty() {
            return Ok(());
        }

        let id = batch.id().clone();
        histories
            .entry(id)
            .or_default()
            .extend(batch.into_snapshots());
        Ok(())
    }

    fn identifiers(&self) -> StorageResult<Vec<S::Id>> {
        let histories = self.histories.read().unwrap_or_else(PoisonError::into_inner);
        Ok(histories.keys().cloned().collect())
    }
}
