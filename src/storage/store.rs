//! The durable store seam used by the persistence engine.
//!
//! A store keeps, per identifier, the append-only list of snapshots in commit
//! order. Writes arrive as `CommitBatch`es that are applied all-or-nothing.

use std::collections::HashSet;

use super::errors::{StorageError, StorageResult};
use crate::temporal::{TemporalSnapshot, TemporalStructure};

/// A set of snapshots for one identifier, committed as a unit.
///
/// `expected_len` is the number of snapshots the writer observed for the
/// identifier when it planned the batch. A store rejects the batch with a
/// conflict if its history has a different length.
#[derive(Debug, Clone)]
pub struct CommitBatch<S: TemporalStructure> {
    id: S::Id,
    expected_len: usize,
    snapshots: Vec<TemporalSnapshot<S>>,
}

impl<S: TemporalStructure> CommitBatch<S> {
    pub fn new(id: S::Id, expected_len: usize, snapshots: Vec<TemporalSnapshot<S>>) -> Self {
        Self {
            id,
            expected_len,
            snapshots,
        }
    }

    pub fn id(&self) -> &S::Id {
        &self.id
    }

    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    pub fn snapshots(&self) -> &[TemporalSnapshot<S>] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn into_snapshots(self) -> Vec<TemporalSnapshot<S>> {
        self.snapshots
    }
}

/// Durable, append-only snapshot storage.
pub trait SnapshotStore<S: TemporalStructure>: Send + Sync {
    /// Returns every snapshot of `id` in commit order. Unknown ids yield an empty list.
    fn load(&self, id: &S::Id) -> StorageResult<Vec<TemporalSnapshot<S>>>;

    /// Applies the batch atomically, or not at all.
    fn commit(&self, batch: CommitBatch<S>) -> StorageResult<()>;

    /// Returns every identifier with at least one snapshot.
    fn identifiers(&self) -> StorageResult<Vec<S::Id>>;
}

/// Checks a batch against the stored history of its identifier.
///
/// Rejects:
/// - a stale `expected_len` (another writer committed in between)
/// - a snapshot whose identifier differs from the batch identifier
/// - `(version, revision)` coordinates already stored or repeated in the batch
pub fn validate_batch<S: TemporalStructure>(
    existing: &[TemporalSnapshot<S>],
    batch: &CommitBatch<S>,
) -> StorageResult<()> {
    if existing.len() != batch.expected_len() {
        return Err(StorageError::conflict(format!(
            "Stale history for '{}': expected {} snapshots, found {}",
            batch.id(),
            batch.expected_len(),
            existing.len()
        )));
    }

    let mut taken: HashSet<(u32, u32)> = existing
        .iter()
        .map(|s| (s.version(), s.revision()))
        .collect();

    for snapshot in batch.snapshots() {
        if snapshot.identifier() != batch.id() {
            return Err(StorageError::conflict(format!(
                "Snapshot for '{}' in batch for '{}'",
                snapshot.identifier(),
                batch.id()
            )));
        }
        if !taken.insert((snapshot.version(), snapshot.revision())) {
            return Err(StorageError::conflict(format!(
                "Duplicate coordinates v{}.r{} for '{}'",
                snapshot.version(),
                snapshot.revision(),
                batch.id()
            )));
        }
    }

    Ok(())
}
