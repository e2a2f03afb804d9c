//! File-backed snapshot store
//!
//! The durable state is the snapshot log (`<data_dir>/data/snapshots.dat`);
//! the in-memory index is rebuilt from it on every open.
//!
//! Commit protocol:
//! 1. Take the writer lock (commits are serialized across identifiers)
//! 2. Validate the batch against the indexed history
//! 3. Append the batch as one checksummed frame and fsync
//! 4. Publish the snapshots to the index
//!
//! Readers only touch the index, so they observe a batch entirely or not at all.
//! After a partial commit the writer is halted: every later batch fails with
//! `TEMPORAL_STORAGE_PARTIAL_COMMIT` at step 1 and the log is not touched.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{StorageError, StorageResult};
use super::reader::LogReader;
use super::record::{encode_frame, BatchRecord};
use super::store::{validate_batch, CommitBatch, SnapshotStore};
use super::writer::{log_path, LogWriter};
use crate::observability::{log_event_with_fields, Event};
use crate::temporal::{TemporalSnapshot, TemporalStructure};

type Histories<S> = HashMap<<S as crate::temporal::HasIdentifier>::Id, Vec<TemporalSnapshot<S>>>;

/// Durable store over an append-only, checksummed log.
pub struct FileStore<S: TemporalStructure> {
    data_dir: PathBuf,
    writer: Mutex<LogWriter>,
    index: RwLock<Histories<S>>,
    _structure: PhantomData<fn() -> S>,
}

impl<S> FileStore<S>
where
    S: TemporalStructure + Serialize + DeserializeOwned,
    S::Id: Serialize + DeserializeOwned,
{
    /// Opens (or creates) the store under `data_dir` and replays the log.
    ///
    /// # Errors
    ///
    /// `TEMPORAL_DATA_CORRUPTION` if any frame fails validation or decodes to
    /// an inconsistent history. The store never opens over a damaged log.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let writer = LogWriter::open(data_dir)?;
        let index = Self::replay(&log_path(data_dir))?;

        let dir = data_dir.display().to_string();
        let identifiers = index.len().to_string();
        let snapshots = index.values().map(Vec::len).sum::<usize>().to_string();
        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("data_dir", dir.as_str()),
                ("identifiers", identifiers.as_str()),
                ("snapshots", snapshots.as_str()),
            ],
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            writer: Mutex::new(writer),
            index: RwLock::new(index),
            _structure: PhantomData,
        })
    }

    /// Rebuilds the index by replaying every frame in log order.
    fn replay(path: &Path) -> StorageResult<Histories<S>> {
        let mut index: Histories<S> = HashMap::new();
        let mut reader = LogReader::open(path)?;

        loop {
            let offset = reader.current_offset();
            let body = match reader.read_next() {
                Ok(Some(body)) => body,
                Ok(None) => break,
                Err(e) => {
                    let at = offset.to_string();
                    log_event_with_fields(
                        Event::StoreCorruption,
                        &[("offset", at.as_str()), ("reason", e.message())],
                    );
                    return Err(e);
                }
            };

            let record: BatchRecord<S::Id, S> = serde_json::from_slice(&body).map_err(|e| {
                StorageError::corruption_at_offset(offset, format!("Undecodable batch: {}", e))
            })?;

            let id = record.id.clone();
            let snapshots = record.into_snapshots();
            let history = index.entry(id.clone()).or_default();

            let replayed = CommitBatch::new(id, history.len(), snapshots);
            validate_batch(history, &replayed).map_err(|e| {
                StorageError::corruption_at_offset(
                    offset,
                    format!("Inconsistent batch: {}", e.message()),
                )
            })?;
            history.extend(replayed.into_snapshots());
        }

        Ok(index)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Current size of the log in bytes.
    pub fn log_size(&self) -> u64 {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current_offset()
    }
}

impl<S> SnapshotStore<S> for FileStore<S>
where
    S: TemporalStructure + Serialize + DeserializeOwned + Send + Sync,
    S::Id: Serialize + DeserializeOwned,
{
    fn load(&self, id: &S::Id) -> StorageResult<Vec<TemporalSnapshot<S>>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.get(id).cloned().unwrap_or_default())
    }

    fn commit(&self, batch: CommitBatch<S>) -> StorageResult<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(offset) = writer.torn_at() {
            return Err(StorageError::halted(offset));
        }

        {
            let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
            let existing = index.get(batch.id()).map(Vec::as_slice).unwrap_or(&[]);
            validate_batch(existing, &batch)?;
        }

        if batch.is_empty() {
            return Ok(());
        }

        let record = BatchRecord::from_snapshots(batch.id(), batch.snapshots());
        let body = serde_json::to_vec(&record)?;
        let frame = encode_frame(&body)?;
        writer.append(&frame)?;

        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let id = batch.id().clone();
        index.entry(id).or_default().extend(batch.into_snapshots());
        Ok(())
    }

    fn identifiers(&self) -> StorageResult<Vec<S::Id>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Ok(index.keys().cloned().collect())
    }
}
