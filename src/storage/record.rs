//! Snapshot log record format
//!
//! Every committed batch is written as exactly one frame:
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes this field and the checksum)
//! +------------------+
//! | Batch Body       | (JSON-encoded BatchRecord)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + body)
//! +------------------+
//! ```
//!
//! One frame per batch makes a batch all-or-nothing on disk: a torn frame
//! fails its checksum and is never partially replayed.

use serde::{Deserialize, Serialize};

use super::checksum::frame_checksum;
use super::errors::{StorageError, StorageResult};
use crate::temporal::{TemporalContext, TemporalSnapshot, TemporalStructure};

/// Bytes of framing around a body: length prefix + checksum.
pub const FRAME_OVERHEAD: usize = 8;

/// The persisted form of one snapshot. The handle is derived on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord<S> {
    pub context: TemporalContext,
    pub structure: S,
}

/// The persisted form of one committed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord<Id, S> {
    pub id: Id,
    pub snapshots: Vec<SnapshotRecord<S>>,
}

impl<S: TemporalStructure> BatchRecord<S::Id, S> {
    /// Builds the persisted form of a batch.
    pub fn from_snapshots(id: &S::Id, snapshots: &[TemporalSnapshot<S>]) -> Self {
        Self {
            id: id.clone(),
            snapshots: snapshots
                .iter()
                .map(|s| SnapshotRecord {
                    context: s.context().clone(),
                    structure: s.structure().clone(),
                })
                .collect(),
        }
    }

    /// Rebuilds the snapshots, re-deriving their handles.
    pub fn into_snapshots(self) -> Vec<TemporalSnapshot<S>> {
        self.snapshots
            .into_iter()
            .map(|r| TemporalSnapshot::new(r.context, r.structure))
            .collect()
    }
}

/// Wraps a body into a checksummed frame.
pub fn encode_frame(body: &[u8]) -> StorageResult<Vec<u8>> {
    let frame_length = u32::try_from(body.len() + FRAME_OVERHEAD).map_err(|_| {
        StorageError::encode_failed(format!("Batch of {} bytes exceeds frame limit", body.len()))
    })?;
    let prefix = frame_length.to_le_bytes();
    let checksum = frame_checksum(prefix, body);

    let mut frame = Vec::with_capacity(frame_length as usize);
    frame.extend_from_slice(&prefix);
    frame.extend_from_slice(body);
    frame.extend_from_slice(&checksum.to_le_bytes());
    Ok(frame)
}
