//! Snapshot Storage subsystem
//!
//! The durable collaborator of the persistence engine. Stores hold the
//! append-only history of every identifier and apply batches all-or-nothing.
//!
//! # Design Principles
//!
//! - Append-only (no snapshot is ever rewritten or removed)
//! - One batch = one checksummed frame on disk
//! - fsync before acknowledging a batch
//! - Halt-on-corruption: a damaged log is never served
//! - Stale writers are detected via the batch's expected history length

mod checksum;
mod errors;
mod file;
mod memory;
mod reader;
mod record;
mod store;
mod writer;

pub use checksum::{frame_checksum, verify_frame};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use reader::LogReader;
pub use record::{encode_frame, BatchRecord, SnapshotRecord, FRAME_OVERHEAD};
pub use store::{validate_batch, CommitBatch, SnapshotStore};
pub use writer::{log_path, LogFile, LogWriter, DATA_SUBDIR, LOG_FILE};
