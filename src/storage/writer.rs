//! Snapshot log writer with fsync enforcement
//!
//! - The log is append-only; frames are never rewritten in place
//! - Every frame is fsynced before the batch is acknowledged
//! - A failed write is rolled back by truncating to the pre-write offset;
//!   if that also fails the log holds a torn frame, the error is fatal and
//!   the writer refuses every later append

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};

/// Directory under the data directory that holds the log.
pub const DATA_SUBDIR: &str = "data";

/// File name of the snapshot log.
pub const LOG_FILE: &str = "snapshots.dat";

/// Returns `<data_dir>/data/snapshots.dat`.
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATA_SUBDIR).join(LOG_FILE)
}

/// File operations the writer relies on.
pub trait LogFile: Write {
    /// Flushes data and metadata to the device.
    fn sync(&mut self) -> io::Result<()>;

    /// Cuts the file back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Append-only writer for the snapshot log.
///
/// Once a rollback fails the writer is halted: the log ends in a torn frame
/// and anything appended after it would be lost on the next open.
pub struct LogWriter<F: LogFile = File> {
    log_path: PathBuf,
    file: F,
    current_offset: u64,
    torn_at: Option<u64>,
}

impl LogWriter<File> {
    /// Opens or creates the log under `data_dir`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `TEMPORAL_STORAGE_IO_ERROR` if the file cannot be created or opened.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let log_path = log_path(data_dir);
        let data_subdir = data_dir.join(DATA_SUBDIR);

        if !data_subdir.exists() {
            fs::create_dir_all(&data_subdir).map_err(|e| {
                StorageError::io_error(
                    format!("Failed to create data directory: {}", data_subdir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                StorageError::io_error(
                    format!("Failed to open snapshot log: {}", log_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read log metadata", e))?
            .len();

        Ok(Self::with_file(log_path, file, current_offset))
    }
}

impl<F: LogFile> LogWriter<F> {
    /// Wraps an already positioned log file whose length is `current_offset`.
    pub fn with_file(log_path: PathBuf, file: F, current_offset: u64) -> Self {
        Self {
            log_path,
            file,
            current_offset,
            torn_at: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Offset of the torn frame, if a rollback has failed.
    pub fn torn_at(&self) -> Option<u64> {
        self.torn_at
    }

    /// Appends one frame and fsyncs it.
    ///
    /// # Returns
    ///
    /// The byte offset where the frame was written.
    ///
    /// # Errors
    ///
    /// - `TEMPORAL_STORAGE_WRITE_FAILED` if the write failed and was rolled back
    /// - `TEMPORAL_STORAGE_PARTIAL_COMMIT` if the rollback failed too, or an
    ///   earlier one did (FATAL; the file is not touched again)
    pub fn append(&mut self, frame: &[u8]) -> StorageResult<u64> {
        if let Some(offset) = self.torn_at {
            return Err(StorageError::halted(offset));
        }

        let offset = self.current_offset;

        let written = self
            .file
            .write_all(frame)
            .and_then(|_| self.file.sync());

        if let Err(e) = written {
            return Err(self.rollback(offset, e));
        }

        self.current_offset += frame.len() as u64;
        Ok(offset)
    }

    /// Truncates the log back to `offset` after a failed append.
    fn rollback(&mut self, offset: u64, cause: io::Error) -> StorageError {
        match self.file.truncate(offset).and_then(|_| self.file.sync()) {
            Ok(()) => StorageError::write_failed(
                format!("Failed to append batch at offset {}", offset),
                cause,
            ),
            Err(rollback_err) => {
                self.torn_at = Some(offset);
                StorageError::partial_commit(offset, rollback_err)
            }
        }
    }
}
