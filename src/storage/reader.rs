//! Snapshot log reader with strict corruption detection
//!
//! - Every frame's checksum is validated on read
//! - A truncated or corrupt frame is fatal: the store refuses to open
//!   rather than serve a history that may be missing committed batches

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::checksum::verify_frame;
use super::errors::{StorageError, StorageResult};
use super::record::FRAME_OVERHEAD;

/// Sequential reader over the frames of a snapshot log.
pub struct LogReader {
    log_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl LogReader {
    /// Opens the log file for reading.
    pub fn open(log_path: &Path) -> StorageResult<Self> {
        let file = File::open(log_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open snapshot log: {}", log_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read log metadata", e))?
            .len();

        Ok(Self {
            log_path: log_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next frame body.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(body))` if a frame was read and its checksum verified
    /// - `Ok(None)` at end of file
    /// - `Err(TEMPORAL_DATA_CORRUPTION)` on truncation or checksum mismatch
    pub fn read_next(&mut self) -> StorageResult<Option<Vec<u8>>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < FRAME_OVERHEAD as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated log: {} bytes remaining, minimum frame size is {}",
                    remaining, FRAME_OVERHEAD
                ),
            ));
        }

        let mut prefix = [0u8; 4];
        self.reader.read_exact(&mut prefix).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame length: {}", e),
            )
        })?;
        let frame_length = u32::from_le_bytes(prefix) as u64;

        if frame_length < FRAME_OVERHEAD as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid frame length: {}", frame_length),
            ));
        }
        if frame_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Frame length {} exceeds remaining log size {}",
                    frame_length, remaining
                ),
            ));
        }

        let mut body = vec![0u8; frame_length as usize - FRAME_OVERHEAD];
        self.reader.read_exact(&mut body).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame body: {}", e),
            )
        })?;

        let mut checksum = [0u8; 4];
        self.reader.read_exact(&mut checksum).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame checksum: {}", e),
            )
        })?;

        if !verify_frame(prefix, &body, u32::from_le_bytes(checksum)) {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                "Frame checksum mismatch",
            ));
        }

        self.current_offset += frame_length;
        Ok(Some(body))
    }

    /// Reads every remaining frame body.
    pub fn read_all(&mut self) -> StorageResult<Vec<Vec<u8>>> {
        let mut frames = Vec::new();
        while let Some(body) = self.read_next()? {
            frames.push(body);
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::encode_frame;
    use crate::storage::StorageErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn write_frames(path: &Path, bodies: &[&[u8]]) {
        let mut bytes = Vec::new();
        for body in bodies {
            bytes.extend(encode_frame(body).unwrap());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_reads_frames_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.dat");
        write_frames(&path, &[b"first", b"second"]);

        let mut reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.read_all().unwrap(), vec![b"first".to_vec(), b"second".to_vec()]);
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_empty_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.dat");
        fs::write(&path, b"").unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_truncated_tail_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.dat");
        write_frames(&path, &[b"complete", b"torn frame"]);

        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 3);
        fs::write(&path, bytes).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.read_next().unwrap().unwrap(), b"complete");
        let err = reader.read_next().unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DataCorruption);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_flipped_byte_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.dat");
        write_frames(&path, &[b"payload"]);

        let mut bytes = fs::read(&path).unwrap();
        bytes[5] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        let err = reader.read_next().unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DataCorruption);
        assert!(err.to_string().contains("byte_offset: 0"));
    }
}
