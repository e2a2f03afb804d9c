//! Storage error types
//!
//! Error codes:
//! - TEMPORAL_STORAGE_IO_ERROR (ERROR severity)
//! - TEMPORAL_STORAGE_WRITE_FAILED (ERROR severity)
//! - TEMPORAL_STORAGE_READ_FAILED (ERROR severity)
//! - TEMPORAL_STORAGE_CONFLICT (ERROR severity)
//! - TEMPORAL_STORAGE_ENCODE_FAILED (ERROR severity)
//! - TEMPORAL_DATA_CORRUPTION (FATAL severity)
//! - TEMPORAL_STORAGE_PARTIAL_COMMIT (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the store remains usable
    Error,
    /// The store can no longer be trusted and must not serve further requests
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    IoError,
    /// Batch write failed and was rolled back
    WriteFailed,
    /// Record read failed
    ReadFailed,
    /// Batch rejected: stale view of the history or duplicate coordinates
    Conflict,
    /// Snapshot could not be encoded or decoded
    EncodeFailed,
    /// Checksum or framing failure
    DataCorruption,
    /// Batch write failed and could not be rolled back
    PartialCommit,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::IoError => "TEMPORAL_STORAGE_IO_ERROR",
            StorageErrorCode::WriteFailed => "TEMPORAL_STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "TEMPORAL_STORAGE_READ_FAILED",
            StorageErrorCode::Conflict => "TEMPORAL_STORAGE_CONFLICT",
            StorageErrorCode::EncodeFailed => "TEMPORAL_STORAGE_ENCODE_FAILED",
            StorageErrorCode::DataCorruption => "TEMPORAL_DATA_CORRUPTION",
            StorageErrorCode::PartialCommit => "TEMPORAL_STORAGE_PARTIAL_COMMIT",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption | StorageErrorCode::PartialCommit => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with full context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::IoError, message).with_source(source)
    }

    /// Create a write failed error for a batch that was rolled back
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::WriteFailed, message).with_source(source)
    }

    /// Create a new read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::ReadFailed, message).with_source(source)
    }

    /// Create a conflict error (stale expected length, duplicate coordinates)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::Conflict, message)
    }

    /// Create an encode/decode failure
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::EncodeFailed, message)
    }

    /// Create a new data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::DataCorruption, message)
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::DataCorruption, reason)
            .with_details(format!("byte_offset: {}", offset))
    }

    /// Create a partial commit error (FATAL): the log holds a torn batch
    pub fn partial_commit(offset: u64, source: io::Error) -> Self {
        Self::new(
            StorageErrorCode::PartialCommit,
            "Batch write failed and rollback did not complete",
        )
        .with_details(format!("byte_offset: {}", offset))
        .with_source(source)
    }

    /// Create a partial commit error for a write refused after an earlier torn batch
    pub fn halted(torn_offset: u64) -> Self {
        Self::new(
            StorageErrorCode::PartialCommit,
            "Log ends in a torn batch; writes are refused until the store is repaired",
        )
        .with_details(format!("byte_offset: {}", torn_offset))
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::encode_failed(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_codes() {
        assert!(StorageError::data_corruption("bad").is_fatal());
        assert!(StorageError::partial_commit(0, io::Error::new(io::ErrorKind::Other, "x")).is_fatal());
        assert!(StorageError::halted(64).is_fatal());
        assert!(!StorageError::conflict("stale").is_fatal());
        assert!(!StorageError::encode_failed("bad json").is_fatal());
    }

    #[test]
    fn test_display_contains_code_and_details() {
        let err = StorageError::corruption_at_offset(512, "checksum mismatch");
        let shown = err.to_string();
        assert!(shown.contains("FATAL"));
        assert!(shown.contains("TEMPORAL_DATA_CORRUPTION"));
        assert!(shown.contains("checksum mismatch"));
        assert!(shown.contains("byte_offset: 512"));
    }

    #[test]
    fn test_source_is_exposed() {
        use std::error::Error;
        let err = StorageError::write_failed(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "no space"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.code(), StorageErrorCode::WriteFailed);
    }
}
