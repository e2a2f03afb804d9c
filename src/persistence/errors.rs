//! # Persistence Errors
//!
//! Three outcomes never become errors here:
//! - a query with no match (empty `Option` / `Vec`)
//! - a correction whose path is absent (no `CorrectedPair`)
//! - a correction of an identifier with no history (empty list)

use thiserror::Error;

use crate::mutator::MutationError;
use crate::storage::{Severity, StorageError};

/// Result type for persistence operations
pub type TemporalResult<T> = Result<T, TemporalError>;

/// A required argument was missing or malformed.
///
/// Raised before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("A correction requires a non-empty reason")]
    MissingReason,

    #[error("Structure identifier must not be empty")]
    EmptyIdentifier,

    #[error("Version numbers start at 1, got {0}")]
    InvalidVersion(u32),

    #[error("Version range is empty: from {from} until {until}")]
    InvalidVersionRange { from: u32, until: u32 },
}

/// Persistence engine errors
#[derive(Debug, Error)]
pub enum TemporalError {
    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionViolation),

    #[error("Identifier '{0}' already has stored snapshots")]
    IdentifierExists(String),

    #[error("Identifier '{0}' has no stored snapshots")]
    UnknownIdentifier(String),

    #[error("Identifier '{id}' has no version {version}")]
    UnknownVersion { id: String, version: u32 },

    #[error("Correction failed: {0}")]
    Mutation(#[from] MutationError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

impl TemporalError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            TemporalError::Precondition(_) => "TEMPORAL_PRECONDITION_VIOLATED",
            TemporalError::IdentifierExists(_) => "TEMPORAL_IDENTIFIER_EXISTS",
            TemporalError::UnknownIdentifier(_) => "TEMPORAL_UNKNOWN_IDENTIFIER",
            TemporalError::UnknownVersion { .. } => "TEMPORAL_UNKNOWN_VERSION",
            TemporalError::Mutation(e) => e.code(),
            TemporalError::Persistence(e) => e.code().code(),
        }
    }

    /// Only storage corruption or a half-applied write is fatal.
    pub fn severity(&self) -> Severity {
        match self {
            TemporalError::Persistence(e) => e.severity(),
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// True for caller programming errors, as opposed to runtime failures.
    pub fn is_precondition(&self) -> bool {
        matches!(self, TemporalError::Precondition(_))
    }

    pub(crate) fn unknown_version(id: &impl std::fmt::Display, version: u32) -> Self {
        TemporalError::UnknownVersion {
            id: id.to_string(),
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_precondition_is_distinct_from_persistence() {
        let pre: TemporalError = PreconditionViolation::MissingReason.into();
        assert!(pre.is_precondition());
        assert_eq!(pre.code(), "TEMPORAL_PRECONDITION_VIOLATED");

        let store: TemporalError = StorageError::conflict("stale").into();
        assert!(!store.is_precondition());
        assert_eq!(store.code(), "TEMPORAL_STORAGE_CONFLICT");
    }

    #[test]
    fn test_fatal_only_for_fatal_storage_errors() {
        let partial: TemporalError =
            StorageError::partial_commit(64, io::Error::new(io::ErrorKind::Other, "disk")).into();
        assert!(partial.is_fatal());

        let missing = TemporalError::UnknownIdentifier("x".into());
        assert!(!missing.is_fatal());
        assert_eq!(missing.severity(), Severity::Error);
    }

    #[test]
    fn test_mutation_code_passthrough() {
        let err: TemporalError = MutationError::IdentifierChanged { path: "id".into() }.into();
        assert_eq!(err.code(), "TEMPORAL_MUTATION_IDENTIFIER_CHANGED");
    }

    #[test]
    fn test_display_names_version() {
        let err = TemporalError::unknown_version(&"emp-1", 4);
        assert_eq!(err.to_string(), "Identifier 'emp-1' has no version 4");
    }
}
