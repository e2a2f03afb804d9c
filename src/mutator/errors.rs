//! # Mutation Errors
//!
//! A path that is well-formed but absent on a structure is NOT an error;
//! mutators report it as `Ok(None)`.

use thiserror::Error;

/// Result type for field-path mutation
pub type MutationResult<T> = Result<T, MutationError>;

/// Field-path mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Invalid correction path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Value at '{path}' is incompatible with the structure: {reason}")]
    Incompatible { path: String, reason: String },

    #[error("Correction at '{path}' would change the structure identifier")]
    IdentifierChanged { path: String },

    #[error("Structure could not be encoded for mutation: {0}")]
    Encode(String),
}

impl MutationError {
    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        MutationError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            MutationError::InvalidPath { .. } => "TEMPORAL_MUTATION_INVALID_PATH",
            MutationError::Incompatible { .. } => "TEMPORAL_MUTATION_INCOMPATIBLE",
            MutationError::IdentifierChanged { .. } => "TEMPORAL_MUTATION_IDENTIFIER_CHANGED",
            MutationError::Encode(_) => "TEMPORAL_MUTATION_ENCODE_FAILED",
        }
    }
}
