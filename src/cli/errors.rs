//! Process-level CLI failures
//!
//! A `CliError` ends the process with exit status 1. Failures of a single
//! request are answered on stdout instead, unless they were fatal, in which
//! case the answer is written and the run ends with `FatalRequest`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("stdin/stdout failed: {0}")]
    Io(#[from] io::Error),

    #[error("request line is not JSON: {0}")]
    MalformedLine(#[from] serde_json::Error),

    #[error("no request on stdin")]
    EmptyInput,

    #[error("{} is already initialized", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("{} is not initialized; run 'bitemporal init' first", .0.display())]
    NotInitialized(PathBuf),

    #[error("store unavailable: {0}")]
    Store(#[from] StorageError),

    /// A request hit an error after which the store must not be used.
    #[error("{code}: {message}")]
    FatalRequest { code: &'static str, message: String },
}

impl CliError {
    /// Stable code, written to stdout when a line is answered with this error.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "BITEMPORAL_CLI_CONFIG_ERROR",
            CliError::Io(_) => "BITEMPORAL_CLI_IO_ERROR",
            CliError::MalformedLine(_) | CliError::EmptyInput => "BITEMPORAL_BAD_REQUEST",
            CliError::AlreadyInitialized(_) => "BITEMPORAL_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "BITEMPORAL_CLI_NOT_INITIALIZED",
            CliError::Store(e) => e.code().code(),
            CliError::FatalRequest { code, .. } => *code,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
