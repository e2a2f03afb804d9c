//! CLI module
//!
//! Provides command-line interface for:
//! - init: Create the data directory and an empty snapshot log
//! - exec: One-shot request execution
//! - serve: Line-delimited request loop over stdin/stdout

mod args;
mod commands;
mod errors;
mod io;
mod request;

pub use args::{Cli, Command};
pub use commands::{exec, init, is_initialized, open_engine, run, run_command, serve, DocumentEngine};
pub use errors::{CliError, CliResult};
pub use io::{error_envelope, ok_envelope, read_request, write_error, write_response};
pub use request::{
    dispatch, handle, pair_json, snapshot_json, Handled, HistoryRange, Request, RequestError,
};
