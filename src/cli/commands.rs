//! CLI command implementations
//!
//! Every command loads the config file first and applies its log level.
//! `exec` and `serve` open the file store, which replays and verifies the
//! whole snapshot log before the first request is read.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::Config;
use crate::mutator::JsonPathMutator;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::persistence::{PersistenceEngine, TemporalPersistence};
use crate::storage::{log_path, FileStore};
use crate::temporal::Document;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, read_requests, write_error, write_json, write_response};
use super::request::handle;

/// Engine served by the binary
pub type DocumentEngine = PersistenceEngine<Document, FileStore<Document>, JsonPathMutator>;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Exec { config } => exec(&config),
        Command::Serve { config } => serve(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    Ok(config)
}

/// Check if a data directory is initialized
pub fn is_initialized(data_dir: &Path) -> bool {
    log_path(data_dir).exists()
}

/// Opens the engine over an initialized data directory
pub fn open_engine(config: &Config) -> CliResult<DocumentEngine> {
    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::NotInitialized(data_dir.to_path_buf()));
    }

    let store = FileStore::open(data_dir)?;
    Ok(PersistenceEngine::new(
        store,
        JsonPathMutator::new(),
        config.engine_config(),
    ))
}

/// Initialize a new data directory
///
/// Creates `<data_dir>/data/snapshots.dat`, empty.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::AlreadyInitialized(data_dir.to_path_buf()));
    }

    FileStore::<Document>::open(data_dir)?;

    write_response(json!({"initialized": true, "data_dir": config.data_dir}))?;

    Ok(())
}

/// Execute a single request from stdin and exit
///
/// A fatal store error is answered and then fails the run.
pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;

    answer(&engine, read_request()?)
}

/// Writes the response to one request; fails if the request hit a fatal error.
fn answer<P>(engine: &P, request: Value) -> CliResult<()>
where
    P: TemporalPersistence<Document>,
{
    let handled = handle(engine, request);
    write_json(&handled.response)?;

    match handled.fatal {
        Some(e) => Err(CliError::FatalRequest {
            code: e.code,
            message: e.message,
        }),
        None => Ok(()),
    }
}

/// Serve requests from stdin, one JSON object per line, until EOF
///
/// A fatal store error answers the request that hit it and stops serving.
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;

    log_event_with_fields(Event::Serving, &[("data_dir", config.data_dir.as_str())]);

    for request_result in read_requests() {
        match request_result {
            Ok(request) => answer(&engine, request)?,
            Err(e @ CliError::MalformedLine(_)) => {
                // Unparseable line: answer and keep serving
                write_error(e.code(), &e.to_string())?;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::storage::{CommitBatch, SnapshotStore, StorageError, StorageResult};
    use crate::temporal::TemporalSnapshot;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("bitemporal.json");
        let data_dir = dir.path().join("store");
        fs::write(
            &path,
            json!({"data_dir": data_dir.display().to_string(), "log_level": "error"}).to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_init_then_already_initialized() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir);

        init(&config_path).unwrap();
        assert!(is_initialized(&dir.path().join("store")));

        let err = init(&config_path).unwrap_err();
        assert_eq!(err.code(), "BITEMPORAL_CLI_ALREADY_INITIALIZED");
    }

    #[test]
    fn test_open_engine_requires_init() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&write_config(&dir)).unwrap();
        match open_engine(&config) {
            Err(err) => assert_eq!(err.code(), "BITEMPORAL_CLI_NOT_INITIALIZED"),
            Ok(_) => panic!("engine opened without init"),
        }
    }

    #[test]
    fn test_engine_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir);
        init(&config_path).unwrap();
        let config = Config::load(&config_path).unwrap();

        {
            let engine = open_engine(&config).unwrap();
            engine
                .create_new(
                    Document::new("a"),
                    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                    None,
                )
                .unwrap();
        }

        let engine = open_engine(&config).unwrap();
        assert!(engine.get_by_id_last(&"a".to_string()).unwrap().is_some());
    }

    /// Store whose log is torn: reads work, every commit is refused as fatal.
    struct TornStore;

    impl SnapshotStore<Document> for TornStore {
        fn load(&self, _id: &String) -> StorageResult<Vec<TemporalSnapshot<Document>>> {
            Ok(Vec::new())
        }

        fn commit(&self, _batch: CommitBatch<Document>) -> StorageResult<()> {
            Err(StorageError::halted(128))
        }

        fn identifiers(&self) -> StorageResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_fatal_answer_fails_the_run() {
        let engine = PersistenceEngine::new(TornStore, JsonPathMutator::new(), EngineConfig::default());

        let err = answer(
            &engine,
            json!({"op": "create_new", "document": {"id": "a"}}),
        )
        .unwrap_err();
        assert_eq!(err.code(), "TEMPORAL_STORAGE_PARTIAL_COMMIT");
        assert!(matches!(err, CliError::FatalRequest { .. }));

        // Non-fatal failures are answered without ending the run
        answer(&engine, json!({"op": "append_version", "document": {"id": "a"}})).unwrap();
        answer(&engine, json!({"op": "get_last", "id": "a"})).unwrap();
    }
}
