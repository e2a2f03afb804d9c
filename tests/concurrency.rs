//! Concurrency Tests
//!
//! Tests for invariants:
//! - Mutations of one identifier are serialized (no lost or duplicated numbers)
//! - Mutations of different identifiers proceed independently
//! - Readers never observe a half-applied re-versioning cascade

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use bitemporal::config::EngineConfig;
use bitemporal::mutator::{CorrectionValue, JsonPathMutator};
use bitemporal::persistence::{PersistenceEngine, TemporalPersistence};
use bitemporal::storage::{FileStore, MemoryStore};
use bitemporal::temporal::Document;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

type Engine = PersistenceEngine<Document, MemoryStore<Document>, JsonPathMutator>;

fn engine() -> Arc<Engine> {
    Arc::new(PersistenceEngine::new(
        MemoryStore::new(),
        JsonPathMutator::new(),
        EngineConfig::default(),
    ))
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
}

fn doc(id: &str, n: u64) -> Document {
    Document::new(id).with_field("n", json!(n))
}

// =============================================================================
// Same identifier
// =============================================================================

#[test]
fn test_concurrent_appends_get_distinct_versions() {
    let engine = engine();
    engine.create_new(doc("X", 0), base(), None).unwrap();

    let threads = 8;
    let per_thread = 25;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let n = (t * per_thread + i + 1) as u64;
                    engine
                        .append_version(doc("X", n), base() + Duration::days(n as i64), None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut versions: Vec<u32> = engine
        .get_all_versions(&"X".to_string())
        .unwrap()
        .iter()
        .map(|s| s.version())
        .collect();
    versions.sort();
    let expected: Vec<u32> = (1..=(threads * per_thread + 1) as u32).collect();
    assert_eq!(versions, expected);
    assert_eq!(engine.metrics().snapshot().commit_failures, 0);
}

#[test]
fn test_concurrent_corrections_chain_revisions() {
    let engine = engine();
    engine.create_new(doc("X", 0), base(), None).unwrap();

    let handles: Vec<_> = (0..10u64)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .correct_struct_by_version(
                        &"X".to_string(),
                        1,
                        "n",
                        CorrectionValue::set(t),
                        "concurrent fix",
                    )
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut revisions: Vec<u32> = engine
        .get_all_versions_and_revisions(&"X".to_string())
        .unwrap()
        .iter()
        .map(|s| s.revision())
        .collect();
    revisions.sort();
    assert_eq!(revisions, (0..=10).collect::<Vec<u32>>());
}

// =============================================================================
// Different identifiers
// =============================================================================

#[test]
fn test_independent_identifiers_in_parallel() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(PersistenceEngine::new(
        FileStore::<Document>::open(dir.path()).unwrap(),
        JsonPathMutator::new(),
        EngineConfig::default(),
    ));

    let handles: Vec<_> = (0..6)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let id = format!("id-{}", t);
                engine.create_new(doc(&id, 0), base(), None).unwrap();
                for n in 1..=10u64 {
                    engine
                        .append_version(doc(&id, n), base() + Duration::days(n as i64), None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut ids = engine.identifiers().unwrap();
    ids.sort();
    assert_eq!(ids.len(), 6);
    for id in ids {
        let last = engine.get_by_id_last(&id).unwrap().unwrap();
        assert_eq!(last.version(), 11);
    }
}

// =============================================================================
// Snapshot isolation of cascades
// =============================================================================

#[test]
fn test_readers_never_see_partial_cascade() {
    let engine = engine();
    let id = "X".to_string();
    engine.create_new(doc("X", 1), base(), None).unwrap();
    engine
        .append_version(doc("X", 2), base() + Duration::days(365), None)
        .unwrap();

    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        let id = id.clone();
        thread::spawn(move || {
            let mut observed = 0;
            while !done.load(Ordering::SeqCst) {
                let versions = engine.get_all_versions(&id).unwrap();
                // Latest revisions must always be in business-time order
                let mut numbers: Vec<_> = versions.iter().map(|s| s.version()).collect();
                numbers.sort();
                assert_eq!(numbers, vec![1, 2]);

                let mut by_version = versions.clone();
                by_version.sort_by_key(|s| s.version());
                assert!(
                    by_version[0].context().effective_on() <= by_version[1].context().effective_on(),
                    "version order diverged from business order"
                );
                observed += 1;
            }
            observed
        })
    };

    // Moving version 1 past version 2 swaps them every time
    for i in 0..50i64 {
        let target_instant = base() + Duration::days(365 * (i + 2));
        let pairs = engine
            .correct_context_effective_on(&id, 1, target_instant, "swap")
            .unwrap();
        assert_eq!(pairs.len(), 2);
    }
    done.store(true, Ordering::SeqCst);

    assert!(reader.join().unwrap() > 0);
}
