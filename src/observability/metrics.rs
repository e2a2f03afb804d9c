//! Metrics registry for the persistence engine
//!
//! - Counters only
//! - Monotonic increase, reset only when the registry is created
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one engine instance.
///
/// Relaxed ordering is enough: counters are only read as a report.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Snapshots handed to the store in committed batches
    snapshots_written: AtomicU64,
    /// Identifiers created plus versions appended
    versions_created: AtomicU64,
    /// Revisions written by field or effective-on corrections
    corrections_applied: AtomicU64,
    /// Versions a correction left untouched (absent path)
    corrections_skipped: AtomicU64,
    /// Versions that moved to a new version number
    versions_renumbered: AtomicU64,
    /// Batches the store refused
    commit_failures: AtomicU64,
    /// Read operations answered
    queries_served: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_snapshots_written(&self, count: u64) {
        self.snapshots_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_versions_created(&self) {
        self.versions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_corrections_applied(&self, count: u64) {
        self.corrections_applied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_corrections_skipped(&self, count: u64) {
        self.corrections_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_versions_renumbered(&self, count: u64) {
        self.versions_renumbered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_commit_failures(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_served(&self) {
        self.queries_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            snapshots_written: self.snapshots_written.load(Ordering::Relaxed),
            versions_created: self.versions_created.load(Ordering::Relaxed),
            corrections_applied: self.corrections_applied.load(Ordering::Relaxed),
            corrections_skipped: self.corrections_skipped.load(Ordering::Relaxed),
            versions_renumbered: self.versions_renumbered.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            queries_served: self.queries_served.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        // Plain u64 fields cannot fail to serialize
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub snapshots_written: u64,
    pub versions_created: u64,
    pub corrections_applied: u64,
    pub corrections_skipped: u64,
    pub versions_renumbered: u64,
    pub commit_failures: u64,
    pub queries_served: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.snapshots_written, 0);
        assert_eq!(snapshot.versions_created, 0);
        assert_eq!(snapshot.queries_served, 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.add_snapshots_written(3);
        registry.increment_versions_created();
        registry.add_corrections_applied(2);
        registry.add_corrections_skipped(1);
        registry.add_versions_renumbered(2);
        registry.increment_commit_failures();
        registry.increment_queries_served();
        registry.increment_queries_served();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.snapshots_written, 3);
        assert_eq!(snapshot.versions_created, 1);
        assert_eq!(snapshot.corrections_applied, 2);
        assert_eq!(snapshot.corrections_skipped, 1);
        assert_eq!(snapshot.versions_renumbered, 2);
        assert_eq!(snapshot.commit_failures, 1);
        assert_eq!(snapshot.queries_served, 2);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.add_snapshots_written(12);

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["snapshots_written"], 12);
        assert_eq!(parsed["commit_failures"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_queries_served();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().queries_served, 1000);
    }
}
