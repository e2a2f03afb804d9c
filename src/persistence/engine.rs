//! Persistence engine
//!
//! The only component with algorithmic behavior. It assigns version and
//! revision numbers, applies corrections and resolves temporal queries over
//! the history held by a `SnapshotStore`.
//!
//! # Write path
//!
//! 1. Check preconditions (no store access yet)
//! 2. Take the identifier's exclusive lock
//! 3. Load the history, compute the new snapshots
//! 4. Commit them as one `CommitBatch`
//!
//! A failed commit leaves the history exactly as it was loaded; nothing is
//! retried.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use super::errors::{PreconditionViolation, TemporalError, TemporalResult};
use super::interface::TemporalPersistence;
use super::locks::IdLocks;
use super::ordering::plan_effective_on_correction;
use super::query::{EffectiveRange, TemporalResolver, VersionRange};
use crate::config::EngineConfig;
use crate::mutator::{CorrectionPath, CorrectionValue, FieldPathMutator, MutationError};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::storage::{CommitBatch, SnapshotStore};
use crate::temporal::{
    CorrectedPair, TemporalContext, TemporalSnapshot, TemporalStructure, INITIAL_VERSION,
};

/// Bitemporal engine over a store `St` and a field mutator `M`.
pub struct PersistenceEngine<S, St, M>
where
    S: TemporalStructure,
{
    store: St,
    mutator: M,
    config: EngineConfig,
    locks: IdLocks<S::Id>,
    metrics: MetricsRegistry,
    _structure: PhantomData<fn() -> S>,
}

impl<S, St, M> PersistenceEngine<S, St, M>
where
    S: TemporalStructure,
    St: SnapshotStore<S>,
    M: FieldPathMutator<S>,
{
    pub fn new(store: St, mutator: M, config: EngineConfig) -> Self {
        Self {
            store,
            mutator,
            config,
            locks: IdLocks::new(),
            metrics: MetricsRegistry::new(),
            _structure: PhantomData,
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Every identifier with stored history.
    pub fn identifiers(&self) -> TemporalResult<Vec<S::Id>> {
        Ok(self.store.identifiers()?)
    }

    // ==================
    // Preconditions
    // ==================

    fn require_identifier(id: &S::Id) -> TemporalResult<()> {
        if id.to_string().trim().is_empty() {
            return Err(PreconditionViolation::EmptyIdentifier.into());
        }
        Ok(())
    }

    fn require_reason(reason: &str) -> TemporalResult<()> {
        if reason.trim().is_empty() {
            return Err(PreconditionViolation::MissingReason.into());
        }
        Ok(())
    }

    fn require_version(version: u32) -> TemporalResult<()> {
        if version < INITIAL_VERSION {
            return Err(PreconditionViolation::InvalidVersion(version).into());
        }
        Ok(())
    }

    fn require_range(range: VersionRange) -> TemporalResult<()> {
        if range.from > range.until {
            return Err(PreconditionViolation::InvalidVersionRange {
                from: range.from,
                until: range.until,
            }
            .into());
        }
        Ok(())
    }

    // ==================
    // Internals
    // ==================

    /// Loads the history of `id` under its shared lock.
    fn read_history(&self, id: &S::Id) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        Self::require_identifier(id)?;
        let history = self.locks.with_read(id, || self.store.load(id))?;
        self.metrics.increment_queries_served();
        Ok(history)
    }

    /// Commits `snapshots` against the history length observed by the caller.
    fn commit(
        &self,
        id: &S::Id,
        observed_len: usize,
        snapshots: Vec<TemporalSnapshot<S>>,
    ) -> TemporalResult<()> {
        let count = snapshots.len() as u64;
        match self
            .store
            .commit(CommitBatch::new(id.clone(), observed_len, snapshots))
        {
            Ok(()) => {
                self.metrics.add_snapshots_written(count);
                Ok(())
            }
            Err(e) => {
                self.metrics.increment_commit_failures();
                let id_str = id.to_string();
                log_event_with_fields(
                    Event::CommitRejected,
                    &[
                        ("code", e.code().code()),
                        ("id", id_str.as_str()),
                        ("reason", e.message()),
                    ],
                );
                Err(e.into())
            }
        }
    }

    /// Applies a field correction to one snapshot.
    ///
    /// `Ok(None)` if the path is absent.
    fn correct_snapshot(
        &self,
        prior: &TemporalSnapshot<S>,
        path: &CorrectionPath,
        value: &CorrectionValue,
        reason: &str,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        let Some(structure) = self.mutator.apply(prior.structure(), path, value)? else {
            let id_str = prior.identifier().to_string();
            let version = prior.version().to_string();
            log_event_with_fields(
                Event::CorrectionSkipped,
                &[
                    ("id", id_str.as_str()),
                    ("path", path.as_str()),
                    ("version", version.as_str()),
                ],
            );
            return Ok(None);
        };

        if structure.identifier() != *prior.identifier() {
            return Err(MutationError::IdentifierChanged {
                path: path.to_string(),
            }
            .into());
        }

        Ok(Some(TemporalSnapshot::new(
            prior.context().next_revision(reason),
            structure,
        )))
    }

    fn log_correction(pair: &CorrectedPair<S>, path: &CorrectionPath) {
        let id_str = pair.corrected().identifier().to_string();
        let version = pair.corrected().version().to_string();
        let revision = pair.corrected().revision().to_string();
        log_event_with_fields(
            Event::StructCorrected,
            &[
                ("id", id_str.as_str()),
                ("path", path.as_str()),
                ("revision", revision.as_str()),
                ("version", version.as_str()),
            ],
        );
    }

    fn log_version_written(event: Event, snapshot: &TemporalSnapshot<S>) {
        let id_str = snapshot.identifier().to_string();
        let version = snapshot.version().to_string();
        let effective_on = snapshot.context().effective_on().to_rfc3339();
        log_event_with_fields(
            event,
            &[
                ("effective_on", effective_on.as_str()),
                ("id", id_str.as_str()),
                ("version", version.as_str()),
            ],
        );
    }
}

impl<S, St, M> TemporalPersistence<S> for PersistenceEngine<S, St, M>
where
    S: TemporalStructure,
    St: SnapshotStore<S>,
    M: FieldPathMutator<S>,
{
    fn create_new(
        &self,
        structure: S,
        effective_on: DateTime<Utc>,
        comment: Option<String>,
    ) -> TemporalResult<TemporalSnapshot<S>> {
        let id = structure.identifier();
        Self::require_identifier(&id)?;

        self.locks.with_write(&id, || {
            let history = self.store.load(&id)?;
            if !history.is_empty() {
                return Err(TemporalError::IdentifierExists(id.to_string()));
            }

            let snapshot =
                TemporalSnapshot::new(TemporalContext::initial(effective_on, comment), structure);
            self.commit(&id, history.len(), vec![snapshot.clone()])?;

            self.metrics.increment_versions_created();
            Self::log_version_written(Event::SnapshotCreated, &snapshot);
            Ok(snapshot)
        })
    }

    fn append_version(
        &self,
        structure: S,
        effective_on: DateTime<Utc>,
        comment: Option<String>,
    ) -> TemporalResult<TemporalSnapshot<S>> {
        let id = structure.identifier();
        Self::require_identifier(&id)?;

        self.locks.with_write(&id, || {
            let history = self.store.load(&id)?;
            let Some(max_version) = TemporalResolver::max_version(&history) else {
                return Err(TemporalError::UnknownIdentifier(id.to_string()));
            };

            let snapshot = TemporalSnapshot::new(
                TemporalContext::appended(max_version + 1, effective_on, comment),
                structure,
            );
            self.commit(&id, history.len(), vec![snapshot.clone()])?;

            self.metrics.increment_versions_created();
            Self::log_version_written(Event::VersionAppended, &snapshot);
            Ok(snapshot)
        })
    }

    fn correct_struct_by_version(
        &self,
        id: &S::Id,
        version: u32,
        path: &str,
        value: CorrectionValue,
        reason: &str,
    ) -> TemporalResult<Option<CorrectedPair<S>>> {
        Self::require_identifier(id)?;
        Self::require_version(version)?;
        Self::require_reason(reason)?;
        let path = CorrectionPath::parse(path)?;

        self.locks.with_write(id, || {
            let history = self.store.load(id)?;
            let prior = TemporalResolver::latest_of_version(&history, version)
                .ok_or_else(|| TemporalError::unknown_version(id, version))?;

            let Some(corrected) = self.correct_snapshot(prior, &path, &value, reason)? else {
                self.metrics.add_corrections_skipped(1);
                return Ok(None);
            };

            self.commit(id, history.len(), vec![corrected.clone()])?;
            self.metrics.add_corrections_applied(1);

            let pair = CorrectedPair::new(prior.clone(), corrected);
            Self::log_correction(&pair, &path);
            Ok(Some(pair))
        })
    }

    fn correct_struct_all_versions(
        &self,
        id: &S::Id,
        path: &str,
        value: CorrectionValue,
        reason: &str,
    ) -> TemporalResult<Vec<CorrectedPair<S>>> {
        Self::require_identifier(id)?;
        Self::require_reason(reason)?;
        let path = CorrectionPath::parse(path)?;

        self.locks.with_write(id, || {
            let history = self.store.load(id)?;

            let mut pairs = Vec::new();
            let mut skipped = 0u64;
            for prior in TemporalResolver::latest_revisions(&history) {
                match self.correct_snapshot(prior, &path, &value, reason)? {
                    Some(corrected) => pairs.push(CorrectedPair::new(prior.clone(), corrected)),
                    None => skipped += 1,
                }
            }
            self.metrics.add_corrections_skipped(skipped);

            if pairs.is_empty() {
                return Ok(pairs);
            }

            let snapshots = pairs.iter().map(|p| p.corrected().clone()).collect();
            self.commit(id, history.len(), snapshots)?;
            self.metrics.add_corrections_applied(pairs.len() as u64);

            for pair in &pairs {
                Self::log_correction(pair, &path);
            }
            Ok(pairs)
        })
    }

    fn correct_context_effective_on(
        &self,
        id: &S::Id,
        version: u32,
        effective_on: DateTime<Utc>,
        reason: &str,
    ) -> TemporalResult<Vec<CorrectedPair<S>>> {
        Self::require_identifier(id)?;
        Self::require_version(version)?;
        Self::require_reason(reason)?;

        self.locks.with_write(id, || {
            let history = self.store.load(id)?;
            let plan = plan_effective_on_correction(&history, version, effective_on, reason)
                .ok_or_else(|| TemporalError::unknown_version(id, version))?;

            let pairs: Vec<CorrectedPair<S>> = plan
                .iter()
                .map(|step| CorrectedPair::new(step.original.clone(), step.corrected()))
                .collect();
            let moved = plan.iter().filter(|step| step.moves()).count() as u64;

            let snapshots = pairs.iter().map(|p| p.corrected().clone()).collect();
            self.commit(id, history.len(), snapshots)?;

            self.metrics.add_corrections_applied(pairs.len() as u64);
            self.metrics.add_versions_renumbered(moved);

            let id_str = id.to_string();
            for pair in pairs.iter().filter(|p| p.is_renumbered()) {
                let from = pair.original().version().to_string();
                let to = pair.corrected().version().to_string();
                log_event_with_fields(
                    Event::VersionRenumbered,
                    &[
                        ("from", from.as_str()),
                        ("id", id_str.as_str()),
                        ("to", to.as_str()),
                    ],
                );
            }

            let target = version.to_string();
            let instant = effective_on.to_rfc3339();
            let rewritten = pairs.len().to_string();
            log_event_with_fields(
                Event::EffectiveOnCorrected,
                &[
                    ("effective_on", instant.as_str()),
                    ("id", id_str.as_str()),
                    ("rewritten", rewritten.as_str()),
                    ("version", target.as_str()),
                ],
            );
            Ok(pairs)
        })
    }

    fn get_by_id_effective(
        &self,
        id: &S::Id,
        instant: DateTime<Utc>,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        let history = self.read_history(id)?;
        Ok(TemporalResolver::effective_at(&history, instant).cloned())
    }

    fn get_by_id_and_version(
        &self,
        id: &S::Id,
        version: u32,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        let history = self.read_history(id)?;
        Ok(TemporalResolver::latest_of_version(&history, version).cloned())
    }

    fn get_by_id_version_and_revision(
        &self,
        id: &S::Id,
        version: u32,
        revision: u32,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        let history = self.read_history(id)?;
        Ok(TemporalResolver::exact(&history, version, revision).cloned())
    }

    fn last_instant(&self) -> DateTime<Utc> {
        self.config.last_instant
    }

    fn get_all_versions_and_revisions_by_version(
        &self,
        id: &S::Id,
        from: u32,
        until: u32,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        let range = VersionRange::new(from, until);
        Self::require_range(range)?;
        let history = self.read_history(id)?;
        Ok(TemporalResolver::newest_first(
            history.iter().filter(|s| range.contains(s.version())),
        ))
    }

    fn get_all_versions_and_revisions_by_effective(
        &self,
        id: &S::Id,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        let range = EffectiveRange::new(from, until);
        let history = self.read_history(id)?;
        Ok(TemporalResolver::newest_first(
            history
                .iter()
                .filter(|s| range.contains(s.context().effective_on())),
        ))
    }

    fn get_all_versions_by_version(
        &self,
        id: &S::Id,
        from: u32,
        until: u32,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        let range = VersionRange::new(from, until);
        Self::require_range(range)?;
        let history = self.read_history(id)?;
        Ok(TemporalResolver::newest_first(
            TemporalResolver::latest_revisions(&history)
                .into_iter()
                .filter(|s| range.contains(s.version())),
        ))
    }

    fn get_all_versions_by_effective(
        &self,
        id: &S::Id,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        let range = EffectiveRange::new(from, until);
        let history = self.read_history(id)?;
        Ok(TemporalResolver::newest_first(
            TemporalResolver::latest_revisions(&history)
                .into_iter()
                .filter(|s| range.contains(s.context().effective_on())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutator::JsonPathMutator;
    use crate::storage::MemoryStore;
    use crate::temporal::Document;
    use chrono::TimeZone;
    use serde_json::json;

    type Engine = PersistenceEngine<Document, MemoryStore<Document>, JsonPathMutator>;

    fn engine() -> Engine {
        PersistenceEngine::new(MemoryStore::new(), JsonPathMutator, EngineConfig::default())
    }

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    fn employee(salary: u64) -> Document {
        Document::new("emp-1").with_field("salary", json!(salary))
    }

    fn id() -> String {
        "emp-1".to_string()
    }

    #[test]
    fn test_create_then_duplicate_rejected() {
        let engine = engine();
        let created = engine.create_new(employee(10), at(2020), None).unwrap();
        assert_eq!((created.version(), created.revision()), (1, 0));

        let err = engine.create_new(employee(11), at(2020), None).unwrap_err();
        assert_eq!(err.code(), "TEMPORAL_IDENTIFIER_EXISTS");
        assert_eq!(engine.store().snapshot_count(), 1);
    }

    #[test]
    fn test_append_requires_existing_identifier() {
        let engine = engine();
        let err = engine.append_version(employee(10), at(2020), None).unwrap_err();
        assert!(matches!(err, TemporalError::UnknownIdentifier(_)));
    }

    #[test]
    fn test_append_out_of_order_does_not_renumber() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();
        let appended = engine.append_version(employee(20), at(2019), None).unwrap();
        assert_eq!(appended.version(), 2);

        // Business order puts v2 first, so v1 is in force in 2020
        let in_force = engine.get_by_id_effective(&id(), at(2020)).unwrap().unwrap();
        assert_eq!(in_force.version(), 1);
    }

    #[test]
    fn test_preconditions_checked_before_store_access() {
        let engine = engine();

        let err = engine
            .correct_struct_by_version(&id(), 1, "salary", CorrectionValue::Null, "  ")
            .unwrap_err();
        assert!(matches!(
            err,
            TemporalError::Precondition(PreconditionViolation::MissingReason)
        ));

        let err = engine
            .correct_context_effective_on(&id(), 0, at(2020), "fix")
            .unwrap_err();
        assert!(err.is_precondition());

        let err = engine
            .create_new(Document::new(""), at(2020), None)
            .unwrap_err();
        assert!(matches!(
            err,
            TemporalError::Precondition(PreconditionViolation::EmptyIdentifier)
        ));

        assert_eq!(engine.metrics().snapshot().queries_served, 0);
    }

    #[test]
    fn test_invalid_path_is_a_mutation_error() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();
        let err = engine
            .correct_struct_by_version(&id(), 1, "a..b", CorrectionValue::Null, "fix")
            .unwrap_err();
        assert_eq!(err.code(), "TEMPORAL_MUTATION_INVALID_PATH");
    }

    #[test]
    fn test_correct_unknown_version() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();
        let err = engine
            .correct_struct_by_version(&id(), 3, "salary", CorrectionValue::set(1), "fix")
            .unwrap_err();
        assert!(matches!(err, TemporalError::UnknownVersion { version: 3, .. }));
    }

    #[test]
    fn test_correct_all_on_unknown_identifier_is_empty() {
        let engine = engine();
        let pairs = engine
            .correct_struct_all_versions(&id(), "salary", CorrectionValue::set(1), "fix")
            .unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_identifier_change_rejected() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();
        let err = engine
            .correct_struct_by_version(&id(), 1, "id", CorrectionValue::set("emp-2"), "rename")
            .unwrap_err();
        assert_eq!(err.code(), "TEMPORAL_MUTATION_IDENTIFIER_CHANGED");
        assert_eq!(engine.store().snapshot_count(), 1);
    }

    #[test]
    fn test_correct_all_skips_versions_missing_the_path() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();
        engine
            .append_version(employee(20).with_field("bonus", json!(1)), at(2021), None)
            .unwrap();
        engine.append_version(employee(30), at(2022), None).unwrap();

        let pairs = engine
            .correct_struct_all_versions(&id(), "bonus", CorrectionValue::set(5), "audit")
            .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].corrected().version(), 2);
        assert_eq!(pairs[0].corrected().revision(), 1);

        let metrics = engine.metrics().snapshot();
        assert_eq!(metrics.corrections_applied, 1);
        assert_eq!(metrics.corrections_skipped, 2);
    }

    #[test]
    fn test_cascade_counts_renumbered_versions() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();
        engine.append_version(employee(20), at(2021), None).unwrap();

        let pairs = engine
            .correct_context_effective_on(&id(), 2, at(2019), "backdate")
            .unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(engine.metrics().snapshot().versions_renumbered, 2);
        assert_eq!(engine.store().snapshot_count(), 4);
    }

    #[test]
    fn test_version_range_must_not_be_inverted() {
        let engine = engine();
        let err = engine
            .get_all_versions_and_revisions_by_version(&id(), 3, 1)
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(engine
            .get_all_versions_by_version(&id(), 2, 2)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_identifiers_leave_no_lock_entries() {
        let engine = engine();
        engine.create_new(employee(10), at(2020), None).unwrap();

        for i in 0..1_000 {
            let missing = format!("missing-{}", i);
            assert!(engine.get_by_id_current(&missing).unwrap().is_none());
            assert!(engine.get_all_versions(&missing).unwrap().is_empty());
            assert!(engine
                .append_version(Document::new(missing.as_str()), at(2021), None)
                .is_err());
        }
        engine
            .correct_struct_by_version(&id(), 1, "salary", CorrectionValue::set(11), "fix")
            .unwrap();

        assert_eq!(engine.locks.len(), 0);
    }

    #[test]
    fn test_last_instant_from_config() {
        let engine = PersistenceEngine::<Document, _, _>::new(
            MemoryStore::new(),
            JsonPathMutator,
            EngineConfig::default().with_last_instant(at(2021)),
        );
        engine.create_new(employee(10), at(2020), None).unwrap();
        engine.append_version(employee(20), at(2022), None).unwrap();

        assert_eq!(engine.get_by_id_last(&id()).unwrap().unwrap().version(), 1);
    }
}
