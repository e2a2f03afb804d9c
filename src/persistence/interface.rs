//! The bitemporal persistence contract
//!
//! Implementors provide the required operations; every no-comment,
//! effective-now, current, last and unbounded variant is a provided method.

use chrono::{DateTime, Utc};

use super::errors::TemporalResult;
use crate::mutator::CorrectionValue;
use crate::temporal::{
    ContextHandle, CorrectedPair, HandleSpecificity, TemporalSnapshot, TemporalStructure,
};

pub trait TemporalPersistence<S: TemporalStructure> {
    // ==================
    // Creation
    // ==================

    /// Stores version 1, revision 0 of a new identifier.
    ///
    /// Fails with `IdentifierExists` if the identifier has any snapshot.
    fn create_new(
        &self,
        structure: S,
        effective_on: DateTime<Utc>,
        comment: Option<String>,
    ) -> TemporalResult<TemporalSnapshot<S>>;

    /// Stores the next version (highest + 1, revision 0) of an existing identifier.
    ///
    /// `effective_on` may precede earlier versions; appending never renumbers.
    fn append_version(
        &self,
        structure: S,
        effective_on: DateTime<Utc>,
        comment: Option<String>,
    ) -> TemporalResult<TemporalSnapshot<S>>;

    // ==================
    // Corrections
    // ==================

    /// Sets `path` on the latest revision of `version` and stores it as the
    /// next revision. `Ok(None)` if the path is absent on that version.
    fn correct_struct_by_version(
        &self,
        id: &S::Id,
        version: u32,
        path: &str,
        value: CorrectionValue,
        reason: &str,
    ) -> TemporalResult<Option<CorrectedPair<S>>>;

    /// Applies the correction to every version, version ascending.
    ///
    /// Versions where the path is absent produce no pair.
    fn correct_struct_all_versions(
        &self,
        id: &S::Id,
        path: &str,
        value: CorrectionValue,
        reason: &str,
    ) -> TemporalResult<Vec<CorrectedPair<S>>>;

    /// Moves `version` to `effective_on`, re-versioning whatever changes rank.
    ///
    /// Pairs are ordered by new version number ascending.
    fn correct_context_effective_on(
        &self,
        id: &S::Id,
        version: u32,
        effective_on: DateTime<Utc>,
        reason: &str,
    ) -> TemporalResult<Vec<CorrectedPair<S>>>;

    // ==================
    // Point queries
    // ==================

    fn get_by_id_effective(
        &self,
        id: &S::Id,
        instant: DateTime<Utc>,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>>;

    fn get_by_id_and_version(
        &self,
        id: &S::Id,
        version: u32,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>>;

    fn get_by_id_version_and_revision(
        &self,
        id: &S::Id,
        version: u32,
        revision: u32,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>>;

    /// Ceiling used by `get_by_id_last`.
    fn last_instant(&self) -> DateTime<Utc>;

    // ==================
    // History (newest first)
    // ==================

    /// Every snapshot with `from <= version < until`.
    fn get_all_versions_and_revisions_by_version(
        &self,
        id: &S::Id,
        from: u32,
        until: u32,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>>;

    /// Every snapshot whose own `effective_on` is in `[from, until)`.
    fn get_all_versions_and_revisions_by_effective(
        &self,
        id: &S::Id,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>>;

    /// Latest revision of each version with `from <= version < until`.
    fn get_all_versions_by_version(
        &self,
        id: &S::Id,
        from: u32,
        until: u32,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>>;

    /// Latest revision of each version whose `effective_on` is in `[from, until)`.
    fn get_all_versions_by_effective(
        &self,
        id: &S::Id,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>>;

    // ==================
    // Provided
    // ==================

    fn create_new_now(&self, structure: S) -> TemporalResult<TemporalSnapshot<S>> {
        self.create_new(structure, Utc::now(), None)
    }

    fn create_new_with_comment(
        &self,
        structure: S,
        comment: impl Into<String>,
    ) -> TemporalResult<TemporalSnapshot<S>>
    where
        Self: Sized,
    {
        self.create_new(structure, Utc::now(), Some(comment.into()))
    }

    fn create_new_effective(
        &self,
        structure: S,
        effective_on: DateTime<Utc>,
    ) -> TemporalResult<TemporalSnapshot<S>> {
        self.create_new(structure, effective_on, None)
    }

    fn append_version_now(&self, structure: S) -> TemporalResult<TemporalSnapshot<S>> {
        self.append_version(structure, Utc::now(), None)
    }

    fn append_version_with_comment(
        &self,
        structure: S,
        comment: impl Into<String>,
    ) -> TemporalResult<TemporalSnapshot<S>>
    where
        Self: Sized,
    {
        self.append_version(structure, Utc::now(), Some(comment.into()))
    }

    fn append_version_effective(
        &self,
        structure: S,
        effective_on: DateTime<Utc>,
    ) -> TemporalResult<TemporalSnapshot<S>> {
        self.append_version(structure, effective_on, None)
    }

    /// The version in force now.
    fn get_by_id_current(&self, id: &S::Id) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        self.get_by_id_effective(id, Utc::now())
    }

    /// The version in force at `last_instant`, normally the latest in business time.
    fn get_by_id_last(&self, id: &S::Id) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        self.get_by_id_effective(id, self.last_instant())
    }

    fn get_by_context_handle(
        &self,
        handle: &ContextHandle<S::Id>,
    ) -> TemporalResult<Option<TemporalSnapshot<S>>> {
        let id = handle.identifier();
        match (
            handle.specificity(),
            handle.version_number(),
            handle.revision_number(),
        ) {
            (HandleSpecificity::Exact, Some(version), Some(revision)) => {
                self.get_by_id_version_and_revision(id, version, revision)
            }
            (HandleSpecificity::Version, Some(version), _) => {
                self.get_by_id_and_version(id, version)
            }
            _ => self.get_by_id_current(id),
        }
    }

    fn get_all_versions_and_revisions(
        &self,
        id: &S::Id,
    ) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        self.get_all_versions_and_revisions_by_effective(id, None, None)
    }

    fn get_all_versions(&self, id: &S::Id) -> TemporalResult<Vec<TemporalSnapshot<S>>> {
        self.get_all_versions_by_effective(id, None, None)
    }
}
