//! Temporal query resolution over one identifier's history
//!
//! ## Business-time order
//!
//! Versions are ordered by the `effective_on` of their latest revision,
//! ties broken by version number ascending. The version in force at an
//! instant `t` is the last one in that order with `effective_on <= t`.
//!
//! ## Enumeration order
//!
//! History listings are newest first: version descending, then
//! revision descending.
//!
//! Every function here is pure. Identical history and arguments always
//! resolve to the identical snapshot.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::temporal::{TemporalSnapshot, TemporalStructure};

/// Half-open version range `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub from: u32,
    pub until: u32,
}

impl VersionRange {
    pub fn new(from: u32, until: u32) -> Self {
        Self { from, until }
    }

    #[inline]
    pub fn contains(&self, version: u32) -> bool {
        self.from <= version && version < self.until
    }
}

/// Half-open business-time range `[from, until)`; `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectiveRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EffectiveRange {
    pub fn new(from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        Self { from, until }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| from <= instant)
            && self.until.map_or(true, |until| instant < until)
    }
}

/// Stateless resolver for temporal queries.
pub struct TemporalResolver;

impl TemporalResolver {
    /// Latest revision of every version, version ascending.
    pub fn latest_revisions<S: TemporalStructure>(
        history: &[TemporalSnapshot<S>],
    ) -> Vec<&TemporalSnapshot<S>> {
        let mut latest: BTreeMap<u32, &TemporalSnapshot<S>> = BTreeMap::new();
        for snapshot in history {
            latest
                .entry(snapshot.version())
                .and_modify(|current| {
                    if snapshot.revision() > current.revision() {
                        *current = snapshot;
                    }
                })
                .or_insert(snapshot);
        }
        latest.into_values().collect()
    }

    /// Latest revisions in business-time order.
    pub fn business_order<S: TemporalStructure>(
        history: &[TemporalSnapshot<S>],
    ) -> Vec<&TemporalSnapshot<S>> {
        let mut ordered = Self::latest_revisions(history);
        ordered.sort_by_key(|s| (s.context().effective_on(), s.version()));
        ordered
    }

    /// The version in force at `instant`, as its latest revision.
    pub fn effective_at<S: TemporalStructure>(
        history: &[TemporalSnapshot<S>],
        instant: DateTime<Utc>,
    ) -> Option<&TemporalSnapshot<S>> {
        Self::business_order(history)
            .into_iter()
            .take_while(|s| s.context().effective_on() <= instant)
            .last()
    }

    /// Latest revision of `version`.
    pub fn latest_of_version<S: TemporalStructure>(
        history: &[TemporalSnapshot<S>],
        version: u32,
    ) -> Option<&TemporalSnapshot<S>> {
        history
            .iter()
            .filter(|s| s.version() == version)
            .max_by_key(|s| s.revision())
    }

    /// The exact snapshot at `(version, revision)`.
    pub fn exact<S: TemporalStructure>(
        history: &[TemporalSnapshot<S>],
        version: u32,
        revision: u32,
    ) -> Option<&TemporalSnapshot<S>> {
        history
            .iter()
            .find(|s| s.version() == version && s.revision() == revision)
    }

    /// Highest version number in the history, if any.
    pub fn max_version<S: TemporalStructure>(history: &[TemporalSnapshot<S>]) -> Option<u32> {
        history.iter().map(|s| s.version()).max()
    }

    /// Highest revision recorded under each version number.
    pub fn max_revisions<S: TemporalStructure>(
        history: &[TemporalSnapshot<S>],
    ) -> BTreeMap<u32, u32> {
        let mut max: BTreeMap<u32, u32> = BTreeMap::new();
        for snapshot in history {
            let revision = max.entry(snapshot.version()).or_insert(snapshot.revision());
            *revision = (*revision).max(snapshot.revision());
        }
        max
    }

    /// Sorts snapshots newest first and clones them out of the history.
    pub fn newest_first<'a, S, I>(snapshots: I) -> Vec<TemporalSnapshot<S>>
    where
        S: TemporalStructure + 'a,
        I: IntoIterator<Item = &'a TemporalSnapshot<S>>,
    {
        let mut out: Vec<TemporalSnapshot<S>> = snapshots.into_iter().cloned().collect();
        out.sort_by_key(|s| (Reverse(s.version()), Reverse(s.revision())));
        out
    }
}
