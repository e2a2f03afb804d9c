//! Re-versioning cascade for effective-on corrections
//!
//! Version numbers must always follow business-time order. Moving the
//! effective-on instant of one version can therefore renumber others:
//!
//! 1. Take the latest revision of every version
//! 2. Replace the target's `effective_on` with the new instant
//! 3. Sort by `(effective_on, version)`; rank (1-based) is the new version
//! 4. Re-version every entry whose rank differs from its version, plus the target
//!
//! A re-versioned entry is written under its new version number with revision
//! `max(prior revision, highest revision already under that number) + 1`, so
//! `(version, revision)` never collides with a stored snapshot and the new
//! entry is the latest revision of its number.
//!
//! Planning is pure; the engine commits the whole plan as one batch.

use chrono::{DateTime, Utc};

use super::query::TemporalResolver;
use crate::temporal::{TemporalContext, TemporalSnapshot, TemporalStructure};

/// One planned rewrite: the latest snapshot of a version and its new context.
#[derive(Debug)]
pub struct Renumbering<'a, S: TemporalStructure> {
    pub original: &'a TemporalSnapshot<S>,
    pub context: TemporalContext,
}

impl<S: TemporalStructure> Renumbering<'_, S> {
    /// True if the version number changes.
    pub fn moves(&self) -> bool {
        self.original.version() != self.context.version()
    }

    /// The corrected snapshot: same structure, new context.
    pub fn corrected(&self) -> TemporalSnapshot<S> {
        TemporalSnapshot::new(self.context.clone(), self.original.structure().clone())
    }
}

/// Plans the rewrites for moving `target_version` to `effective_on`.
///
/// Returns `None` if the history holds no such version. Entries are ordered
/// by new version number ascending.
pub fn plan_effective_on_correction<'a, S: TemporalStructure>(
    history: &'a [TemporalSnapshot<S>],
    target_version: u32,
    effective_on: DateTime<Utc>,
    reason: &str,
) -> Option<Vec<Renumbering<'a, S>>> {
    let latest = TemporalResolver::latest_revisions(history);
    if !latest.iter().any(|s| s.version() == target_version) {
        return None;
    }

    let mut candidate: Vec<(DateTime<Utc>, &TemporalSnapshot<S>)> = latest
        .into_iter()
        .map(|s| {
            let instant = if s.version() == target_version {
                effective_on
            } else {
                s.context().effective_on()
            };
            (instant, s)
        })
        .collect();
    candidate.sort_by_key(|(instant, s)| (*instant, s.version()));

    let max_revisions = TemporalResolver::max_revisions(history);

    let plan = candidate
        .into_iter()
        .zip(1u32..)
        .filter(|((_, s), rank)| *rank != s.version() || s.version() == target_version)
        .map(|((instant, original), new_version)| {
            let occupied = max_revisions.get(&new_version).copied().unwrap_or(0);
            let revision = original.revision().max(occupied) + 1;
            Renumbering {
                original,
                context: original
                    .context()
                    .renumbered(new_version, revision, instant, reason),
            }
        })
        .collect();

    Some(plan)
}
