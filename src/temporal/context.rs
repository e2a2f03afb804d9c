//! TemporalContext - Bitemporal coordinates of one stored snapshot
//!
//! A context pins a snapshot on both axes:
//! - `version` orders facts in business time (1..N per identifier)
//! - `revision` counts corrections of that fact in system time (0..)
//! - `effective_on` is the business-time instant the fact holds from
//!
//! This is a PURE VALUE TYPE. Numbering decisions belong to the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The first version number assigned to a new identifier.
pub const INITIAL_VERSION: u32 = 1;

/// The first revision number assigned to a new version.
pub const INITIAL_REVISION: u32 = 0;

/// The bitemporal context of one immutable snapshot.
///
/// For a fixed identifier, `(version, revision)` addresses exactly one
/// stored snapshot. Contexts are never mutated; corrections derive new ones.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporalContext {
    version: u32,
    revision: u32,
    effective_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl TemporalContext {
    /// Creates a context with explicit coordinates.
    pub fn new(
        version: u32,
        revision: u32,
        effective_on: DateTime<Utc>,
        comment: Option<String>,
    ) -> Self {
        Self {
            version,
            revision,
            effective_on,
            comment,
        }
    }

    /// Creates the context of a brand new identifier (version 1, revision 0).
    pub fn initial(effective_on: DateTime<Utc>, comment: Option<String>) -> Self {
        Self::new(INITIAL_VERSION, INITIAL_REVISION, effective_on, comment)
    }

    /// Creates the context of a freshly appended version (revision 0).
    pub fn appended(version: u32, effective_on: DateTime<Utc>, comment: Option<String>) -> Self {
        Self::new(version, INITIAL_REVISION, effective_on, comment)
    }

    /// Derives the next revision of this context, keeping version and instant.
    pub fn next_revision(&self, reason: impl Into<String>) -> Self {
        Self::new(
            self.version,
            self.revision + 1,
            self.effective_on,
            Some(reason.into()),
        )
    }

    /// Derives a renumbered context for the re-versioning cascade.
    pub fn renumbered(
        &self,
        version: u32,
        revision: u32,
        effective_on: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(version, revision, effective_on, Some(reason.into()))
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn revision(&self) -> u32 {
        self.revision
    }

    #[inline]
    pub fn effective_on(&self) -> DateTime<Utc> {
        self.effective_on
    }

    #[inline]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl Default for TemporalContext {
    /// Version 1, revision 0, effective now, no comment.
    fn default() -> Self {
        Self::initial(Utc::now(), None)
    }
}

impl fmt::Display for TemporalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}.r{}@{}",
            self.version,
            self.revision,
            self.effective_on.to_rfc3339()
        )?;
        if let Some(ref comment) = self.comment {
            write!(f, " ({})", comment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_initial_context() {
        let ctx = TemporalContext::initial(instant(2020), None);
        assert_eq!(ctx.version(), 1);
        assert_eq!(ctx.revision(), 0);
        assert_eq!(ctx.effective_on(), instant(2020));
        assert!(ctx.comment().is_none());
    }

    #[test]
    fn test_next_revision_keeps_version_and_instant() {
        let ctx = TemporalContext::appended(3, instant(2021), Some("imported".into()));
        let next = ctx.next_revision("typo in name");

        assert_eq!(next.version(), 3);
        assert_eq!(next.revision(), 1);
        assert_eq!(next.effective_on(), instant(2021));
        assert_eq!(next.comment(), Some("typo in name"));
        // Source is untouched
        assert_eq!(ctx.revision(), 0);
    }

    #[test]
    fn test_renumbered() {
        let ctx = TemporalContext::appended(2, instant(2021), None);
        let moved = ctx.renumbered(1, 4, instant(2019), "backdate");

        assert_eq!(moved.version(), 1);
        assert_eq!(moved.revision(), 4);
        assert_eq!(moved.effective_on(), instant(2019));
        assert_eq!(moved.comment(), Some("backdate"));
    }

    #[test]
    fn test_structural_equality() {
        let a = TemporalContext::initial(instant(2020), Some("x".into()));
        let b = TemporalContext::initial(instant(2020), Some("x".into()));
        let c = TemporalContext::initial(instant(2020), None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let ctx = TemporalContext::new(2, 1, instant(2020), Some("fix".into()));
        let shown = ctx.to_string();
        assert!(shown.starts_with("v2.r1@2020-01-01"));
        assert!(shown.ends_with("(fix)"));
    }

    #[test]
    fn test_serde_omits_missing_comment() {
        let ctx = TemporalContext::initial(instant(2020), None);
        let json = serde_json::to_value(&ctx).unwrap();
        assert!(json.get("comment").is_none());

        let back: TemporalContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }
}
