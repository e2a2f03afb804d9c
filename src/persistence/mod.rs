//! Bitemporal persistence
//!
//! - `TemporalPersistence` - The operation contract (required + provided)
//! - `PersistenceEngine` - Numbering, corrections, re-versioning and queries
//! - `TemporalResolver` - Pure query resolution over one history
//! - `plan_effective_on_correction` - Pure re-versioning cascade planner
//! - `IdLocks` - Per-identifier mutual exclusion
//!
//! # Invariants
//!
//! - `(version, revision)` addresses exactly one snapshot per identifier
//! - Revisions of a version only grow; nothing stored is rewritten
//! - Version numbers follow the business-time order of latest revisions
//!   after every effective-on correction
//! - A re-versioning cascade is committed whole or not at all

mod engine;
mod errors;
mod interface;
mod locks;
mod ordering;
mod query;

pub use engine::PersistenceEngine;
pub use errors::{PreconditionViolation, TemporalError, TemporalResult};
pub use interface::TemporalPersistence;
pub use locks::IdLocks;
pub use ordering::{plan_effective_on_correction, Renumbering};
pub use query::{EffectiveRange, TemporalResolver, VersionRange};
