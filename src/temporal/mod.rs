//! Temporal Domain Types
//!
//! Defines the bitemporal vocabulary in code:
//! - `TemporalContext` - (version, revision, effective_on, comment) of one snapshot
//! - `ContextHandle` - Partially specified snapshot address
//! - `TemporalSnapshot` - Immutable binding of context, structure and handle
//! - `CorrectedPair` - (original, corrected) audit unit of a correction
//! - `HasIdentifier` / `TemporalStructure` - What the core requires of a structure
//! - `Document` - Schemaless JSON structure
//!
//! Everything here is data. Numbering and resolution live in `persistence`.

mod context;
mod corrected;
mod document;
mod handle;
mod snapshot;
mod structure;

pub use context::{TemporalContext, INITIAL_REVISION, INITIAL_VERSION};
pub use corrected::CorrectedPair;
pub use document::Document;
pub use handle::{ContextHandle, HandleSpecificity};
pub use snapshot::TemporalSnapshot;
pub use structure::{HasIdentifier, NoEvent, NoState, TemporalStructure};
