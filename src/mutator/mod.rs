//! Field-Path Mutator
//!
//! Given a structure and a correction path, produces a new structure with the
//! value at that path replaced, or reports that the path is absent.
//!
//! This module provides:
//! - `CorrectionPath` - Parsed dotted path syntax
//! - `CorrectionValue` - Explicit set-value / set-null replacement
//! - `FieldPathMutator` - The seam the persistence engine calls through
//! - `JsonPathMutator` - serde_json based implementation

mod errors;
mod json;
mod path;
mod value;

pub use errors::{MutationError, MutationResult};
pub use json::JsonPathMutator;
pub use path::{CorrectionPath, PathSegment};
pub use value::CorrectionValue;

/// Applies named-path corrections to structures of type `S`.
///
/// Implementations must never create missing intermediate segments.
pub trait FieldPathMutator<S>: Send + Sync {
    /// Returns `Ok(Some(new))` when the path exists and was set,
    /// `Ok(None)` when any segment of the path is absent.
    fn apply(
        &self,
        structure: &S,
        path: &CorrectionPath,
        value: &CorrectionValue,
    ) -> MutationResult<Option<S>>;
}
