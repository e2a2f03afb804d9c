//! JSON field-path mutator
//!
//! Serializes a structure to a `serde_json::Value`, replaces the value at the
//! correction path, and deserializes the result back into the structure type.
//!
//! Every segment must already exist:
//! - a field segment needs an object holding that key (a key holding null exists)
//! - an index segment needs an array long enough
//!
//! Otherwise the correction is a no-op and `Ok(None)` is returned.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::{MutationError, MutationResult};
use super::path::{CorrectionPath, PathSegment};
use super::value::CorrectionValue;
use super::FieldPathMutator;

/// Mutator for any structure with a serde representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathMutator;

impl JsonPathMutator {
    pub fn new() -> Self {
        Self
    }

    /// Locates the existing slot addressed by `segments`.
    fn slot<'a>(root: &'a mut Value, segments: &[PathSegment]) -> Option<&'a mut Value> {
        let mut current = root;
        for segment in segments {
            current = match (segment, current) {
                (PathSegment::Field(name), Value::Object(map)) => map.get_mut(name)?,
                (PathSegment::Index(position), Value::Array(items)) => items.get_mut(*position)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Applies the correction to a raw JSON tree in place.
    ///
    /// Returns false if the path does not exist.
    pub fn apply_value(root: &mut Value, path: &CorrectionPath, value: &CorrectionValue) -> bool {
        match Self::slot(root, path.segments()) {
            Some(slot) => {
                *slot = value.to_json();
                true
            }
            None => false,
        }
    }
}

impl<S> FieldPathMutator<S> for JsonPathMutator
where
    S: Serialize + DeserializeOwned,
{
    fn apply(
        &self,
        structure: &S,
        path: &CorrectionPath,
        value: &CorrectionValue,
    ) -> MutationResult<Option<S>> {
        let mut tree =
            serde_json::to_value(structure).map_err(|e| MutationError::Encode(e.to_string()))?;

        if !Self::apply_value(&mut tree, path, value) {
            return Ok(None);
        }

        serde_json::from_value(tree)
            .map(Some)
            .map_err(|e| MutationError::Incompatible {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}
