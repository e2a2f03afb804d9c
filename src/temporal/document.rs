//! Document - Schemaless JSON structure
//!
//! A `Document` is an identifier plus an open set of JSON fields. It is the
//! structure type served by the CLI and a convenient default for callers that
//! do not model their domain as Rust types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{HasIdentifier, NoEvent, NoState, TemporalStructure};

/// A JSON document with a string identifier.
///
/// Fields are flattened on the wire: `{"id": "a", "name": "x"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl HasIdentifier for Document {
    type Id = String;

    fn identifier(&self) -> String {
        self.id.clone()
    }
}

impl TemporalStructure for Document {
    type State = NoState;
    type Event = NoEvent;
}
