//! Capabilities a domain structure must expose to be persisted temporally.
//!
//! The persistence core only ever asks a structure for its identifier.
//! `State` and `Event` are carried as type parameters so richer structures can
//! layer state-machine semantics on top; the core never inspects them.

use std::fmt;
use std::hash::Hash;

/// A structure that carries a stable identifier.
pub trait HasIdentifier {
    /// Identifier type. Must be usable as a map key and printable in logs.
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Returns the identifier of this structure instance.
    fn identifier(&self) -> Self::Id;
}

/// A domain structure persisted with bitemporal history.
pub trait TemporalStructure: HasIdentifier + Clone {
    /// Enum of lifecycle states. Uninterpreted by the core.
    type State;
    /// Enum of lifecycle events. Uninterpreted by the core.
    type Event;
}

/// Marker for structures without lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoState {}

/// Marker for structures without lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoEvent {}
