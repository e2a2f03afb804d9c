//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Counter metrics per engine
//!
//! Observability is read-only: it never changes the outcome of an operation
//! and never spawns background work.
//!
//! # Usage
//!
//! ```ignore
//! use bitemporal::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::VersionAppended, &[("id", "emp-1"), ("version", "2")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_served();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
