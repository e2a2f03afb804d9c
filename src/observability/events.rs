//! Observable events
//!
//! Events are explicit and typed; each maps to one stable log name.

use std::fmt;

use super::logger::Severity;

/// Observable events of the persistence engine and its stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Store lifecycle
    /// A store finished replaying its log
    StoreOpened,
    /// Replay found a damaged frame (FATAL)
    StoreCorruption,

    // Writes
    /// First version of an identifier stored
    SnapshotCreated,
    /// Next version of an identifier stored
    VersionAppended,
    /// Field correction recorded as a new revision
    StructCorrected,
    /// Field correction path absent on a version, nothing written
    CorrectionSkipped,
    /// Effective-on correction applied
    EffectiveOnCorrected,
    /// A version moved to a new version number during re-versioning
    VersionRenumbered,
    /// The store refused a batch
    CommitRejected,

    // Server
    /// CLI serving requests from stdin
    Serving,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreCorruption => "STORE_CORRUPTION",
            Event::SnapshotCreated => "SNAPSHOT_CREATED",
            Event::VersionAppended => "VERSION_APPENDED",
            Event::StructCorrected => "STRUCT_CORRECTED",
            Event::CorrectionSkipped => "CORRECTION_SKIPPED",
            Event::EffectiveOnCorrected => "EFFECTIVE_ON_CORRECTED",
            Event::VersionRenumbered => "VERSION_RENUMBERED",
            Event::CommitRejected => "COMMIT_REJECTED",
            Event::Serving => "BITEMPORAL_SERVING",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreCorruption => Severity::Fatal,
            Event::CommitRejected => Severity::Error,
            Event::CorrectionSkipped | Event::VersionRenumbered => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::StoreOpened,
            Event::StoreCorruption,
            Event::SnapshotCreated,
            Event::VersionAppended,
            Event::StructCorrected,
            Event::CorrectionSkipped,
            Event::EffectiveOnCorrected,
            Event::VersionRenumbered,
            Event::CommitRejected,
            Event::Serving,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::StoreCorruption.is_fatal());
        assert!(!Event::CommitRejected.is_fatal());
        assert_eq!(Event::CommitRejected.severity(), Severity::Error);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(Event::EffectiveOnCorrected.to_string(), "EFFECTIVE_ON_CORRECTED");
    }
}
