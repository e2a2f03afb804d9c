//! CorrectedPair - The audit unit emitted by every applied correction

use super::{TemporalSnapshot, TemporalStructure};

/// An immutable `(original, corrected)` snapshot pair.
///
/// `original` is the latest revision before the correction; `corrected` is the
/// new revision that was stored. A correction that could not be applied
/// produces no pair at all.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrectedPair<S: TemporalStructure> {
    original: TemporalSnapshot<S>,
    corrected: TemporalSnapshot<S>,
}

impl<S: TemporalStructure> CorrectedPair<S> {
    pub fn new(original: TemporalSnapshot<S>, corrected: TemporalSnapshot<S>) -> Self {
        Self {
            original,
            corrected,
        }
    }

    #[inline]
    pub fn original(&self) -> &TemporalSnapshot<S> {
        &self.original
    }

    #[inline]
    pub fn corrected(&self) -> &TemporalSnapshot<S> {
        &self.corrected
    }

    /// True if the correction moved the record to another version number.
    pub fn is_renumbered(&self) -> bool {
        self.original.version() != self.corrected.version()
    }
}
